use thiserror::Error;

use crate::{
    record::RecordError,
    scorer::ScorerError,
    session::state::{FieldKey, StepTrigger, SurveyStep},
    store::StoreError,
};

/// Input problems the respondent can fix. Display strings are shown as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("나이는 1 이상의 정수로 입력해주세요.")]
    InvalidAge,
    #[error("성별을 선택해주세요.")]
    MissingGender,
    #[error("나의 이야기를 입력해주세요.")]
    EmptyOwnText,
    #[error("다른 사람의 이야기를 입력해주세요.")]
    EmptyOtherText,
    #[error("{min}자 이상 입력해주세요.")]
    TextTooShort { field: FieldKey, min: usize },
    #[error("신뢰도(1~5)를 선택해주세요.")]
    MissingTrustRating,
    #[error("문장을 입력해주세요!")]
    EmptyInput,
}

impl ValidationError {
    pub fn field(&self) -> FieldKey {
        match self {
            ValidationError::InvalidAge => FieldKey::Age,
            ValidationError::MissingGender => FieldKey::Gender,
            ValidationError::EmptyOwnText => FieldKey::OwnText,
            ValidationError::EmptyOtherText => FieldKey::OtherText,
            ValidationError::TextTooShort { field, .. } => *field,
            ValidationError::MissingTrustRating => FieldKey::TrustRating,
            ValidationError::EmptyInput => FieldKey::InputText,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("'{trigger:?}' is not allowed from step '{}'", .step.name())]
    InvalidTransition {
        step: SurveyStep,
        trigger: StepTrigger,
    },
    #[error("emotion scoring failed: {0}")]
    Scorer(#[from] ScorerError),
    #[error("saving the response failed: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Record(#[from] RecordError),
}

impl SessionError {
    pub fn is_validation(&self) -> bool {
        matches!(self, SessionError::Validation(_))
    }

    /// Message for the respondent. Infrastructure details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Validation(err) => err.to_string(),
            SessionError::InvalidTransition { .. } => {
                "지금 단계에서는 할 수 없는 동작입니다.".to_string()
            }
            SessionError::Scorer(_) => {
                "감정 분석에 실패했습니다. 잠시 후 다시 시도해주세요.".to_string()
            }
            SessionError::Store(_) | SessionError::Record(_) => {
                "응답 저장에 실패했습니다. 다시 제출해주세요.".to_string()
            }
        }
    }
}

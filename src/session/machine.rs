use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    record::{RecordLayout, build_survey_record},
    scorer::{DEFAULT_THRESHOLD, EmotionResult, EmotionScorer},
    session::{
        error::{SessionError, ValidationError},
        settings::{EmptyResultPolicy, SurveySettings},
        state::{FieldKey, StepTrigger, SurveyStep},
        types::{
            Demographics, Gender, ScoredTexts, SurveySnapshot, TrustRating, parse_age,
        },
    },
    store::{AppendReceipt, RemoteLogStore},
};

pub const NO_SIGNAL_MESSAGE: &str = "뚜렷한 감정이 감지되지 않았습니다.";
pub const SUBMITTED_MESSAGE: &str = "응답이 저장되었습니다. 참여해주셔서 감사합니다!";

/// Fixed per deployment; not part of the respondent's state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRules {
    pub threshold: f64,
    pub min_text_chars: usize,
    pub empty_result_policy: EmptyResultPolicy,
    pub layout: RecordLayout,
}

impl SessionRules {
    pub fn from_settings(settings: &SurveySettings, threshold: f64) -> Self {
        Self {
            threshold,
            min_text_chars: settings.min_text_chars,
            empty_result_policy: settings.empty_result_policy(),
            layout: settings.layout(),
        }
    }
}

impl Default for SessionRules {
    fn default() -> Self {
        Self::from_settings(&SurveySettings::default(), DEFAULT_THRESHOLD)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Validation,
    Info,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Read-only values the UI layer renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub step: &'static str,
    pub notice: Option<Notice>,
    pub own: Option<EmotionResult>,
    pub other: Option<EmotionResult>,
}

/// One respondent's walk through intro → survey → result → submitted.
///
/// The session is owned by whatever serves the respondent and is passed to
/// nothing global. Validated fields only change through the transition
/// methods below; a failed gate leaves them and the step untouched and makes
/// no external call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveySession {
    id: Uuid,
    step: SurveyStep,
    drafts: BTreeMap<FieldKey, String>,
    demographics: Option<Demographics>,
    scored: Option<ScoredTexts>,
    trust_rating: Option<TrustRating>,
    notice: Option<Notice>,
    #[serde(skip)]
    rules: SessionRules,
}

impl SurveySession {
    pub fn new(rules: SessionRules) -> Self {
        Self {
            id: Uuid::now_v7(),
            step: SurveyStep::Intro,
            drafts: BTreeMap::new(),
            demographics: None,
            scored: None,
            trust_rating: None,
            notice: None,
            rules,
        }
    }

    /// Rebinds a session restored from storage to this deployment's rules.
    pub fn with_rules(mut self, rules: SessionRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn step(&self) -> SurveyStep {
        self.step
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn draft(&self, key: FieldKey) -> Option<&str> {
        self.drafts.get(&key).map(String::as_str)
    }

    pub fn demographics(&self) -> Option<&Demographics> {
        self.demographics.as_ref()
    }

    pub fn scored(&self) -> Option<&ScoredTexts> {
        self.scored.as_ref()
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            step: self.step.name(),
            notice: self.notice.clone(),
            own: self.scored.as_ref().map(|scored| scored.own.clone()),
            other: self.scored.as_ref().map(|scored| scored.other.clone()),
        }
    }

    /// Stores raw input under its stable key. Writing the same value twice is
    /// a no-op. Input after a completed submission starts a fresh session.
    pub fn set_field(&mut self, key: FieldKey, value: impl Into<String>) {
        if self.step.is_terminal() {
            self.reset();
        }
        self.drafts.insert(key, value.into());
    }

    pub fn advance(&mut self) -> Result<SurveyStep, SessionError> {
        self.recover_missing_upstream();
        let next = self.next_step(StepTrigger::Advance)?;

        let age = self
            .draft(FieldKey::Age)
            .and_then(parse_age)
            .ok_or(ValidationError::InvalidAge);
        let gender = self
            .draft(FieldKey::Gender)
            .and_then(Gender::parse)
            .ok_or(ValidationError::MissingGender);
        let demographics = match (age, gender) {
            (Ok(age), Ok(gender)) => Demographics { age, gender },
            (Err(err), _) | (_, Err(err)) => return Err(self.reject(err)),
        };

        self.demographics = Some(demographics);
        self.enter(next);
        Ok(self.step)
    }

    /// Scores both answers and moves to `result`. Scoring or validation
    /// failures keep the session on `survey` with every field intact.
    pub async fn submit_texts(
        &mut self,
        scorer: &dyn EmotionScorer,
    ) -> Result<SurveyStep, SessionError> {
        self.recover_missing_upstream();
        let next = self.next_step(StepTrigger::Submit)?;

        let own_text = match self.validated_text(FieldKey::OwnText, ValidationError::EmptyOwnText) {
            Ok(text) => text,
            Err(err) => return Err(self.reject(err)),
        };
        let other_text =
            match self.validated_text(FieldKey::OtherText, ValidationError::EmptyOtherText) {
                Ok(text) => text,
                Err(err) => return Err(self.reject(err)),
            };

        let (own_raw, other_raw) =
            match tokio::try_join!(scorer.score(&own_text), scorer.score(&other_text)) {
                Ok(scores) => scores,
                Err(err) => {
                    tracing::warn!(
                        target: "session",
                        session_id = %self.id,
                        error = %err,
                        "scoring_failed"
                    );
                    let err = SessionError::from(err);
                    self.notice = Some(Notice::new(NoticeKind::Failure, err.user_message()));
                    return Err(err);
                }
            };

        let scored = ScoredTexts {
            own: EmotionResult::from_label_scores(own_raw, self.rules.threshold),
            own_text,
            other: EmotionResult::from_label_scores(other_raw, self.rules.threshold),
            other_text,
        };
        let missing_signal = scored.own.is_empty() || scored.other.is_empty();
        tracing::info!(
            target: "session",
            session_id = %self.id,
            own_labels = scored.own.len(),
            other_labels = scored.other.len(),
            "texts_scored"
        );

        if !scored.has_signal() && self.rules.empty_result_policy == EmptyResultPolicy::Block {
            self.notice = Some(Notice::new(NoticeKind::Info, NO_SIGNAL_MESSAGE));
            return Ok(self.step);
        }

        self.scored = Some(scored);
        self.enter(next);
        if missing_signal {
            self.notice = Some(Notice::new(NoticeKind::Info, NO_SIGNAL_MESSAGE));
        }
        Ok(self.step)
    }

    /// Builds the log row and appends it. Only a confirmed commit clears the
    /// session; on failure everything stays so the respondent can resubmit.
    pub async fn submit_rating(
        &mut self,
        store: &RemoteLogStore,
        at: OffsetDateTime,
    ) -> Result<AppendReceipt, SessionError> {
        self.recover_missing_upstream();
        let next = self.next_step(StepTrigger::Submit)?;

        let Some(trust_rating) = self.draft(FieldKey::TrustRating).and_then(TrustRating::parse)
        else {
            return Err(self.reject(ValidationError::MissingTrustRating));
        };
        let (Some(demographics), Some(scored)) = (&self.demographics, &self.scored) else {
            return Err(self.invalid(StepTrigger::Submit));
        };
        self.trust_rating = Some(trust_rating);

        let snapshot = SurveySnapshot {
            demographics: demographics.clone(),
            scored: scored.clone(),
            trust_rating,
        };
        let record = build_survey_record(&snapshot, &self.rules.layout, at)?;

        match store.append(&record).await {
            Ok(receipt) => {
                tracing::info!(
                    target: "session",
                    session_id = %self.id,
                    rows = receipt.row_count,
                    attempts = receipt.attempts,
                    "response_submitted"
                );
                self.step = next;
                self.clear_fields();
                self.notice = Some(Notice::new(NoticeKind::Info, SUBMITTED_MESSAGE));
                Ok(receipt)
            }
            Err(err) => {
                tracing::warn!(
                    target: "session",
                    session_id = %self.id,
                    error = %err,
                    kind = ?err.kind,
                    "response_submit_failed"
                );
                let err = SessionError::from(err);
                self.notice = Some(Notice::new(NoticeKind::Failure, err.user_message()));
                Err(err)
            }
        }
    }

    /// Steps back one page. Drafts and validated fields are kept.
    pub fn back(&mut self) -> Result<SurveyStep, SessionError> {
        self.recover_missing_upstream();
        let previous = self.next_step(StepTrigger::Back)?;
        self.enter(previous);
        Ok(self.step)
    }

    /// Leaves the terminal step for a fresh intro with a new session id.
    pub fn reset(&mut self) {
        tracing::debug!(target: "session", session_id = %self.id, step = self.step.name(), "session_reset");
        *self = Self::new(self.rules.clone());
    }

    fn next_step(&self, trigger: StepTrigger) -> Result<SurveyStep, SessionError> {
        match self.step.transition(trigger) {
            Some(next) => Ok(next),
            None => Err(self.invalid(trigger)),
        }
    }

    fn enter(&mut self, step: SurveyStep) {
        tracing::debug!(
            target: "session",
            session_id = %self.id,
            from = self.step.name(),
            to = step.name(),
            "step_changed"
        );
        self.step = step;
        self.notice = None;
    }

    fn reject(&mut self, err: ValidationError) -> SessionError {
        tracing::debug!(
            target: "session",
            session_id = %self.id,
            step = self.step.name(),
            field = err.field().id(),
            "validation_rejected"
        );
        self.notice = Some(Notice::new(NoticeKind::Validation, err.to_string()));
        SessionError::Validation(err)
    }

    fn invalid(&self, trigger: StepTrigger) -> SessionError {
        SessionError::InvalidTransition {
            step: self.step,
            trigger,
        }
    }

    fn validated_text(
        &self,
        key: FieldKey,
        missing: ValidationError,
    ) -> Result<String, ValidationError> {
        let text = self.draft(key).map(str::trim).unwrap_or_default();
        if text.is_empty() {
            return Err(missing);
        }
        if text.chars().count() < self.rules.min_text_chars {
            return Err(ValidationError::TextTooShort {
                field: key,
                min: self.rules.min_text_chars,
            });
        }
        Ok(text.to_string())
    }

    /// A step whose inputs are gone (for example a restored session) starts
    /// over at intro instead of failing.
    fn recover_missing_upstream(&mut self) {
        let intact = match self.step {
            SurveyStep::Intro | SurveyStep::Submitted => true,
            SurveyStep::Survey => self.demographics.is_some(),
            SurveyStep::Result => self.demographics.is_some() && self.scored.is_some(),
        };
        if !intact {
            tracing::debug!(
                target: "session",
                session_id = %self.id,
                step = self.step.name(),
                "session_recovered_to_intro"
            );
            self.step = SurveyStep::Intro;
            self.scored = None;
            self.notice = None;
        }
    }

    fn clear_fields(&mut self) {
        self.drafts.clear();
        self.demographics = None;
        self.scored = None;
        self.trust_rating = None;
    }
}

impl Default for SurveySession {
    fn default() -> Self {
        Self::new(SessionRules::default())
    }
}

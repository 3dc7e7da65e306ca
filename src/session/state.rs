use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyStep {
    Intro,
    Survey,
    Result,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepTrigger {
    Advance,
    Submit,
    Back,
    Reset,
}

impl SurveyStep {
    pub fn name(&self) -> &'static str {
        match self {
            SurveyStep::Intro => "intro",
            SurveyStep::Survey => "survey",
            SurveyStep::Result => "result",
            SurveyStep::Submitted => "submitted",
        }
    }

    /// The complete transition table. Anything not listed is rejected.
    pub fn transition(self, trigger: StepTrigger) -> Option<SurveyStep> {
        match (self, trigger) {
            (SurveyStep::Intro, StepTrigger::Advance) => Some(SurveyStep::Survey),
            (SurveyStep::Survey, StepTrigger::Submit) => Some(SurveyStep::Result),
            (SurveyStep::Survey, StepTrigger::Back) => Some(SurveyStep::Intro),
            (SurveyStep::Result, StepTrigger::Submit) => Some(SurveyStep::Submitted),
            (SurveyStep::Result, StepTrigger::Back) => Some(SurveyStep::Survey),
            (SurveyStep::Submitted, StepTrigger::Reset) => Some(SurveyStep::Intro),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SurveyStep::Submitted)
    }
}

/// Stable identifiers for respondent inputs. Drafts are keyed by these so a
/// re-render writes the same slot instead of adding a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    Age,
    Gender,
    OwnText,
    OtherText,
    TrustRating,
    InputText,
}

impl FieldKey {
    pub fn id(&self) -> &'static str {
        match self {
            FieldKey::Age => "age",
            FieldKey::Gender => "gender",
            FieldKey::OwnText => "own_text",
            FieldKey::OtherText => "other_text",
            FieldKey::TrustRating => "trust_rating",
            FieldKey::InputText => "input_text",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        [
            FieldKey::Age,
            FieldKey::Gender,
            FieldKey::OwnText,
            FieldKey::OtherText,
            FieldKey::TrustRating,
            FieldKey::InputText,
        ]
        .into_iter()
        .find(|key| key.id() == id)
    }
}

use serde::{Deserialize, Serialize};

use crate::record::RecordLayout;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    /// Demographics, two free-text answers, then a trust rating.
    Survey,
    /// One sentence analysed and logged on the spot.
    Quick,
}

/// What happens when no label clears the threshold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmptyResultPolicy {
    /// Tell the respondent and persist nothing.
    Block,
    /// Tell the respondent, let them continue, and store an empty emotions cell.
    Omit,
}

impl FlowKind {
    pub fn default_empty_result_policy(&self) -> EmptyResultPolicy {
        match self {
            FlowKind::Survey => EmptyResultPolicy::Omit,
            FlowKind::Quick => EmptyResultPolicy::Block,
        }
    }
}

fn default_flow() -> FlowKind {
    FlowKind::Survey
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveySettings {
    #[serde(default = "default_flow")]
    pub flow: FlowKind,
    #[serde(default)]
    pub min_text_chars: usize,
    #[serde(default)]
    pub empty_result_policy: Option<EmptyResultPolicy>,
    #[serde(default)]
    pub target_group: Option<String>,
    #[serde(default = "default_include_texts")]
    pub include_texts: bool,
}

fn default_include_texts() -> bool {
    true
}

impl SurveySettings {
    pub fn empty_result_policy(&self) -> EmptyResultPolicy {
        self.empty_result_policy
            .unwrap_or_else(|| self.flow.default_empty_result_policy())
    }

    pub fn layout(&self) -> RecordLayout {
        RecordLayout {
            target_group: self.target_group.clone(),
            include_texts: self.include_texts,
        }
    }
}

impl Default for SurveySettings {
    fn default() -> Self {
        Self {
            flow: default_flow(),
            min_text_chars: 0,
            empty_result_policy: None,
            target_group: None,
            include_texts: default_include_texts(),
        }
    }
}

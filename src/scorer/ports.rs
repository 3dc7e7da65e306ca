use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::scorer::error::ScorerError;

/// One raw classifier output: a label and its confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Multi-label emotion classifier.
///
/// Implementations return one entry per supported label in whatever order the
/// model produces. Filtering and ordering belong to [`crate::scorer::EmotionResult`].
#[async_trait]
pub trait EmotionScorer: Send + Sync {
    async fn score(&self, text: &str) -> Result<Vec<LabelScore>, ScorerError>;
}

use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;

use crate::scorer::{
    error::ScorerError,
    ports::{EmotionScorer, LabelScore},
};

/// Deterministic scorer returning canned label scores. Used by tests and by
/// dry runs without a classifier endpoint.
#[derive(Debug, Default)]
pub struct FixedScorer {
    default_scores: Vec<LabelScore>,
    by_text: HashMap<String, Vec<LabelScore>>,
    failure: Option<ScorerError>,
    calls: AtomicUsize,
}

impl FixedScorer {
    pub fn new(default_scores: Vec<LabelScore>) -> Self {
        Self {
            default_scores,
            ..Self::default()
        }
    }

    pub fn failing(failure: ScorerError) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>, scores: Vec<LabelScore>) -> Self {
        self.by_text.insert(text.into(), scores);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmotionScorer for FixedScorer {
    async fn score(&self, text: &str) -> Result<Vec<LabelScore>, ScorerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        Ok(self
            .by_text
            .get(text)
            .unwrap_or(&self.default_scores)
            .clone())
    }
}

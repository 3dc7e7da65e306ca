use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scorer::ports::LabelScore;

pub const DEFAULT_THRESHOLD: f64 = 0.3;

const RENDER_SEPARATOR: &str = ", ";
const SCORE_SCALE: f64 = 1_000.0;

static RENDERED_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(.+)\((\d+(?:\.\d+)?)\)$").expect("rendered item pattern must compile")
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionScore {
    pub label: String,
    pub confidence: f64,
}

impl EmotionScore {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }

    pub fn rounded(&self) -> f64 {
        round_score(self.confidence)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed emotion item '{item}': expected 'label(score)'")]
pub struct RenderedParseError {
    pub item: String,
}

/// Scorer output narrowed to the labels above a threshold, strongest first.
///
/// Confidences are kept unrounded so that selecting again with the same
/// threshold is a no-op. Rounding to three decimals only happens in
/// [`EmotionResult::render`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmotionResult {
    scores: Vec<EmotionScore>,
}

impl EmotionResult {
    pub fn from_label_scores(raw: Vec<LabelScore>, threshold: f64) -> Self {
        Self::select(
            raw.into_iter()
                .map(|item| EmotionScore::new(item.label, item.score))
                .collect(),
            threshold,
        )
    }

    /// Keeps scores strictly above `threshold` and sorts them descending by
    /// their rendered (three-decimal) value. Ties keep their incoming order.
    pub fn select(scores: Vec<EmotionScore>, threshold: f64) -> Self {
        let mut kept = scores
            .into_iter()
            .filter(|score| score.confidence > threshold)
            .collect::<Vec<_>>();
        kept.sort_by(|left, right| right.rounded().total_cmp(&left.rounded()));
        Self { scores: kept }
    }

    pub fn reselect(&self, threshold: f64) -> Self {
        Self::select(self.scores.clone(), threshold)
    }

    pub fn scores(&self) -> &[EmotionScore] {
        &self.scores
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn top(&self) -> Option<&EmotionScore> {
        self.scores.first()
    }

    /// Durable text form stored in the log: `label(score)` items joined by `", "`.
    pub fn render(&self) -> String {
        self.scores
            .iter()
            .map(|score| format!("{}({})", score.label, score.rounded()))
            .collect::<Vec<_>>()
            .join(RENDER_SEPARATOR)
    }

    pub fn parse_rendered(text: &str) -> Result<Vec<(String, f64)>, RenderedParseError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        text.split(RENDER_SEPARATOR)
            .map(|item| {
                let captures = RENDERED_ITEM
                    .captures(item)
                    .ok_or_else(|| RenderedParseError {
                        item: item.to_string(),
                    })?;
                let score = captures[2].parse::<f64>().map_err(|_| RenderedParseError {
                    item: item.to_string(),
                })?;
                Ok((captures[1].to_string(), score))
            })
            .collect()
    }
}

impl fmt::Display for EmotionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

pub fn round_score(value: f64) -> f64 {
    (value * SCORE_SCALE).round() / SCORE_SCALE
}

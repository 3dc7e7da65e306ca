use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{OffsetDateTime, macros::format_description};

use crate::{scorer::EmotionResult, session::types::SurveySnapshot};

pub mod columns {
    pub const TIMESTAMP: &str = "timestamp";
    pub const AGE: &str = "age";
    pub const GENDER: &str = "gender";
    pub const TARGET_GROUP: &str = "target_group";
    pub const OWN_TEXT: &str = "own_text";
    pub const OWN_EMOTIONS: &str = "own_emotions";
    pub const OTHER_TEXT: &str = "other_text";
    pub const OTHER_EMOTIONS: &str = "other_emotions";
    pub const TRUST_RATING: &str = "trust_rating";
    pub const INPUT_TEXT: &str = "input_text";
    pub const TOP_EMOTIONS: &str = "top_emotions";
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("failed to format record timestamp: {0}")]
    Timestamp(String),
}

/// One row of the shared log, as ordered `(column, value)` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    fields: Vec<(String, String)>,
}

impl ResponseRecord {
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        }
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(column, _)| column.as_str())
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }
}

/// Which optional columns a survey row carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordLayout {
    #[serde(default)]
    pub target_group: Option<String>,
    #[serde(default = "default_include_texts")]
    pub include_texts: bool,
}

fn default_include_texts() -> bool {
    true
}

impl Default for RecordLayout {
    fn default() -> Self {
        Self {
            target_group: None,
            include_texts: true,
        }
    }
}

pub fn format_timestamp(at: OffsetDateTime) -> Result<String, RecordError> {
    let format = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
    );
    at.format(format)
        .map_err(|err| RecordError::Timestamp(err.to_string()))
}

/// Local wall-clock time, falling back to UTC when the local offset is unknown.
pub fn now_local() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

pub fn build_survey_record(
    snapshot: &SurveySnapshot,
    layout: &RecordLayout,
    at: OffsetDateTime,
) -> Result<ResponseRecord, RecordError> {
    let mut fields = vec![
        (columns::TIMESTAMP, format_timestamp(at)?),
        (columns::AGE, snapshot.demographics.age.to_string()),
        (columns::GENDER, snapshot.demographics.gender.label().to_string()),
    ];
    if let Some(target_group) = &layout.target_group {
        fields.push((columns::TARGET_GROUP, target_group.clone()));
    }
    if layout.include_texts {
        fields.push((columns::OWN_TEXT, snapshot.scored.own_text.clone()));
    }
    fields.push((columns::OWN_EMOTIONS, snapshot.scored.own.render()));
    if layout.include_texts {
        fields.push((columns::OTHER_TEXT, snapshot.scored.other_text.clone()));
    }
    fields.push((columns::OTHER_EMOTIONS, snapshot.scored.other.render()));
    fields.push((columns::TRUST_RATING, snapshot.trust_rating.to_string()));

    Ok(ResponseRecord::from_fields(fields))
}

pub fn build_quick_record(
    text: &str,
    result: &EmotionResult,
    at: OffsetDateTime,
) -> Result<ResponseRecord, RecordError> {
    Ok(ResponseRecord::from_fields([
        (columns::TIMESTAMP, format_timestamp(at)?),
        (columns::INPUT_TEXT, text.to_string()),
        (columns::TOP_EMOTIONS, result.render()),
    ]))
}

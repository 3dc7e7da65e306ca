use std::fmt;

use serde::{Deserialize, Serialize};

use crate::scorer::EmotionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Female, Gender::Male];

    /// Accepts the Korean form labels as well as English and option numbers.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "여성" | "여" | "female" | "f" | "a" | "1" => Some(Gender::Female),
            "남성" | "남" | "male" | "m" | "b" | "2" => Some(Gender::Male),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Female => "여성",
            Gender::Male => "남성",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrustRating(u8);

impl TrustRating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX)
            .contains(&value)
            .then_some(Self(value))
    }

    pub fn parse(input: &str) -> Option<Self> {
        input.trim().parse::<u8>().ok().and_then(Self::new)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for TrustRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Positive integer made only of ASCII digits; signs and blanks are rejected.
pub fn parse_age(input: &str) -> Option<u32> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<u32>().ok().filter(|age| *age > 0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    pub age: u32,
    pub gender: Gender,
}

/// Both answers together with the classifier output they produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTexts {
    pub own_text: String,
    pub own: EmotionResult,
    pub other_text: String,
    pub other: EmotionResult,
}

impl ScoredTexts {
    pub fn has_signal(&self) -> bool {
        !self.own.is_empty() || !self.other.is_empty()
    }
}

/// Everything a completed survey contributes to its log row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveySnapshot {
    pub demographics: Demographics,
    pub scored: ScoredTexts,
    pub trust_rating: TrustRating,
}

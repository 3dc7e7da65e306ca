pub mod adapters;
pub mod error;
pub mod ports;
pub mod result;
pub mod types;

pub use error::{ScorerError, ScorerErrorKind};
pub use ports::{EmotionScorer, LabelScore};
pub use result::{DEFAULT_THRESHOLD, EmotionResult, EmotionScore};
pub use types::ScorerConfig;

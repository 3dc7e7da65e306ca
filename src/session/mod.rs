pub mod error;
pub mod machine;
pub mod quick;
pub mod settings;
pub mod state;
pub mod types;

pub use error::{SessionError, ValidationError};
pub use machine::{Notice, NoticeKind, SessionRules, SessionView, SurveySession};
pub use quick::{QuickAnalysis, QuickOutcome};
pub use settings::{EmptyResultPolicy, FlowKind, SurveySettings};
pub use state::{FieldKey, StepTrigger, SurveyStep};
pub use types::{Demographics, Gender, ScoredTexts, SurveySnapshot, TrustRating};

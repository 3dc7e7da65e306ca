pub mod fixed;
pub mod http_classifier;

pub use fixed::FixedScorer;
pub use http_classifier::HttpClassifierScorer;

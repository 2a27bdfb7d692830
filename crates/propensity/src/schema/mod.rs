//! Survey schema: reconstructed questions and column roles.

mod question;
mod types;

pub use question::{Question, long_names, reconstruct_questions, with_long_names};
pub use types::{Classification, PredictorBucket, TargetKind};

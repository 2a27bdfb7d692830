//! Response normalization and composite target scoring.

mod composite;
mod normalize;

pub use composite::{
    CompositeAccumulator, CompositeScorer, CompositeScores, RespondentComposite, SkipReason,
    SkippedRow, TargetConfig, TargetDefinition,
};
pub use normalize::{NEUTRAL, NormalizedScore, SCALE_MAX, SCALE_MIN, normalize, normalize_text};

//! Classification, correlation ranking and distribution analysis.

mod classifier;
mod correlation;
mod distribution;

pub use classifier::QuestionClassifier;
pub use correlation::{
    COMPOSITE_MIN_SAMPLE, CorrelationRanker, ExcludedPredictor, PredictorCorrelation, Ranking,
    SINGLE_TARGET_MIN_SAMPLE, ScanConfig, pearson, pearson_checked,
};
pub use distribution::{Distribution, DistributionAnalyzer, ScoreRange, Segment};

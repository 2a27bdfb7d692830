//! Propensity: survey response scoring and predictive correlation.
//!
//! Propensity takes a survey export with composite header rows, scores every
//! respondent on a weighted composite of a few target questions, and ranks
//! the remaining questions by how well they predict that score.
//!
//! # Pipeline
//!
//! - **Headers**: main headers are forward-filled over their sub-questions
//! - **Classification**: keyword rules pick targets and predictor buckets
//! - **Normalization**: numbers, Likert phrases and yes/no map onto 1-5
//! - **Composite scoring**: weights are renormalized over answered targets
//! - **Ranking**: predictors are sorted by |Pearson r| against the composite
//! - **Distribution**: respondents are counted per segment and score band
//!
//! # Example
//!
//! ```
//! use propensity::{Cell, Propensity, RawTable, ScanConfig, PropensityConfig};
//! use propensity::{TargetConfig, TargetDefinition};
//!
//! let table = RawTable::from_rows(vec![
//!     vec![Cell::from("Q - "), Cell::Empty, Cell::Empty],
//!     vec![Cell::from("Sustainability"), Cell::from("Price"), Cell::from("Behavior")],
//!     vec![Cell::from(5.0), Cell::from(2.0), Cell::from("yes")],
//!     vec![Cell::from(1.0), Cell::from(5.0), Cell::from("no")],
//!     vec![Cell::from(4.0), Cell::from(3.0), Cell::from("yes")],
//! ]);
//!
//! let targets = TargetConfig::new(vec![
//!     TargetDefinition::new(0, 0.5, "sustainability"),
//!     TargetDefinition::new(1, 0.5, "price").inverted(),
//! ]);
//! let config = PropensityConfig {
//!     scan: ScanConfig::default().with_min_sample_size(3),
//!     ..Default::default()
//! };
//!
//! let report = Propensity::with_config(config)
//!     .with_targets(targets)
//!     .analyze(&table)
//!     .unwrap();
//!
//! assert_eq!(report.respondent_count, 3);
//! assert_eq!(report.respondents[0].composite_score, 4.5);
//! assert_eq!(report.top_predictors[0].index, 2);
//! ```

pub mod categorize;
pub mod error;
pub mod inference;
pub mod input;
pub mod schema;
pub mod scoring;
pub mod storage;

mod propensity;

pub use categorize::{KeywordCategorizer, SemanticCategorizer, SurveyContext};
pub use crate::propensity::{AnalysisReport, AnalysisStatus, Propensity, PropensityConfig};
pub use error::{PropensityError, Result};
pub use inference::{
    CorrelationRanker, Distribution, ExcludedPredictor, PredictorCorrelation, Ranking, ScanConfig,
    ScoreRange, Segment, pearson,
};
pub use input::{Cell, Parser, RawTable, SourceMetadata, TableLayout};
pub use schema::{Classification, PredictorBucket, Question, TargetKind, reconstruct_questions};
pub use scoring::{NormalizedScore, RespondentComposite, TargetConfig, TargetDefinition, normalize};
pub use storage::{DirectoryStore, TableStore};

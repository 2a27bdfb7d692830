//! Semantic categorization of question text by an external service.
//!
//! The engine only consumes categorizers; it never requires one. The
//! [`KeywordCategorizer`] gives deterministic answers for tests and for
//! runs without network access.

mod keyword;
mod provider;

pub use keyword::KeywordCategorizer;
pub use provider::{
    Categorization, CategorizationResult, CategorizationStatistics, CategoryDefinition,
    ResponseText, SemanticCategorizer, SurveyContext,
};

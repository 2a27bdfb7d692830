//! Semantic categorizer trait and exchange types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A piece of text to categorize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseText {
    pub id: String,
    pub text: String,
}

impl ResponseText {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// A category the categorizer may assign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: String,
    pub description: String,
}

impl CategoryDefinition {
    pub fn new(
        name: impl Into<String>,
        category_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category_type: category_type.into(),
            description: description.into(),
        }
    }
}

/// One assignment of a response to a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Categorization {
    pub response_id: String,
    pub category_name: String,
    /// Confidence in the assignment (0.0-1.0).
    pub confidence: f64,
}

/// Summary numbers reported alongside categorizations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorizationStatistics {
    pub total_responses: usize,
    pub categorized: usize,
    pub average_confidence: f64,
}

/// Categorizer output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorizationResult {
    pub categorizations: Vec<Categorization>,
    pub statistics: CategorizationStatistics,
}

/// Survey-level context passed to categorizers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurveyContext {
    /// Name of the survey.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survey_name: Option<String>,

    /// Market or product domain (e.g., "baby care", "groceries").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Who answered the survey.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,

    /// Custom key-value hints.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub custom: IndexMap<String, String>,
}

impl SurveyContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_survey_name(mut self, name: impl Into<String>) -> Self {
        self.survey_name = Some(name.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Add a custom hint.
    pub fn with_custom(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }

    /// Check if any hints are provided.
    pub fn is_empty(&self) -> bool {
        self.survey_name.is_none()
            && self.domain.is_none()
            && self.audience.is_none()
            && self.custom.is_empty()
    }
}

/// External service that assigns category labels to text.
///
/// Implementations may be slow or fail; callers treat every error as
/// recoverable. They must be thread-safe (Send + Sync) so one instance can
/// be shared across analyses.
pub trait SemanticCategorizer: Send + Sync {
    /// Assign zero or one category to each response.
    ///
    /// # Arguments
    /// * `responses` - Texts to categorize, each with a caller-chosen id
    /// * `categories` - The allowed categories
    /// * `context` - Survey-level hints
    fn categorize(
        &self,
        responses: &[ResponseText],
        categories: &[CategoryDefinition],
        context: &SurveyContext,
    ) -> Result<CategorizationResult>;

    /// Name of this categorizer (for logging/debugging).
    fn name(&self) -> &str;
}

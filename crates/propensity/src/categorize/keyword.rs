//! Deterministic keyword categorizer for tests and offline runs.

use crate::error::Result;

use super::provider::{
    Categorization, CategorizationResult, CategorizationStatistics, CategoryDefinition,
    ResponseText, SemanticCategorizer, SurveyContext,
};

/// Assigns a category when the response mentions the category name or any
/// word of its description longer than four letters.
///
/// Name matches score `name_confidence`, description matches score
/// `description_confidence`.
pub struct KeywordCategorizer {
    name_confidence: f64,
    description_confidence: f64,
}

impl KeywordCategorizer {
    pub fn new() -> Self {
        Self {
            name_confidence: 0.9,
            description_confidence: 0.75,
        }
    }

    /// Create with custom confidences.
    pub fn with_confidences(name_confidence: f64, description_confidence: f64) -> Self {
        Self {
            name_confidence,
            description_confidence,
        }
    }

    fn best_match(&self, text: &str, categories: &[CategoryDefinition]) -> Option<(String, f64)> {
        let lower = text.to_lowercase();

        if let Some(category) = categories
            .iter()
            .find(|c| !c.name.is_empty() && lower.contains(&c.name.to_lowercase()))
        {
            return Some((category.name.clone(), self.name_confidence));
        }

        categories
            .iter()
            .find(|c| {
                c.description
                    .split(|ch: char| !ch.is_alphanumeric())
                    .filter(|word| word.len() > 4)
                    .any(|word| lower.contains(&word.to_lowercase()))
            })
            .map(|c| (c.name.clone(), self.description_confidence))
    }
}

impl Default for KeywordCategorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticCategorizer for KeywordCategorizer {
    fn categorize(
        &self,
        responses: &[ResponseText],
        categories: &[CategoryDefinition],
        _context: &SurveyContext,
    ) -> Result<CategorizationResult> {
        let categorizations: Vec<Categorization> = responses
            .iter()
            .filter_map(|response| {
                self.best_match(&response.text, categories)
                    .map(|(category_name, confidence)| Categorization {
                        response_id: response.id.clone(),
                        category_name,
                        confidence,
                    })
            })
            .collect();

        let average_confidence = if categorizations.is_empty() {
            0.0
        } else {
            categorizations.iter().map(|c| c.confidence).sum::<f64>() / categorizations.len() as f64
        };

        Ok(CategorizationResult {
            statistics: CategorizationStatistics {
                total_responses: responses.len(),
                categorized: categorizations.len(),
                average_confidence,
            },
            categorizations,
        })
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories() -> Vec<CategoryDefinition> {
        vec![
            CategoryDefinition::new("brand", "bucket", "Brand awareness"),
            CategoryDefinition::new("lifestyle", "bucket", "Hobbies, holidays, exercise"),
        ]
    }

    #[test]
    fn test_name_match() {
        let result = KeywordCategorizer::new()
            .categorize(
                &[ResponseText::new("q1", "Which brand do you trust?")],
                &categories(),
                &SurveyContext::new(),
            )
            .unwrap();

        assert_eq!(result.categorizations.len(), 1);
        assert_eq!(result.categorizations[0].category_name, "brand");
        assert_eq!(result.categorizations[0].confidence, 0.9);
    }

    #[test]
    fn test_description_match() {
        let result = KeywordCategorizer::new()
            .categorize(
                &[ResponseText::new("q2", "How many holidays per year?")],
                &categories(),
                &SurveyContext::new(),
            )
            .unwrap();

        assert_eq!(result.categorizations[0].category_name, "lifestyle");
        assert_eq!(result.categorizations[0].confidence, 0.75);
    }

    #[test]
    fn test_statistics() {
        let result = KeywordCategorizer::new()
            .categorize(
                &[
                    ResponseText::new("q1", "Brand recall"),
                    ResponseText::new("q2", "Shoe size"),
                ],
                &categories(),
                &SurveyContext::new(),
            )
            .unwrap();

        assert_eq!(result.statistics.total_responses, 2);
        assert_eq!(result.statistics.categorized, 1);
        assert_eq!(result.statistics.average_confidence, 0.9);
    }
}

//! Rule-based question classification.
//!
//! Rules are ordered tables of patterns over the reconstructed question
//! text. Target rules run first; a column that is not a target falls into
//! exactly one predictor bucket, the first whose pattern matches.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{PropensityError, Result};
use crate::schema::{Classification, PredictorBucket, Question, TargetKind};
use crate::scoring::TargetConfig;

// =============================================================================
// RULE TABLES
// =============================================================================

const SUSTAINABILITY_TERMS: &str =
    r"sustainab|environment|eco[- ]?friendly|\beco\b|green|organic|ethical|recycl|fair ?trade|carbon|plastic";

/// A target rule matches when every pattern matches.
struct TargetRule {
    kind: TargetKind,
    all_of: Vec<Regex>,
}

impl TargetRule {
    fn new(kind: TargetKind, patterns: &[&str]) -> Self {
        Self {
            kind,
            all_of: patterns.iter().map(|p| case_insensitive(p)).collect(),
        }
    }

    fn matches(&self, text: &str) -> bool {
        self.all_of.iter().all(|re| re.is_match(text))
    }
}

/// Compile a rule pattern, case-insensitively.
fn case_insensitive(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){}", pattern)).unwrap()
}

static TARGET_RULES: Lazy<Vec<TargetRule>> = Lazy::new(|| {
    vec![
        // Direct willingness to pay
        TargetRule::new(TargetKind::DirectWillingness, &["willing", "pay"]),
        TargetRule::new(TargetKind::DirectWillingness, &["pay", r"\b(more|extra|premium)\b|%"]),

        // Price sensitivity
        TargetRule::new(
            TargetKind::PriceSensitivity,
            &["price|cost|expensive|afford", "important|factor|consider|influence"],
        ),

        // Value for money
        TargetRule::new(TargetKind::ValueForMoney, &[r"\bvalue\b", "money|price|worth"]),

        // Purchase behavior
        TargetRule::new(
            TargetKind::PurchaseBehavior,
            &[r"\b(chosen|bought|purchased)\b", SUSTAINABILITY_TERMS],
        ),

        // Trade-offs
        TargetRule::new(
            TargetKind::TradeOff,
            &[
                r"\b(rather|instead|over|versus|vs|budget|spend|allocate)\b",
                &format!("{}|quality|premium", SUSTAINABILITY_TERMS),
            ],
        ),
    ]
});

static BUCKET_RULES: Lazy<Vec<(Regex, PredictorBucket)>> = Lazy::new(|| {
    [
        ("agree|statement|belief|believe|opinion", PredictorBucket::Values),
        ("important|importance|consideration|priorit", PredictorBucket::Importance),
        ("have you|do you|participated|how often|usually", PredictorBucket::Behavior),
        (
            r"\bage\b|gender|income|household|children|education|occupation|postcode|region",
            PredictorBucket::Demographics,
        ),
        ("brand", PredictorBucket::Brand),
        (
            r"environment|sustain|organic|\beco|green|recycl|ethical|carbon",
            PredictorBucket::Sustainability,
        ),
    ]
    .into_iter()
    .map(|(pattern, bucket)| (case_insensitive(pattern), bucket))
    .collect()
});

// =============================================================================
// CLASSIFIER
// =============================================================================

/// Classifies questions as targets or predictors from their text.
pub struct QuestionClassifier {
    /// Extra brand names recognized by the brand bucket.
    brand_pattern: Option<Regex>,
}

impl QuestionClassifier {
    /// Create a classifier with the built-in rules.
    pub fn new() -> Self {
        Self {
            brand_pattern: None,
        }
    }

    /// Recognize these brand names as brand questions.
    pub fn with_brand_names(mut self, names: &[String]) -> Result<Self> {
        let alternatives: Vec<String> = names
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .map(regex::escape)
            .collect();

        if alternatives.is_empty() {
            self.brand_pattern = None;
            return Ok(self);
        }

        let pattern = format!(r"(?i)\b({})\b", alternatives.join("|"));
        self.brand_pattern = Some(
            Regex::new(&pattern)
                .map_err(|e| PropensityError::Config(format!("invalid brand names: {}", e)))?,
        );
        Ok(self)
    }

    /// The target kind a question measures, if any.
    pub fn detect_target(&self, text: &str) -> Option<TargetKind> {
        TARGET_RULES
            .iter()
            .find(|rule| rule.matches(text))
            .map(|rule| rule.kind)
    }

    /// The predictor bucket of a question. Never fails: unmatched text is
    /// [`PredictorBucket::Other`].
    pub fn predictor_bucket(&self, text: &str) -> PredictorBucket {
        for (pattern, bucket) in BUCKET_RULES.iter() {
            if *bucket == PredictorBucket::Brand
                && let Some(brands) = &self.brand_pattern
                && brands.is_match(text)
            {
                return PredictorBucket::Brand;
            }
            if pattern.is_match(text) {
                return *bucket;
            }
        }
        PredictorBucket::Other
    }

    /// Classify one question. Blank questions stay unclassified.
    ///
    /// Detected targets get the kind's default weight and inversion.
    pub fn classify(&self, question: &Question) -> Option<Classification> {
        if question.is_blank() {
            return None;
        }

        if let Some(kind) = self.detect_target(&question.text) {
            return Some(Classification::Target {
                index: question.index,
                weight: kind.default_weight(),
                invert: kind.default_invert(),
                name: format!("{}_q{}", kind, question.index),
                kind,
            });
        }

        Some(self.classify_predictor(question))
    }

    fn classify_predictor(&self, question: &Question) -> Classification {
        Classification::Predictor {
            index: question.index,
            bucket: self.predictor_bucket(&question.text),
        }
    }

    /// Classify every question outside the excluded column range, detecting
    /// targets from the text.
    pub fn classify_all(
        &self,
        questions: &[Question],
        excluded: &Range<usize>,
    ) -> Vec<Classification> {
        questions
            .iter()
            .filter(|q| !excluded.contains(&q.index))
            .filter_map(|q| self.classify(q))
            .collect()
    }

    /// Classify predictors only, for a run whose targets are configured.
    ///
    /// Configured target columns and the excluded range are skipped.
    pub fn classify_predictors(
        &self,
        questions: &[Question],
        excluded: &Range<usize>,
        targets: &TargetConfig,
    ) -> Vec<Classification> {
        questions
            .iter()
            .filter(|q| !excluded.contains(&q.index))
            .filter(|q| !targets.contains_column(q.index))
            .filter(|q| !q.is_blank())
            .map(|q| self.classify_predictor(q))
            .collect()
    }
}

impl Default for QuestionClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::TargetDefinition;

    fn question(index: usize, text: &str) -> Question {
        Question {
            index,
            text: text.to_string(),
            main_header: String::new(),
            sub_header: String::new(),
            long_name: String::new(),
        }
    }

    #[test]
    fn test_detect_targets() {
        let c = QuestionClassifier::new();

        assert_eq!(
            c.detect_target("Would you be willing to pay for eco packaging?"),
            Some(TargetKind::DirectWillingness)
        );
        assert_eq!(
            c.detect_target("How much more would you pay (%)"),
            Some(TargetKind::DirectWillingness)
        );
        assert_eq!(
            c.detect_target("How important is price when choosing nappies"),
            Some(TargetKind::PriceSensitivity)
        );
        assert_eq!(
            c.detect_target("These products are good value for money"),
            Some(TargetKind::ValueForMoney)
        );
        assert_eq!(
            c.detect_target("In the last month I have bought organic baby food"),
            Some(TargetKind::PurchaseBehavior)
        );
        assert_eq!(
            c.detect_target("I would rather buy the sustainable option"),
            Some(TargetKind::TradeOff)
        );
        assert_eq!(c.detect_target("What is your age?"), None);
    }

    #[test]
    fn test_trade_off_requires_whole_word() {
        let c = QuestionClassifier::new();
        // "overall" must not trigger the "over" trade-off keyword
        assert_eq!(c.detect_target("Overall rating of green products"), None);
    }

    #[test]
    fn test_bucket_order() {
        let c = QuestionClassifier::new();

        // Values wins over importance when both match
        assert_eq!(
            c.predictor_bucket("Do you agree that quality is important"),
            PredictorBucket::Values
        );
        assert_eq!(
            c.predictor_bucket("Key considerations - Packaging"),
            PredictorBucket::Importance
        );
        assert_eq!(
            c.predictor_bucket("Have you ever joined a clean-up?"),
            PredictorBucket::Behavior
        );
        assert_eq!(c.predictor_bucket("Age"), PredictorBucket::Demographics);
        assert_eq!(c.predictor_bucket("Household income"), PredictorBucket::Demographics);
        assert_eq!(c.predictor_bucket("Favourite brand"), PredictorBucket::Brand);
        assert_eq!(
            c.predictor_bucket("Concern for the environment"),
            PredictorBucket::Sustainability
        );
        assert_eq!(c.predictor_bucket("Favourite colour"), PredictorBucket::Other);
    }

    #[test]
    fn test_age_is_a_whole_word() {
        let c = QuestionClassifier::new();
        assert_eq!(c.predictor_bucket("Average basket size"), PredictorBucket::Other);
    }

    #[test]
    fn test_known_brand_names() {
        let c = QuestionClassifier::new()
            .with_brand_names(&["Huggies".to_string(), "Pampers".to_string()])
            .unwrap();
        assert_eq!(c.predictor_bucket("Used Pampers last year"), PredictorBucket::Brand);
        assert_eq!(c.predictor_bucket("Used cloth last year"), PredictorBucket::Other);
    }

    #[test]
    fn test_classify_blank_is_unclassified() {
        let c = QuestionClassifier::new();
        assert_eq!(c.classify(&question(3, "")), None);
    }

    #[test]
    fn test_classify_target_defaults() {
        let c = QuestionClassifier::new();
        let result = c.classify(&question(7, "How important is price to you")).unwrap();

        assert_eq!(
            result,
            Classification::Target {
                index: 7,
                weight: TargetKind::PriceSensitivity.default_weight(),
                invert: true,
                name: "price_sensitivity_q7".to_string(),
                kind: TargetKind::PriceSensitivity,
            }
        );
    }

    #[test]
    fn test_excluded_range_ignores_header_text() {
        let c = QuestionClassifier::new();
        let questions = vec![
            question(0, "Respondent age"),
            question(1, "Willing to pay more?"),
            question(2, "Age"),
        ];
        let result = c.classify_all(&questions, &(0..2));

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].index(), 2);
    }

    #[test]
    fn test_classify_predictors_skips_configured_targets() {
        let c = QuestionClassifier::new();
        let questions = vec![
            question(0, "ID"),
            question(1, "Willing to pay more?"),
            question(2, "Age"),
            question(3, ""),
            question(4, "How important is price"),
        ];
        let targets = TargetConfig::new(vec![TargetDefinition::new(1, 1.0, "wtp")]);
        let result = c.classify_predictors(&questions, &(0..1), &targets);

        let indices: Vec<usize> = result.iter().map(Classification::index).collect();
        assert_eq!(indices, vec![2, 4]);
        assert!(result.iter().all(|r| !r.is_target()));
        assert_eq!(result[1].bucket(), Some(PredictorBucket::Importance));
    }
}

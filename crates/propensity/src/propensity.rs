//! Main Propensity struct and public API.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::categorize::{CategoryDefinition, ResponseText, SemanticCategorizer, SurveyContext};
use crate::error::{PropensityError, Result};
use crate::inference::{
    CorrelationRanker, Distribution, DistributionAnalyzer, ExcludedPredictor, PredictorCorrelation,
    QuestionClassifier, Ranking, ScanConfig,
};
use crate::input::{Cell, Parser, RawTable, SourceMetadata, TableLayout};
use crate::schema::{
    Classification, PredictorBucket, Question, reconstruct_questions, with_long_names,
};
use crate::scoring::{
    CompositeScorer, RespondentComposite, SkippedRow, TargetConfig, TargetDefinition,
};

/// Configuration for a Propensity analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PropensityConfig {
    /// Header and respondent row positions.
    pub layout: TableLayout,
    /// Target questions. Empty means targets are detected from the headers.
    pub targets: TargetConfig,
    /// Predictor scan thresholds.
    pub scan: ScanConfig,
    /// Column whose top answer marks a respondent as a proven payer.
    pub proven_behavior_column: Option<usize>,
    /// Brand names the classifier should recognize.
    pub brand_names: Vec<String>,
    /// Categorizer answers below this confidence are ignored.
    pub categorizer_min_confidence: f64,
    /// Hints passed to the categorizer.
    pub context: SurveyContext,
}

impl Default for PropensityConfig {
    fn default() -> Self {
        Self {
            layout: TableLayout::default(),
            targets: TargetConfig::default(),
            scan: ScanConfig::default(),
            proven_behavior_column: None,
            brand_names: Vec::new(),
            categorizer_min_confidence: 0.7,
            context: SurveyContext::default(),
        }
    }
}

impl PropensityConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| PropensityError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Check the parts of the configuration that do not depend on a table.
    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;
        self.targets.validate()?;
        if !(0.0..=1.0).contains(&self.categorizer_min_confidence) {
            return Err(PropensityError::Config(format!(
                "categorizer_min_confidence must be within [0, 1], got {}",
                self.categorizer_min_confidence
            )));
        }
        Ok(())
    }
}

/// Whether the analysis had data to work with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Complete,
    /// No respondent answered any target question.
    InsufficientData,
}

/// Result of analyzing a survey table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub status: AnalysisStatus,
    /// Target name to configured weight.
    pub target_weights: IndexMap<String, f64>,
    /// Targets the composite was built from, detected or configured.
    pub targets: TargetConfig,
    /// Predictors by |r| descending, column index ascending on ties.
    pub top_predictors: Vec<PredictorCorrelation>,
    /// Predictors with too few answers to rank.
    pub excluded_predictors: Vec<ExcludedPredictor>,
    /// Ranked predictors cut by `scan.max_predictors`.
    #[serde(default)]
    pub truncated_predictors: usize,
    pub distribution: Distribution,
    /// Number of respondents with a composite score.
    pub respondent_count: usize,
    /// Valid respondents in row order.
    pub respondents: Vec<RespondentComposite>,
    /// Respondent rows left out, in row order.
    pub skipped_rows: Vec<SkippedRow>,
    /// Set when the table was loaded from a file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceMetadata>,
}

impl AnalysisReport {
    /// An empty report for a table without usable respondents.
    pub fn insufficient(targets: TargetConfig) -> Self {
        Self {
            status: AnalysisStatus::InsufficientData,
            target_weights: targets.weights(),
            targets,
            top_predictors: Vec::new(),
            excluded_predictors: Vec::new(),
            truncated_predictors: 0,
            distribution: DistributionAnalyzer::new(None).analyze(&RawTable::default(), &[]),
            respondent_count: 0,
            respondents: Vec::new(),
            skipped_rows: Vec::new(),
            source: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == AnalysisStatus::Complete
    }

    /// Ranked predictors grouped by bucket, buckets in rule order. Buckets
    /// without ranked predictors are left out.
    pub fn predictors_by_bucket(&self) -> IndexMap<PredictorBucket, Vec<&PredictorCorrelation>> {
        let mut grouped = IndexMap::new();
        for bucket in PredictorBucket::ALL {
            let members: Vec<&PredictorCorrelation> = self
                .top_predictors
                .iter()
                .filter(|p| p.bucket == bucket)
                .collect();
            if !members.is_empty() {
                grouped.insert(bucket, members);
            }
        }
        grouped
    }

    /// The `n` strongest predictors of one bucket.
    pub fn top_in_bucket(&self, bucket: PredictorBucket, n: usize) -> Vec<&PredictorCorrelation> {
        self.top_predictors
            .iter()
            .filter(|p| p.bucket == bucket)
            .take(n)
            .collect()
    }
}

/// The main Propensity analysis engine.
pub struct Propensity {
    config: PropensityConfig,
    parser: Parser,
    categorizer: Option<Arc<dyn SemanticCategorizer>>,
}

impl Propensity {
    /// Create an engine with default configuration.
    pub fn new() -> Self {
        Self::with_config(PropensityConfig::default())
    }

    /// Create an engine with custom configuration.
    pub fn with_config(config: PropensityConfig) -> Self {
        Self {
            config,
            parser: Parser::new(),
            categorizer: None,
        }
    }

    /// Score respondents against these targets instead of detected ones.
    pub fn with_targets(mut self, targets: TargetConfig) -> Self {
        self.config.targets = targets;
        self
    }

    /// Use a custom parser for [`Propensity::analyze_file`].
    pub fn with_parser(mut self, parser: Parser) -> Self {
        self.parser = parser;
        self
    }

    /// Add a semantic categorizer.
    ///
    /// Predictors the keyword rules leave in the `other` bucket are offered
    /// to the categorizer, and confident answers move them to a named
    /// bucket. Categorizer failures leave the keyword buckets in place.
    pub fn with_categorizer(mut self, categorizer: impl SemanticCategorizer + 'static) -> Self {
        self.categorizer = Some(Arc::new(categorizer));
        self
    }

    pub fn config(&self) -> &PropensityConfig {
        &self.config
    }

    /// Load a delimited file and analyze it.
    pub fn analyze_file(&self, path: impl AsRef<Path>) -> Result<AnalysisReport> {
        let (table, source) = self.parser.parse_file(path)?;
        let mut report = self.analyze(&table)?;
        report.source = Some(source);
        Ok(report)
    }

    /// Analyze a survey table.
    ///
    /// Fails only on invalid configuration or a table without its header
    /// rows. Everything else, including a table with no usable
    /// respondents, is described by the report.
    pub fn analyze(&self, table: &RawTable) -> Result<AnalysisReport> {
        self.config.validate()?;
        self.config.layout.check_shape(table)?;

        let layout = self.config.layout.resolve(table);
        let questions = table_questions(table, &layout);
        let classifier = QuestionClassifier::new().with_brand_names(&self.config.brand_names)?;
        let excluded = &self.config.scan.excluded_columns;

        let (targets, mut predictors) = if self.config.targets.is_empty() {
            let classifications = classifier.classify_all(&questions, excluded);
            let targets = TargetConfig::from_classifications(&classifications);
            let predictors: Vec<Classification> =
                classifications.into_iter().filter(|c| !c.is_target()).collect();
            (targets, predictors)
        } else {
            let predictors =
                classifier.classify_predictors(&questions, excluded, &self.config.targets);
            (self.config.targets.clone(), predictors)
        };

        tracing::debug!(
            questions = questions.len(),
            targets = targets.len(),
            predictors = predictors.len(),
            detected = self.config.targets.is_empty(),
            "Classified questions"
        );

        if targets.is_empty() {
            tracing::warn!("No target questions configured or detected");
        }

        if let Some(ref categorizer) = self.categorizer {
            self.refine_buckets(&mut predictors, &questions, categorizer.as_ref());
        }

        let scores = CompositeScorer::new(&targets, &layout).score_table(table);

        if scores.respondents.is_empty() {
            tracing::warn!(
                skipped = scores.skipped.len(),
                "No respondent answered a target question"
            );
            let mut report = AnalysisReport::insufficient(targets);
            report.skipped_rows = scores.skipped;
            return Ok(report);
        }

        let ranking = CorrelationRanker::new(&self.config.scan).rank(
            table,
            &questions,
            &predictors,
            &scores.outcomes(),
        );

        let distribution = DistributionAnalyzer::new(self.config.proven_behavior_column)
            .analyze(table, &scores.respondents);

        tracing::info!(
            respondents = scores.respondents.len(),
            skipped = scores.skipped.len(),
            ranked = ranking.ranked.len(),
            excluded = ranking.excluded.len(),
            average_score = ?distribution.average_score,
            "Analysis complete"
        );

        Ok(AnalysisReport {
            status: AnalysisStatus::Complete,
            target_weights: targets.weights(),
            targets,
            top_predictors: ranking.ranked,
            excluded_predictors: ranking.excluded,
            truncated_predictors: ranking.truncated,
            distribution,
            respondent_count: scores.respondents.len(),
            respondents: scores.respondents,
            skipped_rows: scores.skipped,
            source: None,
        })
    }

    /// Rank predictors against a single target column instead of the
    /// composite.
    ///
    /// The target column's normalized answer is the outcome; respondents
    /// who left it blank are not paired. Configured composite targets are
    /// ranked like any other predictor.
    pub fn scan_against_column(&self, table: &RawTable, column: usize) -> Result<Ranking> {
        self.config.layout.validate()?;
        self.config.layout.check_shape(table)?;

        if column >= table.column_count() {
            return Err(PropensityError::Config(format!(
                "target column {} is outside the table ({} columns)",
                column,
                table.column_count()
            )));
        }

        let layout = self.config.layout.resolve(table);
        let questions = table_questions(table, &layout);
        let classifier = QuestionClassifier::new().with_brand_names(&self.config.brand_names)?;
        let target = TargetConfig::new(vec![TargetDefinition::new(column, 1.0, "target")]);

        let predictors =
            classifier.classify_predictors(&questions, &self.config.scan.excluded_columns, &target);
        let outcomes = CompositeScorer::new(&target, &layout)
            .score_table(table)
            .outcomes();

        tracing::debug!(column, respondents = outcomes.len(), "Scanning against single column");

        let ranker = CorrelationRanker::new(&self.config.scan);
        Ok(ranker.rank(table, &questions, &predictors, &outcomes))
    }

    /// Ask the categorizer about predictors left in the `other` bucket.
    fn refine_buckets(
        &self,
        predictors: &mut [Classification],
        questions: &[Question],
        categorizer: &dyn SemanticCategorizer,
    ) {
        let pending: Vec<ResponseText> = predictors
            .iter()
            .filter(|c| c.bucket() == Some(PredictorBucket::Other))
            .filter_map(|c| questions.get(c.index()))
            .map(|q| ResponseText::new(q.index.to_string(), q.text.clone()))
            .collect();

        if pending.is_empty() {
            return;
        }

        let categories: Vec<CategoryDefinition> = PredictorBucket::ALL
            .iter()
            .filter(|b| **b != PredictorBucket::Other)
            .map(|b| CategoryDefinition::new(b.as_str(), "predictor_bucket", b.description()))
            .collect();

        let result = match categorizer.categorize(&pending, &categories, &self.config.context) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(
                    categorizer = categorizer.name(),
                    error = %e,
                    "Categorizer failed; keeping keyword buckets"
                );
                return;
            }
        };

        let mut moved = 0;
        for categorization in &result.categorizations {
            if categorization.confidence < self.config.categorizer_min_confidence {
                continue;
            }
            let Some(bucket) = PredictorBucket::from_name(&categorization.category_name)
                .filter(|b| *b != PredictorBucket::Other)
            else {
                continue;
            };
            let Ok(index) = categorization.response_id.parse::<usize>() else {
                continue;
            };

            for predictor in predictors.iter_mut() {
                if let Classification::Predictor {
                    index: i,
                    bucket: current,
                } = predictor
                    && *i == index
                    && *current == PredictorBucket::Other
                {
                    *current = bucket;
                    moved += 1;
                }
            }
        }

        tracing::debug!(
            categorizer = categorizer.name(),
            with_context = !self.config.context.is_empty(),
            offered = pending.len(),
            moved,
            "Refined predictor buckets"
        );
    }
}

impl Default for Propensity {
    fn default() -> Self {
        Self::new()
    }
}

/// Reconstructed questions, with long names built from every row above the
/// respondent block.
fn table_questions(table: &RawTable, layout: &TableLayout) -> Vec<Question> {
    let (main_row, sub_row) = layout.header_rows(table);

    let header_end = layout.first_respondent_row.min(table.row_count());
    let header_rows: Vec<&[Cell]> = table.rows()[..header_end]
        .iter()
        .map(Vec::as_slice)
        .collect();

    with_long_names(reconstruct_questions(main_row, sub_row), &header_rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorize::{Categorization, CategorizationResult, KeywordCategorizer};

    fn scenario() -> RawTable {
        RawTable::from_rows(vec![
            vec![Cell::from("Q - "), Cell::Empty, Cell::Empty],
            vec![
                Cell::from("Sustainability"),
                Cell::from("Price"),
                Cell::from("Behavior"),
            ],
            vec![Cell::from(5.0), Cell::from(2.0), Cell::from("yes")],
            vec![Cell::from(1.0), Cell::from(5.0), Cell::from("no")],
            vec![Cell::from(4.0), Cell::from(3.0), Cell::from("yes")],
        ])
    }

    fn scenario_targets() -> TargetConfig {
        TargetConfig::new(vec![
            TargetDefinition::new(0, 0.5, "sustainability"),
            TargetDefinition::new(1, 0.5, "price").inverted(),
        ])
    }

    fn engine() -> Propensity {
        Propensity::with_config(PropensityConfig {
            scan: ScanConfig::default().with_min_sample_size(2),
            ..Default::default()
        })
        .with_targets(scenario_targets())
    }

    #[test]
    fn test_scenario_composites() {
        let report = engine().analyze(&scenario()).unwrap();

        assert!(report.is_complete());
        let scores: Vec<f64> = report.respondents.iter().map(|r| r.composite_score).collect();
        assert_eq!(scores, vec![4.5, 1.0, 3.5]);
        assert_eq!(report.respondent_count, 3);
        assert_eq!(report.target_weights["price"], 0.5);
    }

    #[test]
    fn test_scenario_ranks_behavior_only() {
        let report = engine().analyze(&scenario()).unwrap();

        assert_eq!(report.top_predictors.len(), 1);
        let behavior = &report.top_predictors[0];
        assert_eq!(behavior.index, 2);
        assert_eq!(behavior.sample_size, 3);
        assert!(behavior.correlation > 0.9);
    }

    #[test]
    fn test_no_respondents_is_insufficient_data() {
        let table = RawTable::from_rows(vec![vec![Cell::from("Q")], vec![Cell::from("a")]]);
        let report = engine().analyze(&table).unwrap();

        assert_eq!(report.status, AnalysisStatus::InsufficientData);
        assert!(report.top_predictors.is_empty());
        assert_eq!(report.distribution.average_score, None);
    }

    #[test]
    fn test_missing_header_rows_is_shape_error() {
        let table = RawTable::from_rows(vec![vec![Cell::from("Q")]]);
        assert!(matches!(
            engine().analyze(&table),
            Err(PropensityError::InputShape(_))
        ));
    }

    #[test]
    fn test_invalid_weights_rejected_before_scoring() {
        let engine = Propensity::new()
            .with_targets(TargetConfig::new(vec![TargetDefinition::new(0, -1.0, "a")]));
        assert!(matches!(
            engine.analyze(&scenario()),
            Err(PropensityError::Config(_))
        ));
    }

    #[test]
    fn test_scan_against_column() {
        let config = PropensityConfig {
            scan: ScanConfig::default().with_min_sample_size(2),
            ..Default::default()
        };
        let ranking = Propensity::with_config(config)
            .scan_against_column(&scenario(), 0)
            .unwrap();

        let indices: Vec<usize> = ranking.ranked.iter().map(|p| p.index).collect();
        assert!(!indices.contains(&0));
        assert_eq!(ranking.ranked.len(), 2);
        // Column 1 moves opposite to column 0
        let price = ranking.ranked.iter().find(|p| p.index == 1).unwrap();
        assert!(price.correlation < 0.0);
    }

    #[test]
    fn test_scan_against_missing_column() {
        assert!(Propensity::new().scan_against_column(&scenario(), 9).is_err());
    }

    fn colour_table() -> RawTable {
        let mut rows = vec![
            vec![Cell::from("Willing to pay more?"), Cell::from("Favourite colour")],
            vec![Cell::Empty, Cell::Empty],
        ];
        for (a, b) in [(5.0, 4.0), (1.0, 2.0), (3.0, 3.0)] {
            rows.push(vec![Cell::from(a), Cell::from(b)]);
        }
        RawTable::from_rows(rows)
    }

    #[test]
    fn test_auto_detected_targets() {
        let config = PropensityConfig {
            scan: ScanConfig::default().with_min_sample_size(2),
            ..Default::default()
        };
        let report = Propensity::with_config(config).analyze(&colour_table()).unwrap();

        assert_eq!(report.targets.len(), 1);
        assert!(report.target_weights.contains_key("direct_willingness_q0"));
        assert_eq!(report.top_predictors[0].bucket, PredictorBucket::Other);
    }

    struct AlwaysBrand;

    impl SemanticCategorizer for AlwaysBrand {
        fn categorize(
            &self,
            responses: &[ResponseText],
            _categories: &[CategoryDefinition],
            _context: &SurveyContext,
        ) -> Result<CategorizationResult> {
            let categorizations = responses
                .iter()
                .map(|r| Categorization {
                    response_id: r.id.clone(),
                    category_name: "brand".to_string(),
                    confidence: 0.8,
                })
                .collect();
            Ok(CategorizationResult {
                categorizations,
                ..Default::default()
            })
        }

        fn name(&self) -> &str {
            "always-brand"
        }
    }

    fn small_sample_config() -> PropensityConfig {
        PropensityConfig {
            scan: ScanConfig::default().with_min_sample_size(2),
            ..Default::default()
        }
    }

    #[test]
    fn test_categorizer_rebuckets_other() {
        let report = Propensity::with_config(small_sample_config())
            .with_categorizer(AlwaysBrand)
            .analyze(&colour_table())
            .unwrap();

        assert_eq!(report.top_predictors[0].bucket, PredictorBucket::Brand);
    }

    fn preference_table() -> RawTable {
        let mut table = colour_table().rows().to_vec();
        table[0][1] = Cell::from("Favourite colour preference");
        RawTable::new(table)
    }

    #[test]
    fn test_keyword_categorizer_refines_buckets() {
        let report = Propensity::with_config(small_sample_config())
            .with_categorizer(KeywordCategorizer::new())
            .analyze(&preference_table())
            .unwrap();

        // "preference" appears in the brand bucket description
        assert_eq!(report.top_predictors[0].bucket, PredictorBucket::Brand);
    }

    #[test]
    fn test_low_confidence_categorization_ignored() {
        let config = PropensityConfig {
            categorizer_min_confidence: 0.95,
            ..small_sample_config()
        };
        let report = Propensity::with_config(config)
            .with_categorizer(KeywordCategorizer::new())
            .analyze(&preference_table())
            .unwrap();

        assert_eq!(report.top_predictors[0].bucket, PredictorBucket::Other);
    }

    #[test]
    fn test_failing_categorizer_is_ignored() {
        struct Broken;
        impl SemanticCategorizer for Broken {
            fn categorize(
                &self,
                _responses: &[ResponseText],
                _categories: &[CategoryDefinition],
                _context: &SurveyContext,
            ) -> Result<CategorizationResult> {
                Err(PropensityError::Categorizer("service unavailable".to_string()))
            }

            fn name(&self) -> &str {
                "broken"
            }
        }

        let report = Propensity::with_config(small_sample_config())
            .with_categorizer(Broken)
            .analyze(&colour_table())
            .unwrap();
        assert_eq!(report.top_predictors[0].bucket, PredictorBucket::Other);
    }

    #[test]
    fn test_predictors_by_bucket() {
        let report = engine().analyze(&scenario()).unwrap();
        let grouped = report.predictors_by_bucket();

        let total: usize = grouped.values().map(Vec::len).sum();
        assert_eq!(total, report.top_predictors.len());
        for (bucket, members) in &grouped {
            assert!(members.iter().all(|p| p.bucket == *bucket));
        }
        assert!(report.top_in_bucket(PredictorBucket::Demographics, 5).is_empty());
    }

    /// Three header levels: group, question, statement.
    fn three_level_table() -> RawTable {
        RawTable::from_rows(vec![
            vec![Cell::from("Purchase"), Cell::from("Attitudes"), Cell::Empty],
            vec![
                Cell::from("Willing to pay more"),
                Cell::from("Statement"),
                Cell::from("Statement"),
            ],
            vec![
                Cell::Empty,
                Cell::from("Packaging matters"),
                Cell::from("Colour matters"),
            ],
            vec![Cell::from(5.0), Cell::from("Agree"), Cell::from(4.0)],
            vec![Cell::from(1.0), Cell::from("Disagree"), Cell::from(2.0)],
            vec![Cell::from(3.0), Cell::from("Neutral"), Cell::from(5.0)],
        ])
    }

    fn three_level_engine(scan: ScanConfig) -> Propensity {
        Propensity::with_config(PropensityConfig {
            layout: TableLayout {
                first_respondent_row: 3,
                ..Default::default()
            },
            scan,
            ..Default::default()
        })
        .with_targets(TargetConfig::new(vec![TargetDefinition::new(0, 1.0, "wtp")]))
    }

    #[test]
    fn test_long_names_reach_report() {
        let scan = ScanConfig::default().with_min_sample_size(2);
        let report = three_level_engine(scan).analyze(&three_level_table()).unwrap();

        let names: Vec<&str> = report
            .top_predictors
            .iter()
            .map(|p| p.long_name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "Attitudes | Statement | Packaging matters",
                "Attitudes | Statement | Colour matters",
            ]
        );
        // Two header rows alone cannot tell these apart
        assert_eq!(report.top_predictors[0].question, "Attitudes - Statement");
        assert_eq!(report.top_predictors[1].question, "Attitudes - Statement");

        let json = serde_json::to_string(&report).unwrap();
        let restored: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert_eq!(
            restored.top_predictors[1].long_name,
            "Attitudes | Statement | Colour matters"
        );
    }

    #[test]
    fn test_truncated_predictors_counted() {
        let scan = ScanConfig::default()
            .with_min_sample_size(2)
            .with_max_predictors(1);
        let report = three_level_engine(scan).analyze(&three_level_table()).unwrap();

        assert_eq!(report.top_predictors.len(), 1);
        assert_eq!(report.top_predictors[0].index, 1);
        assert_eq!(report.truncated_predictors, 1);
        assert!(report.excluded_predictors.is_empty());
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "targets": [{"column_index": 3, "weight": 0.4, "name": "wtp"}],
            "scan": {"min_sample_size": 50},
            "proven_behavior_column": 7
        }"#;
        let config: PropensityConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.targets.len(), 1);
        assert!(!config.targets.targets()[0].invert);
        assert_eq!(config.scan.min_sample_size, 50);
        assert_eq!(config.layout.first_respondent_row, 2);
        assert!(!config.layout.detect_respondent_rows);
        assert_eq!(config.categorizer_min_confidence, 0.7);
        assert!(config.validate().is_ok());
    }
}

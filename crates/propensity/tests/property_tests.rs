//! Property-based tests for Propensity.
//!
//! These tests use proptest to generate random inputs and verify that the
//! scoring pipeline keeps its invariants under all conditions.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p propensity --test property_tests
//!
//! # More cases (slower but more thorough)
//! PROPTEST_CASES=10000 cargo test -p propensity --test property_tests
//! ```

use proptest::prelude::*;

use propensity::scoring::{CompositeAccumulator, SCALE_MAX, SCALE_MIN, normalize_text};
use propensity::{
    Cell, NormalizedScore, Propensity, PropensityConfig, RawTable, ScanConfig, ScoreRange,
    TargetConfig, TargetDefinition, normalize, pearson,
};

// =============================================================================
// Test Strategies
// =============================================================================

/// Answers as they appear in survey exports.
fn answer_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z ]{0,30}",
        "(Strongly )?(dis)?agree",
        "(Not |Very )?[Ii]mportant",
        "(yes|no|Yes|No|Y|N|NA|n/a|null)",
        "-?[0-9]{1,3}(\\.[0-9]{1,2})?",
        "\\PC{0,20}",
    ]
}

/// Any cell value, including non-finite numbers.
fn any_cell() -> impl Strategy<Value = Cell> {
    prop_oneof![
        Just(Cell::Empty),
        any::<f64>().prop_map(Cell::Number),
        answer_text().prop_map(Cell::Text),
    ]
}

/// Paired samples on the survey scale.
fn paired_samples() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (2usize..40).prop_flat_map(|n| {
        (
            prop::collection::vec(1.0f64..5.0, n),
            prop::collection::vec(1.0f64..5.0, n),
        )
    })
}

/// A survey table with two target columns and three predictors.
fn survey_table() -> impl Strategy<Value = RawTable> {
    prop::collection::vec(prop::collection::vec(any_cell(), 5), 0..30).prop_map(|body| {
        let mut rows = vec![
            vec![
                Cell::from("Targets"),
                Cell::Empty,
                Cell::from("Attitudes"),
                Cell::Empty,
                Cell::from("Profile"),
            ],
            vec![
                Cell::from("Willingness"),
                Cell::from("Price"),
                Cell::from("Statement A"),
                Cell::from("Statement B"),
                Cell::from("Age"),
            ],
        ];
        rows.extend(body);
        RawTable::new(rows)
    })
}

fn engine() -> Propensity {
    Propensity::with_config(PropensityConfig {
        scan: ScanConfig::default().with_min_sample_size(3),
        ..Default::default()
    })
    .with_targets(TargetConfig::new(vec![
        TargetDefinition::new(0, 0.6, "willingness"),
        TargetDefinition::new(1, 0.4, "price").inverted(),
    ]))
}

// =============================================================================
// Normalizer Properties
// =============================================================================

mod normalizer_tests {
    use super::*;

    proptest! {
        /// Every cell normalizes to absent or a score on the scale.
        #[test]
        fn normalize_is_total(cell in any_cell()) {
            match normalize(&cell) {
                NormalizedScore::Absent => {}
                NormalizedScore::Score(s) => {
                    prop_assert!((SCALE_MIN..=SCALE_MAX).contains(&s), "{} out of range", s);
                }
            }
        }

        /// Normalization is deterministic.
        #[test]
        fn normalize_is_deterministic(text in answer_text()) {
            prop_assert_eq!(normalize_text(&text), normalize_text(&text));
        }

        /// Inversion keeps absence and stays on the scale.
        #[test]
        fn inversion_stays_on_scale(cell in any_cell()) {
            let score = normalize(&cell);
            let inverted = score.inverted();
            prop_assert_eq!(inverted.is_absent(), score.is_absent());
            if let (Some(s), Some(i)) = (score.value(), inverted.value()) {
                prop_assert!((SCALE_MIN..=SCALE_MAX).contains(&i));
                prop_assert!((s + i - (SCALE_MIN + SCALE_MAX)).abs() < 1e-12);
            }
        }

        /// Numbers inside the scale pass through unchanged.
        #[test]
        fn in_range_numbers_pass_through(n in 1.0f64..=5.0) {
            prop_assert_eq!(normalize(&Cell::Number(n)), NormalizedScore::Score(n));
        }
    }
}

// =============================================================================
// Correlation Properties
// =============================================================================

mod correlation_tests {
    use super::*;

    proptest! {
        /// Pearson r is bounded.
        #[test]
        fn pearson_is_bounded((x, y) in paired_samples()) {
            let r = pearson(&x, &y);
            prop_assert!((-1.0..=1.0).contains(&r));
        }

        /// Pearson r does not depend on argument order.
        #[test]
        fn pearson_is_symmetric((x, y) in paired_samples()) {
            prop_assert!((pearson(&x, &y) - pearson(&y, &x)).abs() < 1e-12);
        }

        /// A constant sequence correlates to exactly 0.
        #[test]
        fn constant_sequence_is_zero(c in 1.0f64..5.0, y in prop::collection::vec(1.0f64..5.0, 2..30)) {
            let x = vec![c; y.len()];
            prop_assert_eq!(pearson(&x, &y), 0.0);
        }
    }
}

// =============================================================================
// Composite Properties
// =============================================================================

mod composite_tests {
    use super::*;

    proptest! {
        /// A weighted mean of scale values stays on the scale.
        #[test]
        fn composite_stays_on_scale(
            parts in prop::collection::vec((1.0f64..=5.0, 0.01f64..10.0), 1..10)
        ) {
            let composite = parts
                .iter()
                .fold(CompositeAccumulator::default(), |acc, &(s, w)| {
                    acc.add(NormalizedScore::Score(s), w)
                })
                .finish()
                .unwrap();
            prop_assert!((SCALE_MIN - 1e-9..=SCALE_MAX + 1e-9).contains(&composite));
        }

        /// Every composite score lands in exactly one band.
        #[test]
        fn score_bands_cover_scale(score in 1.0f64..=5.0) {
            let range = ScoreRange::of(score);
            prop_assert!(score >= range.lower_bound());
        }
    }
}

// =============================================================================
// Pipeline Properties
// =============================================================================

mod pipeline_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// The pipeline never fails on a table with its header rows.
        #[test]
        fn analyze_never_fails(table in survey_table()) {
            let report = engine().analyze(&table);
            prop_assert!(report.is_ok());
        }

        /// Re-running the pipeline gives identical output.
        #[test]
        fn analyze_is_deterministic(table in survey_table()) {
            let engine = engine();
            let first = engine.analyze(&table).unwrap();
            let second = engine.analyze(&table).unwrap();
            prop_assert_eq!(first, second);
        }

        /// Every respondent row is either scored or skipped.
        #[test]
        fn rows_are_accounted_for(table in survey_table()) {
            let report = engine().analyze(&table).unwrap();
            prop_assert_eq!(
                report.respondent_count + report.skipped_rows.len(),
                table.row_count() - 2
            );
        }

        /// Ranked predictors are ordered by |r| descending, index ascending.
        #[test]
        fn ranking_is_ordered(table in survey_table()) {
            let report = engine().analyze(&table).unwrap();
            for pair in report.top_predictors.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                prop_assert!(
                    a.correlation.abs() > b.correlation.abs()
                        || (a.correlation.abs() == b.correlation.abs() && a.index < b.index)
                );
            }
        }

        /// Composite scores stay on the scale.
        #[test]
        fn composites_on_scale(table in survey_table()) {
            let report = engine().analyze(&table).unwrap();
            for r in &report.respondents {
                prop_assert!(r.composite_score >= SCALE_MIN - 1e-9);
                prop_assert!(r.composite_score <= SCALE_MAX + 1e-9);
            }
        }
    }
}

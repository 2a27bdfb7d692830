//! Pearson correlation of predictors against an outcome score.

use std::cmp::Ordering;
use std::ops::Range;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::input::RawTable;
use crate::schema::{Classification, PredictorBucket, Question};
use crate::scoring::normalize;

/// Minimum pairs for scans against a single target question.
pub const SINGLE_TARGET_MIN_SAMPLE: usize = 20;

/// Minimum pairs for scans against the weighted composite.
pub const COMPOSITE_MIN_SAMPLE: usize = 50;

/// Parameters of a predictor scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Predictors with fewer valid pairs are left out of the ranking.
    pub min_sample_size: usize,
    /// Administrative columns never classified or ranked.
    pub excluded_columns: Range<usize>,
    /// Keep only this many top predictors (None = all). The number cut is
    /// reported in [`Ranking::truncated`].
    pub max_predictors: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_sample_size: SINGLE_TARGET_MIN_SAMPLE,
            excluded_columns: 0..0,
            max_predictors: None,
        }
    }
}

impl ScanConfig {
    /// Thresholds used for composite-weighted scans.
    pub fn composite() -> Self {
        Self {
            min_sample_size: COMPOSITE_MIN_SAMPLE,
            ..Default::default()
        }
    }

    pub fn with_min_sample_size(mut self, min_sample_size: usize) -> Self {
        self.min_sample_size = min_sample_size;
        self
    }

    pub fn with_excluded_columns(mut self, excluded_columns: Range<usize>) -> Self {
        self.excluded_columns = excluded_columns;
        self
    }

    pub fn with_max_predictors(mut self, max_predictors: usize) -> Self {
        self.max_predictors = Some(max_predictors);
        self
    }
}

/// A ranked predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorCorrelation {
    pub index: usize,
    pub question: String,
    /// Every header level of the column joined with ` | `.
    #[serde(default)]
    pub long_name: String,
    /// Pearson r in `[-1, 1]`.
    pub correlation: f64,
    pub sample_size: usize,
    pub bucket: PredictorBucket,
    /// True when one of the sequences had zero variance and r was set to 0.
    #[serde(default)]
    pub degenerate: bool,
}

/// A predictor left out of the ranking for lack of data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedPredictor {
    pub index: usize,
    pub question: String,
    #[serde(default)]
    pub long_name: String,
    pub bucket: PredictorBucket,
    pub sample_size: usize,
}

/// Output of a scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    /// Sorted by |r| descending, then column index ascending.
    pub ranked: Vec<PredictorCorrelation>,
    /// Predictors below the sample threshold, in input order.
    pub excluded: Vec<ExcludedPredictor>,
    /// Ranked predictors dropped by `max_predictors`.
    pub truncated: usize,
}

/// Pearson product-moment correlation.
///
/// Returns `None` when either sequence has zero variance or fewer than two
/// pairs. Sequences are paired positionally; extra trailing values in the
/// longer one are ignored.
pub fn pearson_checked(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let (x, y) = (&x[..n], &y[..n]);

    if is_constant(x) || is_constant(y) {
        return None;
    }

    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2, mut sum_y2) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for (&a, &b) in x.iter().zip(y) {
        sum_x += a;
        sum_y += b;
        sum_xy += a * b;
        sum_x2 += a * a;
        sum_y2 += b * b;
    }

    let n = n as f64;
    let numerator = n * sum_xy - sum_x * sum_y;
    let denominator = ((n * sum_x2 - sum_x * sum_x) * (n * sum_y2 - sum_y * sum_y)).sqrt();

    if !denominator.is_finite() || denominator <= 0.0 {
        return None;
    }

    Some((numerator / denominator).clamp(-1.0, 1.0))
}

/// Pearson correlation with degenerate inputs defined as 0.
///
/// ```
/// use propensity::pearson;
///
/// assert_eq!(pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]), 1.0);
/// assert_eq!(pearson(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]), 0.0);
/// ```
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    pearson_checked(x, y).unwrap_or(0.0)
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Ranking order: strongest |r| first, lower column index on ties.
fn ranking_order(a: &PredictorCorrelation, b: &PredictorCorrelation) -> Ordering {
    b.correlation
        .abs()
        .total_cmp(&a.correlation.abs())
        .then_with(|| a.index.cmp(&b.index))
}

/// Correlates predictor columns with an outcome score per respondent.
pub struct CorrelationRanker<'a> {
    config: &'a ScanConfig,
}

impl<'a> CorrelationRanker<'a> {
    pub fn new(config: &'a ScanConfig) -> Self {
        Self { config }
    }

    /// Rank predictors against `outcomes`, given as `(row_index, score)`
    /// pairs for valid respondents only.
    ///
    /// A respondent counts toward a predictor when its cell normalizes to a
    /// score. Target classifications in `predictors` are ignored.
    pub fn rank(
        &self,
        table: &RawTable,
        questions: &[Question],
        predictors: &[Classification],
        outcomes: &[(usize, f64)],
    ) -> Ranking {
        let scored: Vec<Result<PredictorCorrelation, ExcludedPredictor>> = predictors
            .par_iter()
            .filter_map(|c| match c {
                Classification::Predictor { index, bucket } => {
                    Some(self.score_predictor(table, questions, *index, *bucket, outcomes))
                }
                Classification::Target { .. } => None,
            })
            .collect();

        let mut ranking = Ranking::default();
        for result in scored {
            match result {
                Ok(correlation) => ranking.ranked.push(correlation),
                Err(excluded) => ranking.excluded.push(excluded),
            }
        }

        ranking.ranked.sort_by(ranking_order);
        if let Some(max) = self.config.max_predictors {
            ranking.truncated = ranking.ranked.len().saturating_sub(max);
            ranking.ranked.truncate(max);
        }

        tracing::debug!(
            ranked = ranking.ranked.len(),
            excluded = ranking.excluded.len(),
            truncated = ranking.truncated,
            min_sample_size = self.config.min_sample_size,
            "Ranked predictors"
        );

        ranking
    }

    fn score_predictor(
        &self,
        table: &RawTable,
        questions: &[Question],
        index: usize,
        bucket: PredictorBucket,
        outcomes: &[(usize, f64)],
    ) -> Result<PredictorCorrelation, ExcludedPredictor> {
        let (xs, ys): (Vec<f64>, Vec<f64>) = outcomes
            .iter()
            .filter_map(|&(row, outcome)| {
                table
                    .get(row, index)
                    .and_then(|cell| normalize(cell).value())
                    .map(|x| (x, outcome))
            })
            .unzip();

        let (question, long_name) = questions
            .get(index)
            .filter(|q| q.index == index)
            .map(|q| (q.text.clone(), q.long_name.clone()))
            .unwrap_or_default();

        let sample_size = xs.len();
        if sample_size < self.config.min_sample_size {
            return Err(ExcludedPredictor {
                index,
                question,
                long_name,
                bucket,
                sample_size,
            });
        }

        let checked = pearson_checked(&xs, &ys);

        Ok(PredictorCorrelation {
            index,
            question,
            long_name,
            correlation: checked.unwrap_or(0.0),
            sample_size,
            bucket,
            degenerate: checked.is_none(),
        })
    }
}

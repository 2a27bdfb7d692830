//! Weighted composite target scores with partial-coverage handling.

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::normalize::{NormalizedScore, normalize};
use crate::error::{PropensityError, Result};
use crate::input::{Cell, RawTable, TableLayout};
use crate::schema::{Classification, TargetKind};

/// One question that feeds the composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetDefinition {
    /// Source column.
    pub column_index: usize,
    /// Relative weight; normalized over the targets a respondent answered.
    pub weight: f64,
    /// Score as `6 - s` so that a high answer means low propensity.
    #[serde(default)]
    pub invert: bool,
    /// Name used for the component score.
    pub name: String,
    /// What the question measures, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TargetKind>,
}

impl TargetDefinition {
    pub fn new(column_index: usize, weight: f64, name: impl Into<String>) -> Self {
        Self {
            column_index,
            weight,
            invert: false,
            name: name.into(),
            kind: None,
        }
    }

    /// Score this target inverted.
    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    pub fn with_kind(mut self, kind: TargetKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Effective score of one cell, `Absent` when the cell has no answer.
    pub fn score(&self, cell: Option<&Cell>) -> NormalizedScore {
        let raw = cell.map(normalize).unwrap_or(NormalizedScore::Absent);
        if self.invert { raw.inverted() } else { raw }
    }
}

/// Ordered set of target definitions.
///
/// Weights need not sum to one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetConfig {
    targets: Vec<TargetDefinition>,
}

impl TargetConfig {
    pub fn new(targets: Vec<TargetDefinition>) -> Self {
        Self { targets }
    }

    /// Build a config from classifier output, keeping target columns only.
    pub fn from_classifications(classifications: &[Classification]) -> Self {
        let targets = classifications
            .iter()
            .filter_map(|c| match c {
                Classification::Target {
                    index,
                    weight,
                    invert,
                    name,
                    kind,
                } => Some(TargetDefinition {
                    column_index: *index,
                    weight: *weight,
                    invert: *invert,
                    name: name.clone(),
                    kind: Some(*kind),
                }),
                Classification::Predictor { .. } => None,
            })
            .collect();
        Self { targets }
    }

    pub fn targets(&self) -> &[TargetDefinition] {
        &self.targets
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether a column feeds the composite.
    pub fn contains_column(&self, column_index: usize) -> bool {
        self.targets.iter().any(|t| t.column_index == column_index)
    }

    /// Target names mapped to their configured weights.
    pub fn weights(&self) -> IndexMap<String, f64> {
        self.targets
            .iter()
            .map(|t| (t.name.clone(), t.weight))
            .collect()
    }

    /// Reject weights that cannot be normalized and duplicate names.
    pub fn validate(&self) -> Result<()> {
        for target in &self.targets {
            if !target.weight.is_finite() || target.weight <= 0.0 {
                return Err(PropensityError::Config(format!(
                    "target '{}' has weight {}; weights must be positive",
                    target.name, target.weight
                )));
            }
        }
        for (i, target) in self.targets.iter().enumerate() {
            if self.targets[..i].iter().any(|t| t.name == target.name) {
                return Err(PropensityError::Config(format!(
                    "target name '{}' is used more than once",
                    target.name
                )));
            }
        }
        Ok(())
    }
}

/// Running weighted sum over the targets one respondent answered.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompositeAccumulator {
    pub numerator: f64,
    pub denominator: f64,
}

impl CompositeAccumulator {
    /// Fold one component in. Absent scores leave the accumulator unchanged.
    pub fn add(self, score: NormalizedScore, weight: f64) -> Self {
        match score.value() {
            Some(s) => Self {
                numerator: self.numerator + s * weight,
                denominator: self.denominator + weight,
            },
            None => self,
        }
    }

    /// Weighted mean, or `None` when nothing was answered.
    pub fn finish(&self) -> Option<f64> {
        if self.denominator > 0.0 {
            Some(self.numerator / self.denominator)
        } else {
            None
        }
    }
}

/// Composite score of one respondent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RespondentComposite {
    pub respondent_id: String,
    pub row_index: usize,
    /// Effective (post-inversion) score per target name.
    pub component_scores: IndexMap<String, NormalizedScore>,
    pub composite_score: f64,
    /// Sum of the weights of the answered targets; always positive.
    pub valid_weight: f64,
}

/// Why a respondent row produced no composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Fewer cells than the layout's minimum width.
    TooShort,
    /// Every cell is blank.
    Blank,
    /// None of the target questions were answered.
    NoTargetAnswers,
}

/// A respondent row left out of the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub row_index: usize,
    pub reason: SkipReason,
}

/// Result of scoring every respondent row.
#[derive(Debug, Clone, Default)]
pub struct CompositeScores {
    /// Valid respondents in row order.
    pub respondents: Vec<RespondentComposite>,
    /// Rows excluded from downstream stages, in row order.
    pub skipped: Vec<SkippedRow>,
}

impl CompositeScores {
    /// Composite score per table row, for pairing with predictor cells.
    pub fn outcomes(&self) -> Vec<(usize, f64)> {
        self.respondents
            .iter()
            .map(|r| (r.row_index, r.composite_score))
            .collect()
    }
}

/// Scores respondents against a [`TargetConfig`].
pub struct CompositeScorer<'a> {
    targets: &'a TargetConfig,
    layout: &'a TableLayout,
}

impl<'a> CompositeScorer<'a> {
    pub fn new(targets: &'a TargetConfig, layout: &'a TableLayout) -> Self {
        Self { targets, layout }
    }

    /// Score one row. Errors carry the reason the row is excluded.
    pub fn score_row(
        &self,
        row: &[Cell],
        row_index: usize,
    ) -> std::result::Result<RespondentComposite, SkipReason> {
        if row.len() < self.layout.min_row_width {
            return Err(SkipReason::TooShort);
        }
        if row.iter().all(Cell::is_empty) {
            return Err(SkipReason::Blank);
        }

        let mut component_scores = IndexMap::with_capacity(self.targets.len());
        let acc = self
            .targets
            .targets()
            .iter()
            .fold(CompositeAccumulator::default(), |acc, target| {
                let score = target.score(row.get(target.column_index));
                component_scores.insert(target.name.clone(), score);
                acc.add(score, target.weight)
            });

        let composite_score = acc.finish().ok_or(SkipReason::NoTargetAnswers)?;

        Ok(RespondentComposite {
            respondent_id: self.layout.respondent_id(row, row_index),
            row_index,
            component_scores,
            composite_score,
            valid_weight: acc.denominator,
        })
    }

    /// Score every respondent row of the table.
    pub fn score_table(&self, table: &RawTable) -> CompositeScores {
        let results: Vec<(usize, std::result::Result<RespondentComposite, SkipReason>)> = self
            .layout
            .respondent_rows(table)
            .into_par_iter()
            .map(|row_index| {
                let row = table.row(row_index).unwrap_or(&[]);
                (row_index, self.score_row(row, row_index))
            })
            .collect();

        let mut scores = CompositeScores::default();
        for (row_index, result) in results {
            match result {
                Ok(respondent) => scores.respondents.push(respondent),
                Err(reason) => {
                    tracing::debug!(row = row_index, ?reason, "Skipping respondent row");
                    scores.skipped.push(SkippedRow { row_index, reason });
                }
            }
        }

        tracing::debug!(
            valid = scores.respondents.len(),
            skipped = scores.skipped.len(),
            targets = self.targets.len(),
            "Scored respondents"
        );

        scores
    }
}

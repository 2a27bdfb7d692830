//! Where headers and respondents live inside a raw table.

use serde::{Deserialize, Serialize};

use super::source::{Cell, RawTable};
use crate::error::{PropensityError, Result};

/// Rows inspected by [`detect_first_respondent_row`].
const DETECTION_WINDOW: usize = 10;

/// Row index assumed when no row looks like data.
const DEFAULT_FIRST_RESPONDENT_ROW: usize = 2;

/// Positions of the header rows and the respondent block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableLayout {
    /// Row holding the main (group) headers.
    pub main_header_row: usize,
    /// Row holding the per-column sub-headers.
    pub sub_header_row: usize,
    /// First respondent record.
    pub first_respondent_row: usize,
    /// Respondent rows with fewer cells than this are skipped.
    pub min_row_width: usize,
    /// Column carrying a respondent identifier, if any.
    pub respondent_id_column: Option<usize>,
    /// Look for the first data-like row after the header rows instead of
    /// trusting `first_respondent_row`, which stays the fallback.
    pub detect_respondent_rows: bool,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            main_header_row: 0,
            sub_header_row: 1,
            first_respondent_row: DEFAULT_FIRST_RESPONDENT_ROW,
            min_row_width: 1,
            respondent_id_column: None,
            detect_respondent_rows: false,
        }
    }
}

impl TableLayout {
    /// Reject layouts whose header rows overlap the respondent block.
    pub fn validate(&self) -> Result<()> {
        let last_header = self.main_header_row.max(self.sub_header_row);
        if self.first_respondent_row <= last_header {
            return Err(PropensityError::Config(format!(
                "first respondent row {} must come after header rows {} and {}",
                self.first_respondent_row, self.main_header_row, self.sub_header_row
            )));
        }
        Ok(())
    }

    /// The layout to use for `table`.
    ///
    /// With detection on, rows between the header rows and the first
    /// data-like row (notes, question codes) are left out of the respondent
    /// block.
    pub fn resolve(&self, table: &RawTable) -> TableLayout {
        if !self.detect_respondent_rows {
            return self.clone();
        }

        let after_headers = self.main_header_row.max(self.sub_header_row) + 1;
        let first_respondent_row =
            first_data_row(table, after_headers).unwrap_or(self.first_respondent_row);

        tracing::debug!(
            configured = self.first_respondent_row,
            detected = first_respondent_row,
            "Resolved first respondent row"
        );

        TableLayout {
            first_respondent_row,
            ..self.clone()
        }
    }

    /// Fail fast when the table cannot hold the configured header rows.
    pub fn check_shape(&self, table: &RawTable) -> Result<()> {
        if table.is_empty() {
            return Err(PropensityError::InputShape("table has no rows".to_string()));
        }
        let needed = self.main_header_row.max(self.sub_header_row) + 1;
        if table.row_count() < needed {
            return Err(PropensityError::InputShape(format!(
                "table has {} rows but header rows need {}",
                table.row_count(),
                needed
            )));
        }
        Ok(())
    }

    /// Main and sub header rows. Call [`TableLayout::check_shape`] first.
    pub fn header_rows<'a>(&self, table: &'a RawTable) -> (&'a [Cell], &'a [Cell]) {
        (
            table.row(self.main_header_row).unwrap_or(&[]),
            table.row(self.sub_header_row).unwrap_or(&[]),
        )
    }

    /// Indices of the respondent rows.
    pub fn respondent_rows(&self, table: &RawTable) -> std::ops::Range<usize> {
        self.first_respondent_row.min(table.row_count())..table.row_count()
    }

    /// Identifier for a respondent: the id column when it has a value,
    /// otherwise `row_<index>`.
    pub fn respondent_id(&self, row: &[Cell], row_index: usize) -> String {
        self.respondent_id_column
            .and_then(|col| row.get(col))
            .filter(|cell| !cell.is_empty())
            .map(Cell::text)
            .unwrap_or_else(|| format!("row_{}", row_index))
    }
}

/// Guess the first respondent row of an export with an unknown number of
/// header rows.
///
/// A row is taken as data when fewer than 70% of its cells are empty and
/// more than 10% are numeric. The first such row among the first ten wins;
/// without one the conventional two header rows are assumed.
pub fn detect_first_respondent_row(table: &RawTable) -> usize {
    first_data_row(table, 0).unwrap_or(DEFAULT_FIRST_RESPONDENT_ROW)
}

/// First data-like row within the detection window, starting at `start`.
fn first_data_row(table: &RawTable, start: usize) -> Option<usize> {
    for (row_idx, row) in table
        .rows()
        .iter()
        .enumerate()
        .take(DETECTION_WINDOW)
        .skip(start)
    {
        if row.is_empty() {
            continue;
        }

        let total = row.len() as f64;
        let empty = row.iter().filter(|c| c.is_empty()).count() as f64;
        let numeric = row.iter().filter(|c| c.as_number().is_some()).count() as f64;

        tracing::trace!(
            row = row_idx,
            empty_ratio = empty / total,
            numeric_ratio = numeric / total,
            "Inspecting row for data start"
        );

        if empty / total < 0.7 && numeric / total > 0.1 {
            return Some(row_idx);
        }
    }
    None
}

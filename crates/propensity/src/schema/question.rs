//! Question text reconstruction from composite header rows.

use serde::{Deserialize, Serialize};

use crate::input::Cell;

/// Separator between the main header and the sub-header.
const SUB_HEADER_SEPARATOR: &str = " - ";

/// Separator between header levels in a long column name.
const LONG_NAME_SEPARATOR: &str = " | ";

/// One survey column with its reconstructed question text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Zero-based column position.
    pub index: usize,
    /// Full question text (`main - sub`, or whichever part exists).
    pub text: String,
    /// Main header in effect for this column after forward-fill.
    pub main_header: String,
    /// Sub-header written in this column.
    pub sub_header: String,
    /// All header levels joined with ` | `, or `Column_<index>`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub long_name: String,
}

impl Question {
    /// True when neither header row says anything about this column.
    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}

/// Merge a main-header row and a sub-header row into one question per column.
///
/// Main headers are forward-filled: a main header applies to every
/// following column until another non-empty main header appears. Rows may
/// differ in length; the shorter one is treated as blank past its end.
///
/// ```
/// use propensity::{Cell, reconstruct_questions};
///
/// let main = vec![Cell::from("How important is"), Cell::Empty];
/// let sub = vec![Cell::from("Price"), Cell::from("Quality")];
/// let questions = reconstruct_questions(&main, &sub);
///
/// assert_eq!(questions[1].text, "How important is - Quality");
/// ```
pub fn reconstruct_questions(main_row: &[Cell], sub_row: &[Cell]) -> Vec<Question> {
    let width = main_row.len().max(sub_row.len());
    let mut current_main = String::new();
    let mut questions = Vec::with_capacity(width);

    for index in 0..width {
        if let Some(cell) = main_row.get(index).filter(|c| !c.is_empty()) {
            current_main = cell.text();
        }
        let sub_header = sub_row.get(index).map(Cell::text).unwrap_or_default();

        let text = match (current_main.is_empty(), sub_header.is_empty()) {
            (_, true) => current_main.clone(),
            (true, false) => sub_header.clone(),
            (false, false) => format!("{}{}{}", current_main, SUB_HEADER_SEPARATOR, sub_header),
        };

        questions.push(Question {
            index,
            text,
            main_header: current_main.clone(),
            sub_header,
            long_name: String::new(),
        });
    }

    questions
}

/// Long names for an arbitrary stack of header rows.
///
/// Every row is forward-filled to the right, then the distinct non-empty
/// values of each column are joined top-down with ` | `.
pub fn long_names(header_rows: &[&[Cell]]) -> Vec<String> {
    let width = header_rows.iter().map(|r| r.len()).max().unwrap_or(0);

    let filled: Vec<Vec<String>> = header_rows
        .iter()
        .map(|row| {
            let mut last = String::new();
            (0..width)
                .map(|i| {
                    if let Some(cell) = row.get(i).filter(|c| !c.is_empty()) {
                        last = cell.text();
                    }
                    last.clone()
                })
                .collect()
        })
        .collect();

    (0..width)
        .map(|col| {
            let mut parts: Vec<&str> = Vec::new();
            for row in &filled {
                let part = row[col].as_str();
                if !part.is_empty() && !parts.contains(&part) {
                    parts.push(part);
                }
            }
            if parts.is_empty() {
                format!("Column_{}", col)
            } else {
                parts.join(LONG_NAME_SEPARATOR)
            }
        })
        .collect()
}

/// Attach long names to reconstructed questions.
pub fn with_long_names(mut questions: Vec<Question>, header_rows: &[&[Cell]]) -> Vec<Question> {
    for (question, name) in questions.iter_mut().zip(long_names(header_rows)) {
        question.long_name = name;
    }
    questions
}

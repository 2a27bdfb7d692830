//! Conversion of heterogeneous answers onto a 1-5 ordinal scale.
//!
//! Every column, target or predictor, goes through [`normalize`] so that
//! correlations are computed on comparable values.

use serde::{Deserialize, Serialize};

use crate::input::Cell;

/// Lowest score on the scale.
pub const SCALE_MIN: f64 = 1.0;

/// Highest score on the scale.
pub const SCALE_MAX: f64 = 5.0;

/// Score assigned to non-empty text that matches no rule.
pub const NEUTRAL: f64 = 3.0;

/// Text that spreadsheet exports use for missing answers. Words a
/// respondent could type as an answer ("none", "-") are not on the list.
const NULL_TOKENS: &[&str] = &["na", "n/a", "nan", "null"];

/// Phrase rules, checked in order; the first match wins.
///
/// Negative and neutral phrasings come before the positive ones they
/// contain ("disagree" contains "agree", "not important" contains
/// "important").
const PHRASE_RULES: &[(&[&str], f64)] = &[
    (&["neither"], 3.0),
    (&["strongly disagree", "not at all"], 1.0),
    (&["disagree", "not important", "unimportant", "not very"], 2.0),
    (&["strongly agree", "very important", "extremely"], 5.0),
    (&["agree", "important"], 4.0),
    (&["neutral", "somewhat"], 3.0),
];

/// Whole-answer matches for binary questions.
const EXACT_RULES: &[(&str, f64)] = &[("yes", 5.0), ("y", 5.0), ("no", 1.0), ("n", 1.0)];

/// A normalized answer: a score in `[1, 5]`, or nothing at all.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NormalizedScore {
    /// No usable answer; contributes nothing.
    #[default]
    Absent,
    /// A score on the 1-5 scale.
    Score(f64),
}

impl NormalizedScore {
    /// The score, if present.
    pub fn value(&self) -> Option<f64> {
        match self {
            NormalizedScore::Absent => None,
            NormalizedScore::Score(s) => Some(*s),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, NormalizedScore::Absent)
    }

    /// Mirror the score around the scale midpoint (`6 - s`).
    pub fn inverted(&self) -> Self {
        match self {
            NormalizedScore::Absent => NormalizedScore::Absent,
            NormalizedScore::Score(s) => NormalizedScore::Score(SCALE_MIN + SCALE_MAX - s),
        }
    }
}

impl From<NormalizedScore> for Option<f64> {
    fn from(score: NormalizedScore) -> Self {
        score.value()
    }
}

/// Normalize one cell.
///
/// Total and pure: any cell maps to [`NormalizedScore::Absent`] or to a
/// score within `[1, 5]`.
///
/// 1. Empty cells and null tokens (`NA`, `null`, ...) are absent.
/// 2. Numbers in `[1, 5]` pass through; `0` and anything below 1 become 1,
///    anything above 5 becomes 5.
/// 3. Likert phrases (agree, important, neutral, ...) map case-insensitively,
///    negative phrasings first.
/// 4. `yes`/`y` score 5, `no`/`n` score 1.
/// 5. Other text is neutral (3).
///
/// ```
/// use propensity::{normalize, Cell, NormalizedScore};
///
/// assert_eq!(normalize(&Cell::from("Strongly agree")), NormalizedScore::Score(5.0));
/// assert_eq!(normalize(&Cell::from(7.0)), NormalizedScore::Score(5.0));
/// assert_eq!(normalize(&Cell::Empty), NormalizedScore::Absent);
/// ```
pub fn normalize(cell: &Cell) -> NormalizedScore {
    match cell {
        Cell::Empty => NormalizedScore::Absent,
        Cell::Number(n) => normalize_number(*n),
        Cell::Text(text) => normalize_text(text),
    }
}

/// Normalize free text as read from a delimited file.
pub fn normalize_text(text: &str) -> NormalizedScore {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return NormalizedScore::Absent;
    }

    let lower = trimmed.to_lowercase();
    if NULL_TOKENS.contains(&lower.as_str()) {
        return NormalizedScore::Absent;
    }

    if let Ok(n) = trimmed.parse::<f64>()
        && n.is_finite()
    {
        return clamp_to_scale(n);
    }

    for (phrases, score) in PHRASE_RULES {
        if phrases.iter().any(|p| lower.contains(p)) {
            return NormalizedScore::Score(*score);
        }
    }

    EXACT_RULES
        .iter()
        .find(|(word, _)| lower == *word)
        .map(|(_, score)| NormalizedScore::Score(*score))
        .unwrap_or(NormalizedScore::Score(NEUTRAL))
}

fn normalize_number(n: f64) -> NormalizedScore {
    if n.is_finite() {
        clamp_to_scale(n)
    } else {
        NormalizedScore::Absent
    }
}

fn clamp_to_scale(n: f64) -> NormalizedScore {
    NormalizedScore::Score(n.clamp(SCALE_MIN, SCALE_MAX))
}

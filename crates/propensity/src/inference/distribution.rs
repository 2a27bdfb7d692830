//! Segmentation of respondents by composite score.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::input::RawTable;
use crate::scoring::{RespondentComposite, SCALE_MAX, normalize};

/// Qualitative respondent segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    PremiumPayerProven,
    SelectivePayerProven,
    OpportunisticPayer,
    PremiumPayerPotential,
    InterestedNonPayer,
    PriceConscious,
    PriceSensitive,
}

impl Segment {
    /// All segments in report order.
    pub const ALL: [Segment; 7] = [
        Segment::PremiumPayerProven,
        Segment::SelectivePayerProven,
        Segment::OpportunisticPayer,
        Segment::PremiumPayerPotential,
        Segment::InterestedNonPayer,
        Segment::PriceConscious,
        Segment::PriceSensitive,
    ];

    /// Segment for a composite score.
    ///
    /// `proven` is true when the respondent gave the top answer to the
    /// proven-behavior question.
    pub fn classify(score: f64, proven: bool) -> Self {
        if proven {
            if score >= 4.0 {
                Segment::PremiumPayerProven
            } else if score >= 3.0 {
                Segment::SelectivePayerProven
            } else {
                Segment::OpportunisticPayer
            }
        } else if score >= 4.0 {
            Segment::PremiumPayerPotential
        } else if score >= 3.0 {
            Segment::InterestedNonPayer
        } else if score >= 2.0 {
            Segment::PriceConscious
        } else {
            Segment::PriceSensitive
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Segment::PremiumPayerProven => "Premium Payer (Proven)",
            Segment::SelectivePayerProven => "Selective Payer (Proven)",
            Segment::OpportunisticPayer => "Opportunistic Payer",
            Segment::PremiumPayerPotential => "Premium Payer (Potential)",
            Segment::InterestedNonPayer => "Interested Non-Payer",
            Segment::PriceConscious => "Price Conscious",
            Segment::PriceSensitive => "Price Sensitive",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed composite-score band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreRange {
    /// `[4.5, 5.0]`
    Top,
    /// `[3.5, 4.5)`
    High,
    /// `[2.5, 3.5)`
    Middle,
    /// `[1.5, 2.5)`
    Low,
    /// `[1.0, 1.5)`
    Bottom,
}

impl ScoreRange {
    /// Bands from the top down.
    pub const ALL: [ScoreRange; 5] = [
        ScoreRange::Top,
        ScoreRange::High,
        ScoreRange::Middle,
        ScoreRange::Low,
        ScoreRange::Bottom,
    ];

    /// Band of a composite score. Bands are tried top-down and the first
    /// whose lower bound is met wins, so 4.5 lands in [`ScoreRange::Top`].
    pub fn of(score: f64) -> Self {
        Self::ALL
            .into_iter()
            .find(|range| score >= range.lower_bound())
            .unwrap_or(ScoreRange::Bottom)
    }

    pub fn lower_bound(&self) -> f64 {
        match self {
            ScoreRange::Top => 4.5,
            ScoreRange::High => 3.5,
            ScoreRange::Middle => 2.5,
            ScoreRange::Low => 1.5,
            ScoreRange::Bottom => 1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreRange::Top => "4.5-5.0",
            ScoreRange::High => "3.5-4.5",
            ScoreRange::Middle => "2.5-3.5",
            ScoreRange::Low => "1.5-2.5",
            ScoreRange::Bottom => "1.0-1.5",
        }
    }
}

impl fmt::Display for ScoreRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Counts of valid respondents per segment and per score band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    /// Segment label to count, every segment present.
    pub categories: IndexMap<String, usize>,
    /// Band label to count, every band present, top band first.
    pub score_ranges: IndexMap<String, usize>,
    /// Mean composite score, `None` without respondents.
    pub average_score: Option<f64>,
}

impl Distribution {
    /// Count for one segment.
    pub fn segment_count(&self, segment: Segment) -> usize {
        self.categories.get(segment.label()).copied().unwrap_or(0)
    }

    /// Count for one score band.
    pub fn range_count(&self, range: ScoreRange) -> usize {
        self.score_ranges.get(range.label()).copied().unwrap_or(0)
    }
}

/// Buckets respondents by segment and score band.
pub struct DistributionAnalyzer {
    /// Column whose top answer marks proven behavior.
    proven_behavior_column: Option<usize>,
}

impl DistributionAnalyzer {
    pub fn new(proven_behavior_column: Option<usize>) -> Self {
        Self {
            proven_behavior_column,
        }
    }

    /// Whether the respondent's proven-behavior answer is the top score.
    /// Missing answers and an unset column count as not proven.
    pub fn is_proven(&self, table: &RawTable, respondent: &RespondentComposite) -> bool {
        self.proven_behavior_column
            .and_then(|col| table.get(respondent.row_index, col))
            .and_then(|cell| normalize(cell).value())
            .is_some_and(|score| score == SCALE_MAX)
    }

    pub fn segment(&self, table: &RawTable, respondent: &RespondentComposite) -> Segment {
        Segment::classify(respondent.composite_score, self.is_proven(table, respondent))
    }

    pub fn analyze(&self, table: &RawTable, respondents: &[RespondentComposite]) -> Distribution {
        let mut categories: IndexMap<String, usize> = Segment::ALL
            .iter()
            .map(|s| (s.label().to_string(), 0))
            .collect();
        let mut score_ranges: IndexMap<String, usize> = ScoreRange::ALL
            .iter()
            .map(|r| (r.label().to_string(), 0))
            .collect();

        for respondent in respondents {
            let segment = self.segment(table, respondent);
            *categories.entry(segment.label().to_string()).or_insert(0) += 1;

            let range = ScoreRange::of(respondent.composite_score);
            *score_ranges.entry(range.label().to_string()).or_insert(0) += 1;
        }

        let average_score = if respondents.is_empty() {
            None
        } else {
            let total: f64 = respondents.iter().map(|r| r.composite_score).sum();
            Some(total / respondents.len() as f64)
        };

        Distribution {
            categories,
            score_ranges,
            average_score,
        }
    }
}

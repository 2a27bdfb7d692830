//! Column roles: target kinds, predictor buckets and classifications.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The behavioral or attitudinal outcome a target question measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Stated willingness to pay more.
    DirectWillingness,
    /// How much price drives the decision. Scored inverted.
    PriceSensitivity,
    /// Perceived value for money.
    ValueForMoney,
    /// Reported purchases of sustainable products.
    PurchaseBehavior,
    /// Stated trade-offs in favour of sustainability or quality.
    TradeOff,
}

impl TargetKind {
    /// All kinds in rule order.
    pub const ALL: [TargetKind; 5] = [
        TargetKind::DirectWillingness,
        TargetKind::PriceSensitivity,
        TargetKind::ValueForMoney,
        TargetKind::PurchaseBehavior,
        TargetKind::TradeOff,
    ];

    /// Weight used when targets are detected rather than configured.
    pub fn default_weight(&self) -> f64 {
        match self {
            TargetKind::DirectWillingness => 0.4,
            TargetKind::PriceSensitivity => 0.2,
            TargetKind::ValueForMoney => 0.15,
            TargetKind::PurchaseBehavior => 0.15,
            TargetKind::TradeOff => 0.1,
        }
    }

    /// Whether a high answer means low propensity.
    pub fn default_invert(&self) -> bool {
        matches!(self, TargetKind::PriceSensitivity)
    }

    /// Snake-case name, used for detected target names.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::DirectWillingness => "direct_willingness",
            TargetKind::PriceSensitivity => "price_sensitivity",
            TargetKind::ValueForMoney => "value_for_money",
            TargetKind::PurchaseBehavior => "purchase_behavior",
            TargetKind::TradeOff => "trade_off",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic bucket of a predictor question.
///
/// Declaration order is the rule order and the report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictorBucket {
    Values,
    Importance,
    Behavior,
    Demographics,
    Brand,
    Sustainability,
    Other,
}

impl PredictorBucket {
    /// All buckets in rule order.
    pub const ALL: [PredictorBucket; 7] = [
        PredictorBucket::Values,
        PredictorBucket::Importance,
        PredictorBucket::Behavior,
        PredictorBucket::Demographics,
        PredictorBucket::Brand,
        PredictorBucket::Sustainability,
        PredictorBucket::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PredictorBucket::Values => "values",
            PredictorBucket::Importance => "importance",
            PredictorBucket::Behavior => "behavior",
            PredictorBucket::Demographics => "demographics",
            PredictorBucket::Brand => "brand",
            PredictorBucket::Sustainability => "sustainability",
            PredictorBucket::Other => "other",
        }
    }

    /// Short description handed to semantic categorizers.
    pub fn description(&self) -> &'static str {
        match self {
            PredictorBucket::Values => "Attitudes, beliefs and agreement with statements",
            PredictorBucket::Importance => "How important a factor is in the decision",
            PredictorBucket::Behavior => "What the respondent does or has done",
            PredictorBucket::Demographics => "Who the respondent is (age, income, household)",
            PredictorBucket::Brand => "Awareness of or preference for specific brands",
            PredictorBucket::Sustainability => "Environmental and ethical concerns",
            PredictorBucket::Other => "Anything else",
        }
    }

    /// Parse a bucket name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|bucket| bucket.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for PredictorBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The role assigned to one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Classification {
    /// Contributes to the composite score.
    Target {
        index: usize,
        weight: f64,
        invert: bool,
        name: String,
        kind: TargetKind,
    },
    /// Ranked against the composite score.
    Predictor {
        index: usize,
        bucket: PredictorBucket,
    },
}

impl Classification {
    /// Column the classification applies to.
    pub fn index(&self) -> usize {
        match self {
            Classification::Target { index, .. } => *index,
            Classification::Predictor { index, .. } => *index,
        }
    }

    pub fn is_target(&self) -> bool {
        matches!(self, Classification::Target { .. })
    }

    /// Bucket of a predictor, `None` for targets.
    pub fn bucket(&self) -> Option<PredictorBucket> {
        match self {
            Classification::Predictor { bucket, .. } => Some(*bucket),
            Classification::Target { .. } => None,
        }
    }
}

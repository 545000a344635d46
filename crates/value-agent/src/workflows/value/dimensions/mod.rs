//! The four rule-based dimensions. Every condition is evaluated independently and the
//! score is derived purely from the snapshot.

mod fundamental;
mod moat;
mod risk;
mod safety_margin;

pub use fundamental::score_fundamental;
pub use moat::score_moat;
pub use risk::score_risk;
pub use safety_margin::score_safety_margin;

use serde::{Deserialize, Serialize};

use crate::market::CompanySnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    SafetyMargin,
    Fundamental,
    Moat,
    Risk,
}

impl Dimension {
    pub fn label(self) -> &'static str {
        match self {
            Dimension::SafetyMargin => "安全边际",
            Dimension::Fundamental => "基本面",
            Dimension::Moat => "护城河",
            Dimension::Risk => "风险评分",
        }
    }
}

/// Margin band and suggested action, reported by the safety-margin dimension only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyGuidance {
    pub margin: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: Dimension,
    pub score: u32,
    pub label: String,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance: Option<SafetyGuidance>,
}

/// Score all four dimensions in report order.
pub fn score_dimensions(snapshot: &CompanySnapshot) -> [DimensionScore; 4] {
    [
        score_safety_margin(snapshot),
        score_fundamental(snapshot),
        score_moat(snapshot),
        score_risk(snapshot),
    ]
}

/// Collects points and reasons while walking a dimension's conditions.
#[derive(Default)]
pub(crate) struct Tally {
    score: u32,
    reasons: Vec<String>,
}

impl Tally {
    pub(crate) fn award(&mut self, holds: bool, points: u32, reason: impl FnOnce() -> String) {
        if holds {
            self.score += points;
            self.reasons.push(reason());
        }
    }
}

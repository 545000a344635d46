use serde::{Deserialize, Serialize};

use super::domain::{FactorKey, FactorRecord};

/// Factors that contribute to the scorecard. `pb` is validated but never scored.
pub const SCORED_FACTORS: [FactorKey; 9] = [
    FactorKey::Roe,
    FactorKey::GrossMargin,
    FactorKey::CashFlowRatio,
    FactorKey::DebtRatio,
    FactorKey::Pe,
    FactorKey::DividendYield,
    FactorKey::RevenueGrowth,
    FactorKey::ProfitGrowth,
    FactorKey::CashFlowQuality,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactorGrade {
    #[serde(rename = "优秀")]
    Excellent,
    #[serde(rename = "良好")]
    Good,
    #[serde(rename = "一般")]
    Fair,
    #[serde(rename = "较差")]
    Weak,
    #[serde(rename = "差")]
    Poor,
}

impl FactorGrade {
    pub fn from_average(average: f64) -> Self {
        if average >= 4.5 {
            FactorGrade::Excellent
        } else if average >= 3.5 {
            FactorGrade::Good
        } else if average >= 2.5 {
            FactorGrade::Fair
        } else if average >= 1.5 {
            FactorGrade::Weak
        } else {
            FactorGrade::Poor
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FactorGrade::Excellent => "优秀",
            FactorGrade::Good => "良好",
            FactorGrade::Fair => "一般",
            FactorGrade::Weak => "较差",
            FactorGrade::Poor => "差",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorScore {
    pub factor: FactorKey,
    pub score: u8,
}

/// Per-factor 1..=5 scores plus the aggregate grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScorecard {
    pub scores: Vec<FactorScore>,
    pub total: u32,
    pub average: f64,
    pub grade: FactorGrade,
}

impl FactorScorecard {
    pub fn score_for(&self, factor: FactorKey) -> Option<u8> {
        self.scores
            .iter()
            .find(|entry| entry.factor == factor)
            .map(|entry| entry.score)
    }
}

pub fn score_factors(factors: &FactorRecord) -> FactorScorecard {
    let scores: Vec<FactorScore> = SCORED_FACTORS
        .iter()
        .map(|factor| FactorScore {
            factor: *factor,
            score: score_factor(*factor, factors.get(*factor)),
        })
        .collect();

    let total: u32 = scores.iter().map(|entry| u32::from(entry.score)).sum();
    let average = f64::from(total) / SCORED_FACTORS.len() as f64;

    FactorScorecard {
        scores,
        total,
        average,
        grade: FactorGrade::from_average(average),
    }
}

fn score_factor(factor: FactorKey, value: f64) -> u8 {
    match factor {
        FactorKey::Roe => ladder(value, [20.0, 15.0, 10.0, 5.0]),
        FactorKey::GrossMargin => ladder(value, [40.0, 30.0, 20.0, 10.0]),
        FactorKey::CashFlowRatio => ladder(value, [1.5, 1.0, 0.5, 0.2]),
        FactorKey::DebtRatio => inverse_ladder(value, [30.0, 40.0, 50.0, 60.0]),
        FactorKey::Pe => score_pe(value),
        FactorKey::DividendYield => ladder(value, [3.0, 2.0, 1.0, 0.5]),
        FactorKey::RevenueGrowth | FactorKey::ProfitGrowth => {
            ladder(value, [30.0, 20.0, 10.0, 5.0])
        }
        FactorKey::CashFlowQuality => ladder(value, [0.8, 0.6, 0.4, 0.2]),
        FactorKey::Pb => 0,
    }
}

/// Higher is better; bounds are inclusive and checked from the top.
fn ladder(value: f64, bounds: [f64; 4]) -> u8 {
    bounds
        .iter()
        .position(|bound| value >= *bound)
        .map(|index| 5 - index as u8)
        .unwrap_or(1)
}

/// Lower is better; bounds are exclusive.
fn inverse_ladder(value: f64, bounds: [f64; 4]) -> u8 {
    bounds
        .iter()
        .position(|bound| value < *bound)
        .map(|index| 5 - index as u8)
        .unwrap_or(1)
}

fn score_pe(pe: f64) -> u8 {
    if pe <= 0.0 {
        return 1;
    }
    inverse_ladder(pe, [15.0, 20.0, 25.0, 30.0])
}

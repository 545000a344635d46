use serde::{Deserialize, Serialize};

use super::dimensions::{score_dimensions, DimensionScore};
use crate::market::CompanySnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    StrongRecommend,
    Watch,
    Neutral,
    Avoid,
}

impl Decision {
    pub fn from_average(avg_score: u32) -> Self {
        match avg_score {
            80.. => Decision::StrongRecommend,
            65..=79 => Decision::Watch,
            50..=64 => Decision::Neutral,
            _ => Decision::Avoid,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Decision::StrongRecommend => "🌟 强烈推荐｜价值优质 + 安全边际高",
            Decision::Watch => "✅ 建议关注｜基本面稳健",
            Decision::Neutral => "⚠️  中性观察｜需等待更好价格",
            Decision::Avoid => "❌ 规避｜风险偏高或估值过贵",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalRating {
    pub avg_score: u32,
    pub decision: Decision,
    pub label: String,
    pub all_warnings: Vec<String>,
}

/// Floor-averaged score across dimensions; warnings keep dimension order.
pub fn final_rating(scores: &[DimensionScore]) -> FinalRating {
    let total: u32 = scores.iter().map(|score| score.score).sum();
    let avg_score = match u32::try_from(scores.len()) {
        Ok(count) if count > 0 => total / count,
        _ => 0,
    };
    let decision = Decision::from_average(avg_score);

    FinalRating {
        avg_score,
        decision,
        label: decision.label().to_string(),
        all_warnings: scores
            .iter()
            .flat_map(|score| score.warnings.iter().cloned())
            .collect(),
    }
}

/// The rule-based half of a value analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionReport {
    pub safety_margin: DimensionScore,
    pub fundamental: DimensionScore,
    pub moat: DimensionScore,
    pub risk: DimensionScore,
    pub avg_score: u32,
    pub final_decision: Decision,
    pub decision_label: String,
    pub all_warnings: Vec<String>,
}

pub fn rate_company(snapshot: &CompanySnapshot) -> DimensionReport {
    let scores = score_dimensions(snapshot);
    let rating = final_rating(&scores);
    let [safety_margin, fundamental, moat, risk] = scores;

    DimensionReport {
        safety_margin,
        fundamental,
        moat,
        risk,
        avg_score: rating.avg_score,
        final_decision: rating.decision,
        decision_label: rating.label,
        all_warnings: rating.all_warnings,
    }
}

use serde::{Deserialize, Serialize};

const RULE_WEIGHT: f64 = 0.6;
const MODEL_WEIGHT: f64 = 0.4;
const DEFAULT_LEVEL: u8 = 3;

/// First matching keyword wins, so longer phrases precede their substrings.
const LEVEL_KEYWORDS: [(&str, u8); 8] = [
    ("强烈推荐", 5),
    ("建议买入", 4),
    ("买入", 4),
    ("建议关注", 4),
    ("持有", 3),
    ("中性", 2),
    ("卖出", 1),
    ("规避", 1),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratedRecommendation {
    pub rule_level: u8,
    pub llm_level: u8,
    pub blended: f64,
    pub label: String,
}

pub fn recommendation_level(label: &str) -> u8 {
    LEVEL_KEYWORDS
        .iter()
        .find(|(keyword, _)| label.contains(keyword))
        .map(|(_, level)| *level)
        .unwrap_or(DEFAULT_LEVEL)
}

/// Weighted blend of the rule decision and the analyst's recommendation.
pub fn blend(rule_label: &str, llm_label: &str) -> IntegratedRecommendation {
    let rule_level = recommendation_level(rule_label);
    let llm_level = recommendation_level(llm_label);
    let blended = f64::from(rule_level) * RULE_WEIGHT + f64::from(llm_level) * MODEL_WEIGHT;

    IntegratedRecommendation {
        rule_level,
        llm_level,
        blended,
        label: blended_label(blended).to_string(),
    }
}

/// Band of a blended level; lower bounds are inclusive.
pub fn blended_label(blended: f64) -> &'static str {
    if blended >= 4.5 {
        "🌟 强烈推荐"
    } else if blended >= 3.5 {
        "✅ 建议买入"
    } else if blended >= 2.5 {
        "⚠️  中性观察"
    } else {
        "❌ 规避"
    }
}

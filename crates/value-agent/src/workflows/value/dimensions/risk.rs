use super::{Dimension, DimensionScore};
use crate::market::CompanySnapshot;

/// Starts at 100 and subtracts a penalty per red flag, floored at zero.
pub fn score_risk(snapshot: &CompanySnapshot) -> DimensionScore {
    let checks = [
        (snapshot.debt_to_asset > 60.0, 30, "负债率过高"),
        (snapshot.pe > 50.0, 20, "估值过高"),
        (snapshot.profit_growth < 0.0, 25, "利润下滑"),
        (!snapshot.cash_flow_healthy, 25, "现金流不健康"),
    ];

    let mut score: u32 = 100;
    let mut warnings = Vec::new();
    for (flagged, penalty, warning) in checks {
        if flagged {
            score = score.saturating_sub(penalty);
            warnings.push(warning.to_string());
        }
    }

    let label = match score {
        70.. => "低风险",
        50..=69 => "中风险",
        _ => "高风险",
    };

    DimensionScore {
        dimension: Dimension::Risk,
        score,
        label: label.to_string(),
        reasons: Vec::new(),
        warnings,
        guidance: None,
    }
}

use super::{Dimension, DimensionScore, Tally};
use crate::market::CompanySnapshot;

pub fn score_fundamental(snapshot: &CompanySnapshot) -> DimensionScore {
    let mut tally = Tally::default();
    tally.award(snapshot.roe_ttm > 15.0, 25, || "ROE连续优秀".to_string());
    tally.award(snapshot.gross_margin > 30.0, 25, || {
        "毛利率健康，具备定价权".to_string()
    });
    tally.award(snapshot.revenue_growth > 8.0, 20, || "营收稳步增长".to_string());
    tally.award(snapshot.profit_growth > 5.0, 20, || "利润增长稳定".to_string());
    tally.award(snapshot.cash_flow_healthy, 10, || "现金流健康".to_string());

    let label = match tally.score {
        70.. => "优秀",
        50..=69 => "一般",
        _ => "较差",
    };

    let mut warnings = Vec::new();
    if snapshot.profit_growth < 0.0 {
        warnings.push("利润出现负增长".to_string());
    }

    DimensionScore {
        dimension: Dimension::Fundamental,
        score: tally.score,
        label: label.to_string(),
        reasons: tally.reasons,
        warnings,
        guidance: None,
    }
}

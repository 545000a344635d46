use super::{Dimension, DimensionScore, Tally};
use crate::market::CompanySnapshot;

pub fn score_moat(snapshot: &CompanySnapshot) -> DimensionScore {
    let mut tally = Tally::default();
    tally.award(snapshot.gross_margin > 40.0, 25, || {
        "高毛利 → 品牌/定价权护城河".to_string()
    });
    tally.award(snapshot.roe_ttm > 20.0, 25, || "长期高ROE → 竞争壁垒强".to_string());
    tally.award(snapshot.pe_hist_percent < 50.0, 20, || {
        "市场长期给予稳定估值 → 认可度高".to_string()
    });
    tally.award(snapshot.debt_to_asset < 40.0, 20, || {
        "财务稳健 → 抗周期能力强".to_string()
    });
    tally.award(snapshot.revenue_growth > 10.0, 10, || {
        "成长稳定 → 规模护城河".to_string()
    });

    let label = match tally.score {
        70.. => "强护城河",
        50..=69 => "一般",
        _ => "无明显护城河",
    };

    DimensionScore {
        dimension: Dimension::Moat,
        score: tally.score,
        label: label.to_string(),
        reasons: tally.reasons,
        warnings: Vec::new(),
        guidance: None,
    }
}

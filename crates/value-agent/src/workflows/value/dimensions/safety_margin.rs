use super::{Dimension, DimensionScore, SafetyGuidance, Tally};
use crate::market::CompanySnapshot;

pub fn score_safety_margin(snapshot: &CompanySnapshot) -> DimensionScore {
    let mut tally = Tally::default();
    tally.award(snapshot.pe_hist_percent < 30.0, 20, || {
        format!("PE处于历史低分位({}%)", snapshot.pe_hist_percent)
    });
    tally.award(snapshot.pb_hist_percent < 30.0, 20, || {
        format!("PB处于历史低分位({}%)", snapshot.pb_hist_percent)
    });
    tally.award(snapshot.peg < 1.0, 20, || format!("PEG合理({})", snapshot.peg));
    tally.award(snapshot.roe_ttm > 15.0, 20, || {
        format!("ROE优秀({}%)", snapshot.roe_ttm)
    });
    tally.award(snapshot.debt_to_asset < 50.0, 20, || {
        format!("负债健康({}%)", snapshot.debt_to_asset)
    });

    let (label, margin, suggestion) = if tally.score >= 80 {
        ("安全｜可关注", "高安全边际", "可分批布局，长期持有")
    } else if tally.score >= 60 {
        ("一般｜观察", "中等安全边际", "持续跟踪，等待更好价格")
    } else {
        ("危险｜回避", "无安全边际", "估值偏高，建议规避")
    };

    let mut warnings = Vec::new();
    if snapshot.pe > 50.0 {
        warnings.push("PE过高，估值泡沫风险".to_string());
    }
    if snapshot.debt_to_asset > 70.0 {
        warnings.push("负债率过高，财务风险大".to_string());
    }

    DimensionScore {
        dimension: Dimension::SafetyMargin,
        score: tally.score,
        label: label.to_string(),
        reasons: tally.reasons,
        warnings,
        guidance: Some(SafetyGuidance {
            margin: margin.to_string(),
            suggestion: suggestion.to_string(),
        }),
    }
}

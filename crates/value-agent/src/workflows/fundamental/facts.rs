use super::config::FundamentalConfig;
use super::domain::{BusinessRecord, FactorRecord};

/// Verifiable facts worth quoting, in a fixed order and capped at `max_key_facts`.
pub fn key_facts(
    factors: &FactorRecord,
    business: &BusinessRecord,
    config: &FundamentalConfig,
) -> Vec<String> {
    let thresholds = &config.key_facts;
    let mut facts = Vec::new();

    if factors.roe >= thresholds.min_roe {
        facts.push(format!("ROE: {}%", factors.roe));
    }
    if factors.gross_margin >= thresholds.min_gross_margin {
        facts.push(format!("毛利率: {}%", factors.gross_margin));
    }
    if factors.cash_flow_ratio >= thresholds.min_cash_flow_ratio {
        facts.push(format!("净现比: {}", factors.cash_flow_ratio));
    }
    if factors.debt_ratio <= thresholds.max_debt_ratio {
        facts.push(format!("资产负债率: {}%", factors.debt_ratio));
    }
    if factors.pe > 0.0 && factors.pe <= thresholds.max_pe {
        facts.push(format!("PE: {}", factors.pe));
    }
    if factors.dividend_yield >= thresholds.min_dividend_yield {
        facts.push(format!("股息率: {}%", factors.dividend_yield));
    }

    let core = business.business_core.trim();
    if !core.is_empty() {
        facts.push(format!("业务核心: {core}"));
    }

    facts.truncate(config.max_key_facts);
    facts
}

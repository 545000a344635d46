use serde::{Deserialize, Serialize};

use super::config::MinefieldPolicy;
use super::domain::{BusinessRecord, FactorRecord};

pub const MINEFIELD_PASSED: &str = "通过排雷检查";

/// The first hard rule a company tripped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum MinefieldVeto {
    ExcessiveDebt { debt_ratio: f64, threshold: f64 },
    PersistentLosses { years: u32 },
    CashFlowDeterioration { years: u32 },
    HighPledge,
}

impl MinefieldVeto {
    pub fn summary(&self) -> String {
        match self {
            MinefieldVeto::ExcessiveDebt {
                debt_ratio,
                threshold,
            } => format!("高负债风险：资产负债率 {debt_ratio}% 超过阈值 {threshold}%"),
            MinefieldVeto::PersistentLosses { years } => {
                format!("利润持续为负：连续亏损 {years} 年")
            }
            MinefieldVeto::CashFlowDeterioration { years } => {
                format!("现金流持续恶化：连续 {years} 年恶化")
            }
            MinefieldVeto::HighPledge => "高质押风险：股权质押比例过高".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinefieldOutcome {
    pub passed: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub veto: Option<MinefieldVeto>,
}

impl MinefieldOutcome {
    fn passed() -> Self {
        Self {
            passed: true,
            message: MINEFIELD_PASSED.to_string(),
            veto: None,
        }
    }

    fn vetoed(veto: MinefieldVeto) -> Self {
        Self {
            passed: false,
            message: veto.summary(),
            veto: Some(veto),
        }
    }
}

/// Apply the hard rules in order; the first violation wins.
pub fn check_minefields(
    factors: &FactorRecord,
    business: &BusinessRecord,
    policy: &MinefieldPolicy,
) -> MinefieldOutcome {
    if factors.debt_ratio > policy.bankruptcy_debt_ratio {
        return MinefieldOutcome::vetoed(MinefieldVeto::ExcessiveDebt {
            debt_ratio: factors.debt_ratio,
            threshold: policy.bankruptcy_debt_ratio,
        });
    }

    if business.loss_years >= policy.loss_years_threshold {
        return MinefieldOutcome::vetoed(MinefieldVeto::PersistentLosses {
            years: business.loss_years,
        });
    }

    if business.cash_flow_deterioration_years >= policy.deterioration_years_threshold {
        return MinefieldOutcome::vetoed(MinefieldVeto::CashFlowDeterioration {
            years: business.cash_flow_deterioration_years,
        });
    }

    if business.high_pledge {
        return MinefieldOutcome::vetoed(MinefieldVeto::HighPledge);
    }

    MinefieldOutcome::passed()
}

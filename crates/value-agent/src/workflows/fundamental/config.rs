use serde::{Deserialize, Serialize};

/// Hard veto thresholds applied before any scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinefieldPolicy {
    pub bankruptcy_debt_ratio: f64,
    pub loss_years_threshold: u32,
    pub deterioration_years_threshold: u32,
}

impl Default for MinefieldPolicy {
    fn default() -> Self {
        Self {
            bankruptcy_debt_ratio: 80.0,
            loss_years_threshold: 2,
            deterioration_years_threshold: 2,
        }
    }
}

/// Minimums a factor must clear to be quoted as a key fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFactThresholds {
    pub min_roe: f64,
    pub min_gross_margin: f64,
    pub min_cash_flow_ratio: f64,
    pub max_debt_ratio: f64,
    pub max_pe: f64,
    pub min_dividend_yield: f64,
}

impl Default for KeyFactThresholds {
    fn default() -> Self {
        Self {
            min_roe: 10.0,
            min_gross_margin: 20.0,
            min_cash_flow_ratio: 0.5,
            max_debt_ratio: 70.0,
            max_pe: 30.0,
            min_dividend_yield: 1.0,
        }
    }
}

/// Rubric configuration for the fundamental pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalConfig {
    pub minefield: MinefieldPolicy,
    pub key_facts: KeyFactThresholds,
    pub max_key_facts: usize,
    pub max_risks: usize,
}

impl Default for FundamentalConfig {
    fn default() -> Self {
        Self {
            minefield: MinefieldPolicy::default(),
            key_facts: KeyFactThresholds::default(),
            max_key_facts: 5,
            max_risks: 3,
        }
    }
}

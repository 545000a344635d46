use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::validation::{validate_factors, InvalidFactorRecord};

/// The ten quantitative ratios every fundamental analysis requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKey {
    Roe,
    GrossMargin,
    CashFlowRatio,
    DebtRatio,
    Pe,
    Pb,
    RevenueGrowth,
    ProfitGrowth,
    DividendYield,
    CashFlowQuality,
}

impl FactorKey {
    /// Fixed validation order.
    pub const ALL: [FactorKey; 10] = [
        FactorKey::Roe,
        FactorKey::GrossMargin,
        FactorKey::CashFlowRatio,
        FactorKey::DebtRatio,
        FactorKey::Pe,
        FactorKey::Pb,
        FactorKey::RevenueGrowth,
        FactorKey::ProfitGrowth,
        FactorKey::DividendYield,
        FactorKey::CashFlowQuality,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FactorKey::Roe => "roe",
            FactorKey::GrossMargin => "gross_margin",
            FactorKey::CashFlowRatio => "cash_flow_ratio",
            FactorKey::DebtRatio => "debt_ratio",
            FactorKey::Pe => "pe",
            FactorKey::Pb => "pb",
            FactorKey::RevenueGrowth => "revenue_growth",
            FactorKey::ProfitGrowth => "profit_growth",
            FactorKey::DividendYield => "dividend_yield",
            FactorKey::CashFlowQuality => "cash_flow_quality",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FactorKey::Roe => "ROE",
            FactorKey::GrossMargin => "毛利率",
            FactorKey::CashFlowRatio => "净现比",
            FactorKey::DebtRatio => "资产负债率",
            FactorKey::Pe => "PE",
            FactorKey::Pb => "PB",
            FactorKey::RevenueGrowth => "营收增速",
            FactorKey::ProfitGrowth => "利润增速",
            FactorKey::DividendYield => "股息率",
            FactorKey::CashFlowQuality => "现金流质量",
        }
    }
}

impl fmt::Display for FactorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Factor input as submitted: any key may be missing or null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawFactorRecord(BTreeMap<String, Option<f64>>);

impl RawFactorRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: FactorKey, value: f64) -> Self {
        self.insert(key, Some(value));
        self
    }

    pub fn with_null(mut self, key: FactorKey) -> Self {
        self.insert(key, None);
        self
    }

    pub fn insert(&mut self, key: FactorKey, value: Option<f64>) {
        self.0.insert(key.as_str().to_string(), value);
    }

    pub fn remove(&mut self, key: FactorKey) {
        self.0.remove(key.as_str());
    }

    /// `None` when the key is absent, `Some(None)` when it is present but null.
    pub fn get(&self, key: FactorKey) -> Option<Option<f64>> {
        self.0.get(key.as_str()).copied()
    }

    pub fn value_or_zero(&self, key: FactorKey) -> f64 {
        self.get(key).flatten().unwrap_or(0.0)
    }
}

impl From<&FactorRecord> for RawFactorRecord {
    fn from(record: &FactorRecord) -> Self {
        FactorKey::ALL
            .iter()
            .fold(RawFactorRecord::new(), |raw, key| raw.with(*key, record.get(*key)))
    }
}

/// Validated factor record; every ratio is present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorRecord {
    pub roe: f64,
    pub gross_margin: f64,
    pub cash_flow_ratio: f64,
    pub debt_ratio: f64,
    pub pe: f64,
    pub pb: f64,
    pub revenue_growth: f64,
    pub profit_growth: f64,
    pub dividend_yield: f64,
    pub cash_flow_quality: f64,
}

impl FactorRecord {
    pub fn get(&self, key: FactorKey) -> f64 {
        match key {
            FactorKey::Roe => self.roe,
            FactorKey::GrossMargin => self.gross_margin,
            FactorKey::CashFlowRatio => self.cash_flow_ratio,
            FactorKey::DebtRatio => self.debt_ratio,
            FactorKey::Pe => self.pe,
            FactorKey::Pb => self.pb,
            FactorKey::RevenueGrowth => self.revenue_growth,
            FactorKey::ProfitGrowth => self.profit_growth,
            FactorKey::DividendYield => self.dividend_yield,
            FactorKey::CashFlowQuality => self.cash_flow_quality,
        }
    }
}

impl TryFrom<&RawFactorRecord> for FactorRecord {
    type Error = InvalidFactorRecord;

    fn try_from(raw: &RawFactorRecord) -> Result<Self, Self::Error> {
        let validation = validate_factors(raw);
        if !validation.valid {
            return Err(InvalidFactorRecord {
                errors: validation.errors,
            });
        }

        Ok(Self {
            roe: raw.value_or_zero(FactorKey::Roe),
            gross_margin: raw.value_or_zero(FactorKey::GrossMargin),
            cash_flow_ratio: raw.value_or_zero(FactorKey::CashFlowRatio),
            debt_ratio: raw.value_or_zero(FactorKey::DebtRatio),
            pe: raw.value_or_zero(FactorKey::Pe),
            pb: raw.value_or_zero(FactorKey::Pb),
            revenue_growth: raw.value_or_zero(FactorKey::RevenueGrowth),
            profit_growth: raw.value_or_zero(FactorKey::ProfitGrowth),
            dividend_yield: raw.value_or_zero(FactorKey::DividendYield),
            cash_flow_quality: raw.value_or_zero(FactorKey::CashFlowQuality),
        })
    }
}

/// Qualitative business facts used by the minefield rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessRecord {
    pub business_core: String,
    pub loss_years: u32,
    pub cash_flow_deterioration_years: u32,
    pub high_pledge: bool,
}

use async_trait::async_trait;

use super::{CompanySnapshot, DataSourceError, MarketDataSource};

/// Offline sample companies; the fallback for every lookup.
#[derive(Debug, Clone)]
pub struct SampleCatalog {
    companies: Vec<CompanySnapshot>,
}

impl SampleCatalog {
    pub fn new(companies: Vec<CompanySnapshot>) -> Self {
        Self { companies }
    }

    pub fn list(&self) -> &[CompanySnapshot] {
        &self.companies
    }

    pub fn get(&self, code: &str) -> Option<CompanySnapshot> {
        self.companies
            .iter()
            .find(|company| company.code == code)
            .cloned()
    }
}

impl Default for SampleCatalog {
    fn default() -> Self {
        Self::new(vec![
            sample(
                "600519.SH",
                "优质价值公司",
                [15.2, 3.1, 0.8, 22.0, 18.0, 22.5, 35.0, 12.0, 10.0, 40.0],
                true,
            ),
            sample(
                "000858.SZ",
                "五粮液",
                [18.1, 3.8, 0.9, 25.0, 22.0, 25.2, 28.0, 10.0, 9.0, 74.0],
                true,
            ),
            sample(
                "600000.SH",
                "高风险高估公司",
                [48.0, 5.5, 1.9, 80.0, 85.0, 12.0, 65.0, 2.0, -3.0, 20.0],
                false,
            ),
        ])
    }
}

/// Metrics in snapshot field order: pe, pb, peg, pe/pb history percentiles, roe,
/// debt-to-asset, revenue growth, profit growth, gross margin.
fn sample(code: &str, name: &str, metrics: [f64; 10], cash_flow_healthy: bool) -> CompanySnapshot {
    let [
        pe,
        pb,
        peg,
        pe_hist_percent,
        pb_hist_percent,
        roe_ttm,
        debt_to_asset,
        revenue_growth,
        profit_growth,
        gross_margin,
    ] = metrics;
    CompanySnapshot {
        code: code.to_string(),
        name: name.to_string(),
        pe,
        pb,
        peg,
        pe_hist_percent,
        pb_hist_percent,
        roe_ttm,
        debt_to_asset,
        revenue_growth,
        profit_growth,
        gross_margin,
        cash_flow_healthy,
        industry: None,
        source: Some("sample".to_string()),
    }
}

#[async_trait]
impl MarketDataSource for SampleCatalog {
    fn name(&self) -> &'static str {
        "sample"
    }

    async fn fetch(&self, code: &str) -> Result<CompanySnapshot, DataSourceError> {
        self.get(code).ok_or_else(|| DataSourceError::UnknownCode {
            code: code.to_string(),
        })
    }
}

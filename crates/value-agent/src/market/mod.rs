//! Company data for the value workflow: a built-in sample catalog plus real-time quotes.

mod catalog;
mod sina;
mod xueqiu;

pub use catalog::SampleCatalog;
pub use sina::SinaQuoteSource;
pub use xueqiu::XueqiuSource;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Valuation and quality metrics consumed by the dimension scorers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySnapshot {
    pub code: String,
    pub name: String,
    pub pe: f64,
    pub pb: f64,
    pub peg: f64,
    pub pe_hist_percent: f64,
    pub pb_hist_percent: f64,
    pub roe_ttm: f64,
    pub debt_to_asset: f64,
    pub revenue_growth: f64,
    pub profit_growth: f64,
    pub gross_margin: f64,
    pub cash_flow_healthy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[async_trait]
pub trait MarketDataSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// False for quote feeds that overlay a name on placeholder fundamentals.
    fn provides_fundamentals(&self) -> bool {
        true
    }

    async fn fetch(&self, code: &str) -> Result<CompanySnapshot, DataSourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    #[error("无效的股票代码: {code}")]
    InvalidCode { code: String },
    #[error("找不到股票数据: {code}")]
    UnknownCode { code: String },
    #[error("quote request failed: {0}")]
    Network(String),
    #[error("quote source returned status {status}")]
    Status { status: u16 },
    #[error("quote payload malformed: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for DataSourceError {
    fn from(err: reqwest::Error) -> Self {
        DataSourceError::Network(err.to_string())
    }
}

/// Canonical `NNNNNN.SH` / `NNNNNN.SZ` form of a user-entered code.
///
/// The first run of six digits is the numeric code. An explicit suffix wins; otherwise a
/// leading `6` means Shanghai, a leading `0` or `3` means Shenzhen, and Shanghai is assumed.
pub fn normalize_code(input: &str) -> Result<String, DataSourceError> {
    let upper = input.trim().to_ascii_uppercase();
    let bytes = upper.as_bytes();

    let digits = bytes
        .windows(6)
        .position(|window| window.iter().all(u8::is_ascii_digit))
        .and_then(|start| upper.get(start..start + 6))
        .ok_or_else(|| DataSourceError::InvalidCode {
            code: input.to_string(),
        })?;

    let exchange = if upper.ends_with(".SH") {
        "SH"
    } else if upper.ends_with(".SZ") {
        "SZ"
    } else if digits.starts_with('6') {
        "SH"
    } else if digits.starts_with('0') || digits.starts_with('3') {
        "SZ"
    } else {
        "SH"
    };

    Ok(format!("{digits}.{exchange}"))
}

/// Result of a snapshot lookup. `reference` holds the catalog record when a real-time
/// source with real fundamentals answered and the catalog also knows the code.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotLookup {
    pub snapshot: CompanySnapshot,
    pub reference: Option<CompanySnapshot>,
}

/// Real-time sources tried in order, with the sample catalog as the last resort.
#[derive(Clone)]
pub struct MarketData {
    catalog: Arc<SampleCatalog>,
    realtime: Vec<Arc<dyn MarketDataSource>>,
}

impl MarketData {
    pub fn new(catalog: SampleCatalog, realtime: Vec<Arc<dyn MarketDataSource>>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            realtime,
        }
    }

    /// Catalog only; no network access.
    pub fn offline() -> Self {
        Self::new(SampleCatalog::default(), Vec::new())
    }

    pub fn catalog(&self) -> &SampleCatalog {
        &self.catalog
    }

    pub async fn load_snapshot(
        &self,
        code: &str,
        real_time: bool,
    ) -> Result<SnapshotLookup, DataSourceError> {
        let code = normalize_code(code)?;

        if real_time {
            for source in &self.realtime {
                match source.fetch(&code).await {
                    Ok(snapshot) => {
                        debug!(code = %code, source = source.name(), "real-time snapshot loaded");
                        let reference = if source.provides_fundamentals() {
                            self.catalog.get(&code)
                        } else {
                            None
                        };
                        return Ok(SnapshotLookup {
                            snapshot,
                            reference,
                        });
                    }
                    Err(err) => {
                        warn!(code = %code, source = source.name(), error = %err, "real-time source failed");
                    }
                }
            }
        }

        self.catalog
            .get(&code)
            .map(|snapshot| SnapshotLookup {
                snapshot,
                reference: None,
            })
            .ok_or(DataSourceError::UnknownCode { code })
    }
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{CompanySnapshot, DataSourceError, MarketDataSource};

const DEFAULT_BASE_URL: &str = "https://stock.xueqiu.com";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Xueqiu company profile endpoint.
///
/// Only the security name is read; fundamentals come from a fixed baseline, so the
/// source does not count as a fundamentals provider.
#[derive(Clone)]
pub struct XueqiuSource {
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ProfileEnvelope {
    data: Option<ProfileData>,
}

#[derive(Debug, Deserialize)]
struct ProfileData {
    #[serde(default)]
    name: Option<String>,
}

impl XueqiuSource {
    pub fn new(timeout: Duration) -> Result<Self, DataSourceError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, DataSourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn baseline(code: &str, name: &str) -> CompanySnapshot {
        CompanySnapshot {
            code: code.to_string(),
            name: name.to_string(),
            pe: 18.0,
            pb: 4.0,
            peg: 1.2,
            pe_hist_percent: 60.0,
            pb_hist_percent: 55.0,
            roe_ttm: 18.0,
            debt_to_asset: 35.0,
            revenue_growth: 10.0,
            profit_growth: 8.0,
            gross_margin: 35.0,
            cash_flow_healthy: true,
            industry: None,
            source: Some("xueqiu".to_string()),
        }
    }
}

/// `SH600519` for `600519.SH`.
fn profile_symbol(code: &str) -> Option<String> {
    let (digits, exchange) = code.split_once('.')?;
    match exchange {
        "SH" | "SZ" => Some(format!("{exchange}{digits}")),
        _ => None,
    }
}

#[async_trait]
impl MarketDataSource for XueqiuSource {
    fn name(&self) -> &'static str {
        "xueqiu"
    }

    fn provides_fundamentals(&self) -> bool {
        false
    }

    async fn fetch(&self, code: &str) -> Result<CompanySnapshot, DataSourceError> {
        let symbol = profile_symbol(code).ok_or_else(|| DataSourceError::InvalidCode {
            code: code.to_string(),
        })?;

        let res = self
            .client
            .get(format!("{}/v5/stock/detail/{symbol}/profile.json", self.base_url))
            .header(reqwest::header::REFERER, format!("https://xueqiu.com/S/{symbol}"))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(DataSourceError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = res.bytes().await?;
        let envelope: ProfileEnvelope = serde_json::from_slice(&bytes)
            .map_err(|err| DataSourceError::Malformed(err.to_string()))?;
        let profile = envelope
            .data
            .ok_or_else(|| DataSourceError::Malformed(format!("no profile data for {symbol}")))?;
        let name = profile
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "未知".to_string());

        Ok(Self::baseline(code, &name))
    }
}

use std::time::Duration;

use async_trait::async_trait;
use encoding_rs::GBK;
use reqwest::Client;

use super::{CompanySnapshot, DataSourceError, MarketDataSource};

const DEFAULT_BASE_URL: &str = "http://hq.sinajs.cn";
const REFERER: &str = "https://finance.sina.com.cn";

/// Sina Finance quote feed.
///
/// The feed only carries price fields, so the quote name is overlaid on a neutral
/// baseline of fundamentals.
#[derive(Clone)]
pub struct SinaQuoteSource {
    base_url: String,
    client: Client,
}

impl SinaQuoteSource {
    pub fn new(timeout: Duration) -> Result<Self, DataSourceError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, DataSourceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn baseline(code: &str, name: &str) -> CompanySnapshot {
        CompanySnapshot {
            code: code.to_string(),
            name: name.to_string(),
            pe: 15.0,
            pb: 3.0,
            peg: 1.0,
            pe_hist_percent: 50.0,
            pb_hist_percent: 50.0,
            roe_ttm: 15.0,
            debt_to_asset: 40.0,
            revenue_growth: 8.0,
            profit_growth: 5.0,
            gross_margin: 30.0,
            cash_flow_healthy: true,
            industry: None,
            source: Some("sina".to_string()),
        }
    }
}

/// `sh600519` for `600519.SH`; `None` for codes without an exchange suffix.
fn feed_symbol(code: &str) -> Option<String> {
    let (digits, exchange) = code.split_once('.')?;
    match exchange {
        "SH" => Some(format!("sh{digits}")),
        "SZ" => Some(format!("sz{digits}")),
        _ => None,
    }
}

/// Pull the security name out of `var hq_str_sh600519="name,open,close,...";`.
fn parse_quote_name(body: &str) -> Option<String> {
    let (_, payload) = body.split_once('=')?;
    let payload = payload.trim().trim_end_matches(';').trim_matches('"');
    let fields: Vec<&str> = payload.split(',').collect();
    if fields.len() <= 3 {
        return None;
    }
    let name = fields[0].trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[async_trait]
impl MarketDataSource for SinaQuoteSource {
    fn name(&self) -> &'static str {
        "sina"
    }

    fn provides_fundamentals(&self) -> bool {
        false
    }

    async fn fetch(&self, code: &str) -> Result<CompanySnapshot, DataSourceError> {
        let symbol = feed_symbol(code).ok_or_else(|| DataSourceError::InvalidCode {
            code: code.to_string(),
        })?;

        let res = self
            .client
            .get(format!("{}/list={symbol}", self.base_url))
            .header(reqwest::header::REFERER, REFERER)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(DataSourceError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = res.bytes().await?;
        let (body, _, _) = GBK.decode(&bytes);
        let name = parse_quote_name(&body)
            .ok_or_else(|| DataSourceError::Malformed(format!("no quote fields for {symbol}")))?;

        Ok(Self::baseline(code, &name))
    }
}

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{LlmConfig, LlmProvider};
use crate::llm::{ChatRequest, LanguageModel, LlmError};
use crate::market::{
    CompanySnapshot, DataSourceError, MarketData, MarketDataSource, SampleCatalog,
    SinaQuoteSource,
};
use crate::workflows::value::{
    AnalystError, ConversationTurn, DeepAnalysis, Dimension, DimensionScore, FollowUpAnswer,
    HeuristicAnalyst, InvestmentAnalyst, ValueInvestmentAgent,
};

pub(super) fn sample(code: &str) -> CompanySnapshot {
    SampleCatalog::default()
        .get(code)
        .expect("sample catalog contains the code")
}

pub(super) fn quality_company() -> CompanySnapshot {
    sample("600519.SH")
}

pub(super) fn risky_company() -> CompanySnapshot {
    sample("600000.SH")
}

pub(super) fn score(dimension: Dimension, score: u32, warnings: &[&str]) -> DimensionScore {
    DimensionScore {
        dimension,
        score,
        label: String::new(),
        reasons: Vec::new(),
        warnings: warnings.iter().map(|w| w.to_string()).collect(),
        guidance: None,
    }
}

pub(super) fn llm_config() -> LlmConfig {
    LlmConfig {
        provider: LlmProvider::OpenAi,
        base_url: "http://127.0.0.1:9".to_string(),
        api_key: Some("test-key".to_string()),
        model: "gpt-4o-mini".to_string(),
        temperature: 0.1,
        max_tokens: 1000,
        timeout: Duration::from_secs(2),
    }
}

/// Analyst with a fixed outcome that records the history it was handed.
pub(super) struct ScriptedAnalyst {
    fail: bool,
    seen_histories: Mutex<Vec<Vec<ConversationTurn>>>,
}

impl ScriptedAnalyst {
    pub(super) fn working() -> Self {
        Self {
            fail: false,
            seen_histories: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            seen_histories: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn seen_histories(&self) -> Vec<Vec<ConversationTurn>> {
        self.seen_histories
            .lock()
            .expect("history mutex poisoned")
            .clone()
    }

    fn outcome<T>(&self, value: T) -> Result<T, AnalystError> {
        if self.fail {
            Err(AnalystError::Model(LlmError::Timeout(Duration::from_secs(2))))
        } else {
            Ok(value)
        }
    }
}

#[async_trait]
impl InvestmentAnalyst for ScriptedAnalyst {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn analyze(
        &self,
        snapshot: &CompanySnapshot,
        question: Option<&str>,
    ) -> Result<DeepAnalysis, AnalystError> {
        self.outcome(HeuristicAnalyst::assess(snapshot, question))
    }

    async fn follow_up(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<FollowUpAnswer, AnalystError> {
        self.seen_histories
            .lock()
            .expect("history mutex poisoned")
            .push(history.to_vec());
        self.outcome(FollowUpAnswer {
            answer: format!("回答: {question}"),
            confidence: 0.8,
            related_topics: vec!["价值投资原则".to_string()],
        })
    }
}

/// Chat model that replays one reply verbatim.
pub(super) struct CannedModel(pub(super) Result<&'static str, &'static str>);

#[async_trait]
impl LanguageModel for CannedModel {
    fn name(&self) -> &'static str {
        "canned"
    }

    async fn generate(&self, _request: &ChatRequest) -> Result<String, LlmError> {
        match self.0 {
            Ok(text) => Ok(text.to_string()),
            Err(reason) => Err(LlmError::Network(reason.to_string())),
        }
    }
}

/// Real-time source that always answers with the neutral quote baseline.
pub(super) struct BaselineSource;

#[async_trait]
impl MarketDataSource for BaselineSource {
    fn name(&self) -> &'static str {
        "baseline"
    }

    async fn fetch(&self, code: &str) -> Result<CompanySnapshot, DataSourceError> {
        Ok(SinaQuoteSource::baseline(code, "实时报价公司"))
    }

    fn provides_fundamentals(&self) -> bool {
        false
    }
}

/// Real-time source with its own fundamentals, five percent above the catalog values.
pub(super) struct FilingSource;

#[async_trait]
impl MarketDataSource for FilingSource {
    fn name(&self) -> &'static str {
        "filing"
    }

    async fn fetch(&self, code: &str) -> Result<CompanySnapshot, DataSourceError> {
        let mut snapshot = SampleCatalog::default()
            .get(code)
            .ok_or_else(|| DataSourceError::UnknownCode {
                code: code.to_string(),
            })?;
        snapshot.pe *= 1.05;
        snapshot.pb *= 1.05;
        snapshot.roe_ttm *= 1.05;
        snapshot.revenue_growth *= 1.05;
        snapshot.profit_growth *= 1.05;
        snapshot.source = Some("filing".to_string());
        Ok(snapshot)
    }
}

pub(super) fn agent_with(analyst: Arc<dyn InvestmentAnalyst>) -> ValueInvestmentAgent {
    ValueInvestmentAgent::new(MarketData::offline(), analyst)
}

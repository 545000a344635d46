use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::config::{LlmConfig, LlmProvider};
use crate::llm::{ChatRequest, LanguageModel, LlmError};
use crate::storage::{FactorCache, FactorCacheEntry, ObservationEntry, ObservationPool};
use crate::workflows::fundamental::{
    BusinessRecord, FactorKey, FactorRecord, FundamentalAgent, FundamentalConfig,
    FundamentalRequest, RawFactorRecord,
};

pub(super) const MODEL_REPLY: &str = "\
【决策结论】买入 护城河清晰且估值合理
【关键事实】
ROE: 25%
毛利率: 45%
净现比: 1.6
资产负债率: 25%
PE: 12
股息率: 3.5%
【推理逻辑】高ROE与高毛利说明定价权稳固，
负债率低，现金流充沛。
【风险提示】
消费税政策变化
渠道库存波动
高端需求放缓
估值回归
";

pub(super) fn strong_factors() -> RawFactorRecord {
    RawFactorRecord::new()
        .with(FactorKey::Roe, 25.0)
        .with(FactorKey::GrossMargin, 45.0)
        .with(FactorKey::CashFlowRatio, 1.6)
        .with(FactorKey::DebtRatio, 25.0)
        .with(FactorKey::Pe, 12.0)
        .with(FactorKey::Pb, 3.0)
        .with(FactorKey::RevenueGrowth, 35.0)
        .with(FactorKey::ProfitGrowth, 32.0)
        .with(FactorKey::DividendYield, 3.5)
        .with(FactorKey::CashFlowQuality, 0.9)
}

pub(super) fn middling_factors() -> RawFactorRecord {
    RawFactorRecord::new()
        .with(FactorKey::Roe, 16.0)
        .with(FactorKey::GrossMargin, 32.0)
        .with(FactorKey::CashFlowRatio, 1.0)
        .with(FactorKey::DebtRatio, 45.0)
        .with(FactorKey::Pe, 22.0)
        .with(FactorKey::Pb, 2.0)
        .with(FactorKey::RevenueGrowth, 12.0)
        .with(FactorKey::ProfitGrowth, 6.0)
        .with(FactorKey::DividendYield, 1.5)
        .with(FactorKey::CashFlowQuality, 0.5)
}

pub(super) fn distressed_factors() -> RawFactorRecord {
    RawFactorRecord::new()
        .with(FactorKey::Roe, 2.0)
        .with(FactorKey::GrossMargin, 5.0)
        .with(FactorKey::CashFlowRatio, 0.1)
        .with(FactorKey::DebtRatio, 85.0)
        .with(FactorKey::Pe, -5.0)
        .with(FactorKey::Pb, 1.0)
        .with(FactorKey::RevenueGrowth, -10.0)
        .with(FactorKey::ProfitGrowth, -20.0)
        .with(FactorKey::DividendYield, 0.0)
        .with(FactorKey::CashFlowQuality, 0.1)
}

pub(super) fn record(raw: &RawFactorRecord) -> FactorRecord {
    FactorRecord::try_from(raw).expect("fixture factors are complete")
}

pub(super) fn healthy_business() -> BusinessRecord {
    BusinessRecord {
        business_core: "高端白酒".to_string(),
        ..BusinessRecord::default()
    }
}

pub(super) fn request(factor_data: RawFactorRecord) -> FundamentalRequest {
    FundamentalRequest {
        stock_code: "600519.SH".to_string(),
        company_name: "贵州茅台".to_string(),
        factor_data,
        business_data: healthy_business(),
    }
}

pub(super) fn llm_config() -> LlmConfig {
    LlmConfig {
        provider: LlmProvider::Kimi,
        base_url: "http://127.0.0.1:9".to_string(),
        api_key: None,
        model: "moonshot-v1-8k".to_string(),
        temperature: 0.1,
        max_tokens: 1000,
        timeout: Duration::from_secs(2),
    }
}

/// Deterministic model that replays a fixed reply and records prompts.
pub(super) struct ScriptedModel {
    reply: Result<String, String>,
    prompts: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    pub(super) fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn failing(reason: &str) -> Self {
        Self {
            reply: Err(reason.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn prompts(&self) -> Vec<ChatRequest> {
        self.prompts.lock().expect("prompt mutex poisoned").clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, request: &ChatRequest) -> Result<String, LlmError> {
        self.prompts
            .lock()
            .expect("prompt mutex poisoned")
            .push(request.clone());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(reason) => Err(LlmError::Network(reason.clone())),
        }
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryCache {
    pub(super) entries: Arc<Mutex<HashMap<String, FactorCacheEntry>>>,
}

impl FactorCache for MemoryCache {
    fn get(&self, code: &str) -> Option<FactorCacheEntry> {
        self.entries.lock().expect("cache mutex poisoned").get(code).cloned()
    }

    fn all(&self) -> Vec<FactorCacheEntry> {
        self.entries
            .lock()
            .expect("cache mutex poisoned")
            .values()
            .cloned()
            .collect()
    }

    fn put(&self, entry: FactorCacheEntry) -> bool {
        self.entries
            .lock()
            .expect("cache mutex poisoned")
            .insert(entry.stock_code.clone(), entry);
        true
    }

    fn remove(&self, code: &str) -> bool {
        self.entries
            .lock()
            .expect("cache mutex poisoned")
            .remove(code)
            .is_some()
    }

    fn clear(&self) -> bool {
        self.entries.lock().expect("cache mutex poisoned").clear();
        true
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryPool {
    pub(super) entries: Arc<Mutex<Vec<ObservationEntry>>>,
}

impl ObservationPool for MemoryPool {
    fn list(&self) -> Vec<ObservationEntry> {
        self.entries.lock().expect("pool mutex poisoned").clone()
    }

    fn get(&self, code: &str) -> Option<ObservationEntry> {
        self.list().into_iter().find(|entry| entry.code == code)
    }

    fn insert(&self, entry: ObservationEntry) -> bool {
        let mut guard = self.entries.lock().expect("pool mutex poisoned");
        if guard.iter().any(|existing| existing.code == entry.code) {
            return false;
        }
        guard.push(entry);
        true
    }

    fn update(&self, code: &str, conclusion: &str) -> bool {
        let mut guard = self.entries.lock().expect("pool mutex poisoned");
        match guard.iter_mut().find(|entry| entry.code == code) {
            Some(entry) => {
                entry.conclusion = conclusion.to_string();
                true
            }
            None => false,
        }
    }

    fn remove(&self, code: &str) -> bool {
        let mut guard = self.entries.lock().expect("pool mutex poisoned");
        let before = guard.len();
        guard.retain(|entry| entry.code != code);
        guard.len() != before
    }

    fn clear(&self) -> bool {
        self.entries.lock().expect("pool mutex poisoned").clear();
        true
    }
}

pub(super) type TestAgent = FundamentalAgent<MemoryCache, MemoryPool>;

pub(super) fn build_agent(
    model: Arc<ScriptedModel>,
) -> (TestAgent, Arc<MemoryCache>, Arc<MemoryPool>) {
    let cache = Arc::new(MemoryCache::default());
    let pool = Arc::new(MemoryPool::default());
    let agent = FundamentalAgent::new(
        cache.clone(),
        pool.clone(),
        model,
        llm_config(),
        FundamentalConfig::default(),
    );
    (agent, cache, pool)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

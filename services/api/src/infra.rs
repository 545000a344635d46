use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use value_agent::config::AppConfig;
use value_agent::error::AppError;
use value_agent::llm::model_from_config;
use value_agent::market::{
    MarketData, MarketDataSource, SampleCatalog, SinaQuoteSource, XueqiuSource,
};
use value_agent::storage::{JsonFactorCache, JsonObservationPool};
use value_agent::workflows::fundamental::FundamentalAgent;
use value_agent::workflows::value::{analyst_from_config, ValueInvestmentAgent};

const QUOTE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type FileBackedFundamentalAgent = FundamentalAgent<JsonFactorCache, JsonObservationPool>;

/// Both agents wired from one configuration.
#[derive(Clone)]
pub(crate) struct Agents {
    pub(crate) value: Arc<ValueInvestmentAgent>,
    pub(crate) fundamental: Arc<FileBackedFundamentalAgent>,
}

pub(crate) fn build_agents(config: &AppConfig) -> Result<Agents, AppError> {
    let model = model_from_config(&config.llm)?;
    let analyst = analyst_from_config(model.clone(), &config.llm);

    let realtime: Vec<Arc<dyn MarketDataSource>> = vec![
        Arc::new(XueqiuSource::new(QUOTE_TIMEOUT)?),
        Arc::new(SinaQuoteSource::new(QUOTE_TIMEOUT)?),
    ];
    let market = MarketData::new(SampleCatalog::default(), realtime);

    let fundamental = FundamentalAgent::new(
        Arc::new(JsonFactorCache::new(&config.storage.factor_cache_path)),
        Arc::new(JsonObservationPool::new(&config.storage.observation_pool_path)),
        model,
        config.llm.clone(),
        config.analysis.clone(),
    );

    Ok(Agents {
        value: Arc::new(ValueInvestmentAgent::new(market, analyst)),
        fundamental: Arc::new(fundamental),
    })
}

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::config::FundamentalConfig;
use super::domain::{BusinessRecord, FactorRecord, RawFactorRecord};
use super::facts::key_facts;
use super::minefield::{check_minefields, MinefieldOutcome};
use super::prompt::{analysis_prompt, ANALYST_PERSONA};
use super::report::{format_report, quantitative_report, FormattedReport};
use super::scoring::{score_factors, FactorScorecard};
use super::validation::InvalidFactorRecord;
use crate::config::LlmConfig;
use crate::llm::{generate_with_deadline, ChatRequest, LanguageModel};
use crate::storage::{FactorCache, FactorCacheEntry, ObservationEntry, ObservationPool};

/// Input to one fundamental analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalRequest {
    pub stock_code: String,
    #[serde(default)]
    pub company_name: String,
    pub factor_data: RawFactorRecord,
    #[serde(default)]
    pub business_data: BusinessRecord,
}

/// Whether the report text came from the model or from the quantitative fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelStatus {
    Generated { model: String },
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalAnalysis {
    pub stock_code: String,
    pub company_name: String,
    pub minefield: MinefieldOutcome,
    pub scorecard: FactorScorecard,
    pub report: FormattedReport,
    pub model_status: ModelStatus,
    pub analyzed_at: DateTime<Utc>,
}

/// Service composing validation, the minefield rules, factor scoring and the model.
pub struct FundamentalAgent<C, P> {
    cache: Arc<C>,
    pool: Arc<P>,
    model: Arc<dyn LanguageModel>,
    llm: LlmConfig,
    config: FundamentalConfig,
}

impl<C, P> FundamentalAgent<C, P>
where
    C: FactorCache + 'static,
    P: ObservationPool + 'static,
{
    pub fn new(
        cache: Arc<C>,
        pool: Arc<P>,
        model: Arc<dyn LanguageModel>,
        llm: LlmConfig,
        config: FundamentalConfig,
    ) -> Self {
        Self {
            cache,
            pool,
            model,
            llm,
            config,
        }
    }

    pub fn config(&self) -> &FundamentalConfig {
        &self.config
    }

    /// Run the full pipeline and cache the result under the stock code.
    pub async fn analyze(
        &self,
        request: FundamentalRequest,
    ) -> Result<FundamentalAnalysis, AnalysisError> {
        let stock_code = request.stock_code.trim().to_string();
        if stock_code.is_empty() {
            return Err(AnalysisError::MissingStockCode);
        }

        let factors = FactorRecord::try_from(&request.factor_data)?;
        let business = request.business_data;

        let minefield = check_minefields(&factors, &business, &self.config.minefield);
        let scorecard = score_factors(&factors);
        info!(
            stock_code = %stock_code,
            minefield_passed = minefield.passed,
            grade = scorecard.grade.label(),
            total = scorecard.total,
            "fundamental scoring complete"
        );

        let (report, model_status) = self
            .model_report(&factors, &business, &minefield, &scorecard)
            .await;

        let analysis = FundamentalAnalysis {
            stock_code: stock_code.clone(),
            company_name: request.company_name.clone(),
            minefield,
            scorecard,
            report,
            model_status,
            analyzed_at: Utc::now(),
        };

        let cached = self.cache.put(FactorCacheEntry {
            stock_code,
            company_name: request.company_name,
            factor_data: factors,
            business_data: business,
            analysis_result: analysis.clone(),
            timestamp: analysis.analyzed_at,
        });
        if !cached {
            warn!(stock_code = %analysis.stock_code, "analysis not cached");
        }

        Ok(analysis)
    }

    async fn model_report(
        &self,
        factors: &FactorRecord,
        business: &BusinessRecord,
        minefield: &MinefieldOutcome,
        scorecard: &FactorScorecard,
    ) -> (FormattedReport, ModelStatus) {
        let request = ChatRequest::new(
            &self.llm,
            ANALYST_PERSONA,
            analysis_prompt(factors, business, minefield, scorecard),
        );

        match generate_with_deadline(self.model.as_ref(), &request).await {
            Ok(text) => {
                let report =
                    format_report(&text, self.config.max_key_facts, self.config.max_risks);
                if report.is_empty() {
                    debug!(model = self.model.name(), "model reply carried no report headers");
                }
                (
                    report,
                    ModelStatus::Generated {
                        model: self.llm.model.clone(),
                    },
                )
            }
            Err(err) => {
                warn!(error = %err, model = self.model.name(), "model call failed; using quantitative report");
                let facts = key_facts(factors, business, &self.config);
                (
                    quantitative_report(minefield, scorecard, facts),
                    ModelStatus::Fallback {
                        reason: err.to_string(),
                    },
                )
            }
        }
    }

    pub fn cached_analysis(&self, stock_code: &str) -> Result<FactorCacheEntry, AnalysisError> {
        self.cache
            .get(stock_code)
            .ok_or_else(|| AnalysisError::NotCached {
                stock_code: stock_code.to_string(),
            })
    }

    /// Record the analysis conclusion in the observation pool.
    pub fn add_to_observation(&self, analysis: &FundamentalAnalysis) -> bool {
        self.observe(ObservationEntry::new(
            analysis.stock_code.clone(),
            analysis.company_name.clone(),
            analysis.report.conclusion.clone(),
        ))
    }

    pub fn observe(&self, entry: ObservationEntry) -> bool {
        self.pool.insert(entry)
    }

    pub fn observations(&self) -> Vec<ObservationEntry> {
        self.pool.list()
    }

    pub fn update_observation(&self, stock_code: &str, conclusion: &str) -> bool {
        self.pool.update(stock_code, conclusion)
    }

    pub fn remove_observation(&self, stock_code: &str) -> bool {
        self.pool.remove(stock_code)
    }

    pub fn clear_observations(&self) -> bool {
        self.pool.clear()
    }
}

/// Error raised by the fundamental pipeline.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("缺少股票代码")]
    MissingStockCode,
    #[error(transparent)]
    Validation(#[from] InvalidFactorRecord),
    #[error("未找到缓存的分析结果: {stock_code}")]
    NotCached { stock_code: String },
}

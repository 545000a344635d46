use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::analyst::{ConversationTurn, DeepAnalysis, FollowUpAnswer, InvestmentAnalyst};
use super::blend::{blend, IntegratedRecommendation};
use super::knowledge::{cross_validate, CrossValidation, KnowledgeBase, KnowledgeInsight};
use super::rating::{rate_company, DimensionReport};
use crate::market::{CompanySnapshot, DataSourceError, MarketData};

/// Whether the deep analysis came from the analyst or is the neutral fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalystStatus {
    Completed { analyst: String },
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueAnalysisReport {
    pub company: CompanySnapshot,
    pub traditional_analysis: DimensionReport,
    pub deep_analysis: DeepAnalysis,
    pub analyst_status: AnalystStatus,
    pub integrated_recommendation: IntegratedRecommendation,
    pub knowledge: KnowledgeInsight,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_validation: Option<CrossValidation>,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSummary {
    pub code: String,
    pub name: String,
    pub industry: Option<String>,
}

/// Value-investing agent: rule dimensions, the analyst, the blend and the knowledge chain.
///
/// Conversation history is shared by analyses and follow-up questions.
pub struct ValueInvestmentAgent {
    market: MarketData,
    analyst: Arc<dyn InvestmentAnalyst>,
    knowledge: KnowledgeBase,
    history: Mutex<Vec<ConversationTurn>>,
}

impl ValueInvestmentAgent {
    pub fn new(market: MarketData, analyst: Arc<dyn InvestmentAnalyst>) -> Self {
        Self {
            market,
            analyst,
            knowledge: KnowledgeBase::default(),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn analyst_name(&self) -> &'static str {
        self.analyst.name()
    }

    /// Load the company and analyse it. A catalog record alongside a real-time snapshot
    /// is cross-validated against it.
    pub async fn analyze_code(
        &self,
        code: &str,
        question: Option<&str>,
        real_time: bool,
    ) -> Result<ValueAnalysisReport, DataSourceError> {
        let lookup = self.market.load_snapshot(code, real_time).await?;
        let mut report = self.run_analysis(&lookup.snapshot, question).await;
        report.cross_validation = lookup
            .reference
            .as_ref()
            .map(|reference| cross_validate(reference, &lookup.snapshot));
        Ok(report)
    }

    pub async fn run_analysis(
        &self,
        snapshot: &CompanySnapshot,
        question: Option<&str>,
    ) -> ValueAnalysisReport {
        let question = question.map(str::trim).filter(|q| !q.is_empty());

        let traditional_analysis = rate_company(snapshot);
        info!(
            code = %snapshot.code,
            avg_score = traditional_analysis.avg_score,
            decision = traditional_analysis.decision_label.as_str(),
            "dimension scoring complete"
        );

        let (deep_analysis, analyst_status) = match self.analyst.analyze(snapshot, question).await {
            Ok(analysis) => {
                self.record_analysis(question, &analysis);
                (
                    analysis,
                    AnalystStatus::Completed {
                        analyst: self.analyst.name().to_string(),
                    },
                )
            }
            Err(err) => {
                warn!(code = %snapshot.code, analyst = self.analyst.name(), error = %err, "deep analysis failed; using neutral analysis");
                (
                    DeepAnalysis::neutral_default(),
                    AnalystStatus::Fallback {
                        reason: err.to_string(),
                    },
                )
            }
        };

        let integrated_recommendation = blend(
            &traditional_analysis.decision_label,
            deep_analysis.investment_recommendation.label(),
        );
        let knowledge = self.knowledge.insight(snapshot);
        debug!(
            code = %snapshot.code,
            blended = integrated_recommendation.blended,
            knowledge_confidence = knowledge.confidence_enhancement,
            "recommendation blended"
        );

        ValueAnalysisReport {
            company: snapshot.clone(),
            traditional_analysis,
            deep_analysis,
            analyst_status,
            integrated_recommendation,
            knowledge,
            cross_validation: None,
            analyzed_at: Utc::now(),
        }
    }

    /// Answer a follow-up question in the context of the conversation so far.
    pub async fn ask_follow_up(&self, question: &str) -> FollowUpAnswer {
        let history = self.conversation_history();
        match self.analyst.follow_up(question, &history).await {
            Ok(answer) => {
                let mut history = self.history_guard();
                history.push(ConversationTurn::user(question));
                history.push(ConversationTurn::assistant(
                    serde_json::to_string(&answer).unwrap_or_else(|_| answer.answer.clone()),
                ));
                answer
            }
            Err(err) => {
                warn!(analyst = self.analyst.name(), error = %err, "follow-up failed");
                FollowUpAnswer::fallback()
            }
        }
    }

    pub fn conversation_history(&self) -> Vec<ConversationTurn> {
        self.history_guard().clone()
    }

    pub fn clear_history(&self) {
        self.history_guard().clear();
    }

    pub fn stocks(&self) -> Vec<StockSummary> {
        self.market
            .catalog()
            .list()
            .iter()
            .map(|company| StockSummary {
                code: company.code.clone(),
                name: company.name.clone(),
                industry: company
                    .industry
                    .clone()
                    .or_else(|| self.knowledge.industry_for(company).map(str::to_string)),
            })
            .collect()
    }

    fn record_analysis(&self, question: Option<&str>, analysis: &DeepAnalysis) {
        let mut history = self.history_guard();
        if let Some(question) = question {
            history.push(ConversationTurn::user(question));
        }
        match serde_json::to_string(analysis) {
            Ok(content) => history.push(ConversationTurn::assistant(content)),
            Err(err) => warn!(error = %err, "analysis not recorded in history"),
        }
    }

    fn history_guard(&self) -> MutexGuard<'_, Vec<ConversationTurn>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

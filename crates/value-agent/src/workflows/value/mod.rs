//! Four-dimension value analysis blended with a qualitative analyst.
//!
//! Rule scores for safety margin, fundamentals, moat and risk produce a decision. The
//! analyst's recommendation is blended with it, and a knowledge-based reasoning chain is
//! reported alongside without changing the outcome.

pub mod analyst;
mod blend;
pub mod dimensions;
mod knowledge;
mod prompt;
mod rating;
pub mod service;

#[cfg(test)]
mod tests;

pub use analyst::{
    analyst_from_config, AnalystError, ConversationTurn, DeepAnalysis, FollowUpAnswer,
    HeuristicAnalyst, InvestmentAnalyst, ModelAnalyst, Recommendation, RiskLevel, Role,
};
pub use blend::{blend, recommendation_level, IntegratedRecommendation};
pub use dimensions::{score_dimensions, Dimension, DimensionScore, SafetyGuidance};
pub use knowledge::{
    cross_validate, infer_industry, CrossValidation, Evidence, IndustryProfile, KnowledgeBase,
    KnowledgeInsight, MetricComparison, ReasoningChain,
};
pub use prompt::{deep_analysis_prompt, follow_up_prompt};
pub use rating::{final_rating, rate_company, Decision, DimensionReport, FinalRating};
pub use service::{AnalystStatus, StockSummary, ValueAnalysisReport, ValueInvestmentAgent};

//! Factor-driven fundamental analysis.
//!
//! A submission is validated, screened against the hard minefield rules, scored factor by
//! factor, and then handed to the language model for a four-section Buffett-style report.
//! When the model is unavailable the report is assembled from the quantitative results.

mod config;
pub mod domain;
mod facts;
mod minefield;
mod prompt;
mod report;
pub mod router;
mod scoring;
pub mod service;
mod validation;

#[cfg(test)]
mod tests;

pub use config::{FundamentalConfig, KeyFactThresholds, MinefieldPolicy};
pub use domain::{BusinessRecord, FactorKey, FactorRecord, RawFactorRecord};
pub use facts::key_facts;
pub use minefield::{check_minefields, MinefieldOutcome, MinefieldVeto, MINEFIELD_PASSED};
pub use prompt::{analysis_prompt, ANALYST_PERSONA};
pub use report::{format_report, quantitative_report, FormattedReport};
pub use router::fundamental_router;
pub use scoring::{score_factors, FactorGrade, FactorScore, FactorScorecard, SCORED_FACTORS};
pub use service::{
    AnalysisError, FundamentalAgent, FundamentalAnalysis, FundamentalRequest, ModelStatus,
};
pub use validation::{validate_factors, FactorValidation, InvalidFactorRecord};

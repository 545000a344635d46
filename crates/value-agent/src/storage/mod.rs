//! Local persistence for the observation pool and the factor-analysis cache.
//!
//! Both stores favour availability over strictness: a missing or corrupt file reads as an
//! empty collection and a failed write is reported as `false` rather than an error.

mod json;

pub use json::{JsonFactorCache, JsonObservationPool};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::fundamental::{BusinessRecord, FactorRecord, FundamentalAnalysis};

/// A stock the user chose to keep watching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationEntry {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub conclusion: String,
    pub timestamp: DateTime<Utc>,
}

impl ObservationEntry {
    pub fn new(code: impl Into<String>, name: impl Into<String>, conclusion: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            conclusion: conclusion.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The most recent fundamental analysis for one stock code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorCacheEntry {
    pub stock_code: String,
    pub company_name: String,
    pub factor_data: FactorRecord,
    pub business_data: BusinessRecord,
    pub analysis_result: FundamentalAnalysis,
    pub timestamp: DateTime<Utc>,
}

/// Watch list keyed by stock code; at most one entry per code.
pub trait ObservationPool: Send + Sync {
    fn list(&self) -> Vec<ObservationEntry>;
    fn get(&self, code: &str) -> Option<ObservationEntry>;
    /// `false` when the code is already present or the write failed.
    fn insert(&self, entry: ObservationEntry) -> bool;
    /// `false` when the code is unknown or the write failed.
    fn update(&self, code: &str, conclusion: &str) -> bool;
    fn remove(&self, code: &str) -> bool;
    fn clear(&self) -> bool;
}

/// Last-write-wins cache of analyses; entries never expire.
pub trait FactorCache: Send + Sync {
    fn get(&self, code: &str) -> Option<FactorCacheEntry>;
    fn all(&self) -> Vec<FactorCacheEntry>;
    fn put(&self, entry: FactorCacheEntry) -> bool;
    fn remove(&self, code: &str) -> bool;
    fn clear(&self) -> bool;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode store contents: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

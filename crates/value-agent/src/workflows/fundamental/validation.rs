use serde::Serialize;

use super::domain::{FactorKey, RawFactorRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactorValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Raised when a raw record cannot become a [`FactorRecord`](super::FactorRecord).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("因子数据无效: {}", errors.join("; "))]
pub struct InvalidFactorRecord {
    pub errors: Vec<String>,
}

/// Check every required key; all problems are reported, not just the first.
pub fn validate_factors(raw: &RawFactorRecord) -> FactorValidation {
    let errors: Vec<String> = FactorKey::ALL
        .iter()
        .filter_map(|key| match raw.get(*key) {
            None => Some(format!("缺少因子: {key}")),
            Some(None) => Some(format!("因子值为空: {key}")),
            Some(Some(_)) => None,
        })
        .collect();

    FactorValidation {
        valid: errors.is_empty(),
        errors,
    }
}

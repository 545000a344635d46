use super::{ChatRequest, LanguageModel, LlmError};
use async_trait::async_trait;

/// Stand-in used when no provider credentials exist; every call fails so callers fall back.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineModel;

#[async_trait]
impl LanguageModel for OfflineModel {
    fn name(&self) -> &'static str {
        "offline"
    }

    async fn generate(&self, _request: &ChatRequest) -> Result<String, LlmError> {
        Err(LlmError::Unavailable(
            "no LLM API key configured".to_string(),
        ))
    }
}

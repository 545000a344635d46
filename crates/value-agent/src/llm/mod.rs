//! Language-model collaborator.
//!
//! The scoring core never talks to a provider directly: it hands a [`ChatRequest`] to a
//! [`LanguageModel`] and treats every failure as a reason to fall back to a neutral record.

mod offline;
mod openai_compatible;
mod types;

pub use offline::OfflineModel;
pub use openai_compatible::OpenAiCompatibleClient;
pub use types::{extract_json_object, ChatRequest, LlmError};

use crate::config::LlmConfig;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, request: &ChatRequest) -> Result<String, LlmError>;
}

/// Run `generate` under the request's deadline so a stalled provider surfaces as
/// [`LlmError::Timeout`] rather than blocking the pipeline.
pub async fn generate_with_deadline(
    model: &dyn LanguageModel,
    request: &ChatRequest,
) -> Result<String, LlmError> {
    match tokio::time::timeout(request.timeout, model.generate(request)).await {
        Ok(result) => result,
        Err(_) => Err(LlmError::Timeout(request.timeout)),
    }
}

/// Pick the remote client when an API key is configured, the offline model otherwise.
pub fn model_from_config(config: &LlmConfig) -> Result<Arc<dyn LanguageModel>, LlmError> {
    match config.api_key.as_deref() {
        Some(api_key) => {
            let client = OpenAiCompatibleClient::new(&config.base_url, api_key, config.timeout)?;
            info!(provider = ?config.provider, model = %config.model, "using remote language model");
            Ok(Arc::new(client))
        }
        None => {
            info!("no LLM API key configured; model output will use quantitative fallbacks");
            Ok(Arc::new(OfflineModel))
        }
    }
}

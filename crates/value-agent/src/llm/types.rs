use crate::config::LlmConfig;
use std::time::Duration;

/// Everything a provider needs for one system+user exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl ChatRequest {
    pub fn new(
        config: &LlmConfig,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.timeout,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("provider API error: status={status}, body={body}")]
    Api { status: u16, body: String },
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
    #[error("model unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(Duration::ZERO)
        } else if err.is_decode() {
            LlmError::MalformedResponse(err.to_string())
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

/// Slice out the outermost `{...}` block; models like to wrap JSON in prose or fences.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    text.get(start..=end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_json_from_fenced_reply() {
        let reply = "好的，结果如下：\n```json\n{\"a\": {\"b\": 1}}\n```";
        assert_eq!(extract_json_object(reply), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn no_object_yields_none() {
        assert_eq!(extract_json_object("买入"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }
}

use super::{ChatRequest, LanguageModel, LlmError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Chat-completions client for Kimi, MiniMax, OpenAI and other compatible endpoints.
#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl OpenAiCompatibleClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompatibleClient {
    fn name(&self) -> &'static str {
        "openai-compatible"
    }

    async fn generate(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let payload = CompletionRequest {
            model: &request.model,
            messages: vec![
                Message {
                    role: "system",
                    content: &request.system_prompt,
                },
                Message {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        let res = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .timeout(request.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|err| timeout_aware(err, request.timeout))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = res
            .text()
            .await
            .map_err(|err| timeout_aware(err, request.timeout))?;
        let parsed: CompletionResponse = serde_json::from_str(&body)
            .map_err(|err| LlmError::MalformedResponse(err.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(LlmError::MalformedResponse(
                "response carried no message content".to_string(),
            ));
        }

        debug!(chars = content.chars().count(), "model reply received");
        Ok(content)
    }
}

fn timeout_aware(err: reqwest::Error, timeout: Duration) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout(timeout)
    } else {
        LlmError::from(err)
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ReplyMessage>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ChatRequest {
        ChatRequest {
            system_prompt: "你是一位价值投资分析师".to_string(),
            user_prompt: "分析 600519.SH".to_string(),
            model: "moonshot-v1-8k".to_string(),
            temperature: 0.1,
            max_tokens: 256,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "【决策结论】观望" } }]
            })))
            .mount(&server)
            .await;

        let client = OpenAiCompatibleClient::new(
            &format!("{}/v1/", server.uri()),
            "test-key",
            Duration::from_secs(5),
        )
        .expect("client builds");

        let reply = client.generate(&request()).await.expect("reply");
        assert_eq!(reply, "【决策结论】观望");
    }

    #[tokio::test]
    async fn non_success_status_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = OpenAiCompatibleClient::new(&server.uri(), "k", Duration::from_secs(5))
            .expect("client builds");

        match client.generate(&request()).await {
            Err(LlmError::Api { status, body }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_are_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let client = OpenAiCompatibleClient::new(&server.uri(), "k", Duration::from_secs(5))
            .expect("client builds");

        assert!(matches!(
            client.generate(&request()).await,
            Err(LlmError::MalformedResponse(_))
        ));
    }
}

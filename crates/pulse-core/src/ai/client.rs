use crate::ai::ReasoningService;
use crate::config::AiConfig;
use crate::error::AiError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client for a messages-style completion endpoint.
pub struct HttpReasoningClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: Option<String>,
    max_tokens: u32,
}

impl HttpReasoningClient {
    /// `None` when the endpoint or key is missing, or when the HTTP client
    /// cannot be built with the configured timeout.
    pub fn from_config(config: &AiConfig) -> Option<Self> {
        if !config.is_configured() {
            return None;
        }
        let http_client = match http_client(config.timeout_secs) {
            Ok(client) => client,
            Err(err) => {
                warn!(error = %err, "reasoning client unavailable");
                return None;
            }
        };
        Some(Self {
            http_client,
            endpoint: config.endpoint.clone().unwrap_or_default(),
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    fn request_body(&self, prompt: &str) -> Value {
        let mut body = json!({
            "max_tokens": self.max_tokens,
            "messages": [{"role": "user", "content": prompt}],
        });
        if let Some(model) = &self.model {
            body["model"] = json!(model);
        }
        body
    }
}

fn http_client(timeout_secs: u64) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("pulse/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Pulls the reply text out of the common response shapes: a `content`
/// block list, a `choices[].message` list, or a bare `text`/`output` field.
pub fn response_text(body: &Value) -> Option<String> {
    if let Some(blocks) = body.get("content").and_then(Value::as_array) {
        let text: Vec<&str> = blocks
            .iter()
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .collect();
        if !text.is_empty() {
            return Some(text.join(""));
        }
    }
    if let Some(content) = body
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.pointer("/message/content"))
        .and_then(Value::as_str)
    {
        return Some(content.to_string());
    }
    ["text", "output", "content"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

#[async_trait]
impl ReasoningService for HttpReasoningClient {
    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        debug!(endpoint = %self.endpoint, prompt_len = prompt.len(), "reasoning request");
        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("x-api-key", &self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|err| AiError::Transport {
                message: err.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("reasoning service rate limited");
            return Err(AiError::RateLimited);
        }
        if !status.is_success() {
            warn!(status = status.as_u16(), "reasoning service returned an error");
            return Err(AiError::Status {
                code: status.as_u16(),
            });
        }

        let body: Value = response.json().await.map_err(|err| AiError::Transport {
            message: err.to_string(),
        })?;
        response_text(&body).ok_or(AiError::NoJson)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_client_is_none() {
        assert!(HttpReasoningClient::from_config(&AiConfig::default()).is_none());
    }

    #[test]
    fn request_body_carries_prompt_and_model() {
        let client = HttpReasoningClient::from_config(&AiConfig {
            endpoint: Some("https://reasoning.example/v1/messages".to_string()),
            api_key: Some("key".to_string()),
            model: Some("analyst".to_string()),
            ..AiConfig::default()
        })
        .unwrap();
        let body = client.request_body("hello");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert_eq!(body["model"], "analyst");
        assert_eq!(body["max_tokens"], 2048);
    }

    #[tokio::test]
    async fn silent_endpoint_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });
        let client = HttpReasoningClient::from_config(&AiConfig {
            endpoint: Some(format!("http://{addr}/v1/messages")),
            api_key: Some("key".to_string()),
            timeout_secs: 1,
            ..AiConfig::default()
        })
        .unwrap();

        let result = tokio::time::timeout(Duration::from_secs(10), client.complete("hello"))
            .await
            .expect("configured timeout should end the request");
        assert!(matches!(result, Err(AiError::Transport { .. })));
        server.abort();
    }

    #[test]
    fn response_text_handles_known_shapes() {
        let blocks = json!({"content": [{"type": "text", "text": "a"}, {"type": "text", "text": "b"}]});
        assert_eq!(response_text(&blocks).as_deref(), Some("ab"));
        let choices = json!({"choices": [{"message": {"content": "c"}}]});
        assert_eq!(response_text(&choices).as_deref(), Some("c"));
        assert_eq!(response_text(&json!({"text": "d"})).as_deref(), Some("d"));
        assert_eq!(response_text(&json!({"id": 1})), None);
    }
}

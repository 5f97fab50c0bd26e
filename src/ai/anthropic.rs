//! Anthropic messages backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{ChatBackend, GenerateParams};
use crate::error::ProviderError;

const API_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ApiMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

pub struct AnthropicBackend {
    client: Client,
    api_key: String,
}

impl AnthropicBackend {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }
}

#[async_trait]
impl ChatBackend for AnthropicBackend {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    /// Anything that does not look like a Claude model id gets the default.
    fn normalize_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        if trimmed.starts_with("claude") {
            trimmed.to_string()
        } else {
            DEFAULT_MODEL.to_string()
        }
    }

    async fn generate(&self, params: &GenerateParams) -> Result<String, ProviderError> {
        let body = MessagesRequest {
            model: &params.model,
            max_tokens: params.max_tokens,
            system: &params.system,
            messages: vec![ApiMessage { role: "user", content: &params.prompt }],
            temperature: params.temperature,
        };

        debug!(model = %params.model, "calling anthropic messages");
        let response = self
            .client
            .post(format!("{API_BASE_URL}/messages"))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport {
                provider: "anthropic",
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: "anthropic",
                status: status.as_u16(),
                message,
            });
        }

        let completion: MessagesResponse =
            response.json().await.map_err(|e| ProviderError::Transport {
                provider: "anthropic",
                message: format!("invalid response body: {e}"),
            })?;

        completion
            .content
            .into_iter()
            .find_map(|block| block.text)
            .filter(|text| !text.trim().is_empty())
            .map(|text| text.trim().to_string())
            .ok_or(ProviderError::EmptyCompletion { provider: "anthropic" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_models_normalize_to_the_default() {
        let backend = AnthropicBackend::new("key".into());
        assert_eq!(backend.normalize_model("gpt-4o-mini"), DEFAULT_MODEL);
        assert_eq!(backend.normalize_model(""), DEFAULT_MODEL);
        assert_eq!(
            backend.normalize_model("claude-3-5-haiku-20241022"),
            "claude-3-5-haiku-20241022"
        );
    }
}

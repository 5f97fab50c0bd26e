//! OpenAI chat-completions backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{ChatBackend, GenerateParams};
use crate::error::ProviderError;

const API_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct OpenAiBackend {
    client: Client,
    api_key: String,
}

impl OpenAiBackend {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn normalize_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        if trimmed.is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            trimmed.to_string()
        }
    }

    async fn generate(&self, params: &GenerateParams) -> Result<String, ProviderError> {
        let body = ChatCompletionRequest {
            model: &params.model,
            messages: vec![
                ApiMessage { role: "system", content: &params.system },
                ApiMessage { role: "user", content: &params.prompt },
            ],
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };

        debug!(model = %params.model, "calling openai chat completion");
        let response = self
            .client
            .post(format!("{API_BASE_URL}/chat/completions"))
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport {
                provider: "openai",
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: "openai",
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse =
            response.json().await.map_err(|e| ProviderError::Transport {
                provider: "openai",
                message: format!("invalid response body: {e}"),
            })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .map(|text| text.trim().to_string())
            .ok_or(ProviderError::EmptyCompletion { provider: "openai" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_model_name_falls_back_to_default() {
        let backend = OpenAiBackend::new("key".into());
        assert_eq!(backend.normalize_model(""), DEFAULT_MODEL);
        assert_eq!(backend.normalize_model("  "), DEFAULT_MODEL);
        assert_eq!(backend.normalize_model("gpt-4o"), "gpt-4o");
    }
}

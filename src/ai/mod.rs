//! Provider gateway: one uniform call surface over heterogeneous LLM
//! backends, with bounded retry for transient failures.

mod anthropic;
mod openai;

pub use anthropic::AnthropicBackend;
pub use openai::OpenAiBackend;

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::{info, warn};

use crate::config::AiConfig;
use crate::error::ProviderError;

/// Parameters of one text generation call.
#[derive(Debug, Clone)]
pub struct GenerateParams {
    pub model: String,
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Contract a chat-completion backend has to fulfill: produce text for a
/// prompt, and normalize model names it does not recognize.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn normalize_model(&self, model: &str) -> String;

    async fn generate(&self, params: &GenerateParams) -> Result<String, ProviderError>;
}

/// Gateway over the configured backends. Built once at startup from
/// validated configuration and injected into the orchestrator.
pub struct ProviderGateway {
    backends: Vec<Box<dyn ChatBackend>>,
    max_tokens: u32,
    temperature: f32,
    request_attempts: u32,
    backoff_start: Duration,
    backoff_cap: Duration,
}

impl ProviderGateway {
    pub fn from_config(config: &AiConfig) -> Self {
        let mut backends: Vec<Box<dyn ChatBackend>> = Vec::new();
        if let Some(key) = &config.openai_api_key {
            backends.push(Box::new(OpenAiBackend::new(key.clone())));
            info!("openai backend configured");
        }
        if let Some(key) = &config.anthropic_api_key {
            backends.push(Box::new(AnthropicBackend::new(key.clone())));
            info!("anthropic backend configured");
        }
        Self {
            backends,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            request_attempts: config.request_attempts.max(1),
            backoff_start: Duration::from_secs(config.backoff_start_secs),
            backoff_cap: Duration::from_secs(config.backoff_cap_secs),
        }
    }

    /// Gateway over a single explicit backend; used by tests.
    pub fn with_backend(backend: Box<dyn ChatBackend>, attempts: u32) -> Self {
        Self {
            backends: vec![backend],
            max_tokens: 4000,
            temperature: 0.7,
            request_attempts: attempts.max(1),
            backoff_start: Duration::from_secs(2),
            backoff_cap: Duration::from_secs(10),
        }
    }

    fn backend(&self, provider: &str) -> Result<&dyn ChatBackend, ProviderError> {
        let wanted = provider.to_lowercase();
        self.backends
            .iter()
            .find(|b| b.name() == wanted)
            .map(AsRef::as_ref)
            .ok_or(ProviderError::NotConfigured(wanted))
    }

    /// Run one generation request against the named provider.
    ///
    /// Transient failures (network, timeout, rate limit, upstream 5xx) are
    /// retried with exponential backoff; configuration errors fail
    /// immediately. The returned text has markdown fences stripped.
    pub async fn invoke(
        &self,
        provider: &str,
        model: &str,
        system: &str,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        let backend = self.backend(provider)?;
        let params = GenerateParams {
            model: backend.normalize_model(model),
            system: system.to_string(),
            prompt: prompt.to_string(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let mut delay = self.backoff_start;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match backend.generate(&params).await {
                Ok(text) => return Ok(strip_code_fences(&text).to_string()),
                Err(e) if e.is_transient() && attempt < self.request_attempts => {
                    let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..250));
                    warn!(
                        provider = backend.name(),
                        attempt,
                        delay_secs = delay.as_secs(),
                        error = %e,
                        "transient provider failure, backing off"
                    );
                    tokio::time::sleep(delay + jitter).await;
                    delay = (delay * 2).min(self.backoff_cap);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Strip a leading/trailing markdown code fence (with optional `json` tag)
/// from a model response.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct ScriptedBackend {
        calls: Arc<AtomicUsize>,
        responses: Vec<Result<String, ProviderError>>,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<Result<String, ProviderError>>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (Self { calls: Arc::clone(&calls), responses }, calls)
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn normalize_model(&self, model: &str) -> String {
            model.to_string()
        }

        async fn generate(&self, _params: &GenerateParams) -> Result<String, ProviderError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.responses.get(call) {
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err(e)) => Err(clone_error(e)),
                None => panic!("backend called more times than scripted"),
            }
        }
    }

    fn clone_error(e: &ProviderError) -> ProviderError {
        match e {
            ProviderError::NotConfigured(p) => ProviderError::NotConfigured(p.clone()),
            ProviderError::Unsupported(p) => ProviderError::Unsupported(p.clone()),
            ProviderError::Transport { provider, message } => ProviderError::Transport {
                provider: *provider,
                message: message.clone(),
            },
            ProviderError::Api { provider, status, message } => ProviderError::Api {
                provider: *provider,
                status: *status,
                message: message.clone(),
            },
            ProviderError::EmptyCompletion { provider } => {
                ProviderError::EmptyCompletion { provider: *provider }
            }
        }
    }

    fn transient() -> ProviderError {
        ProviderError::Transport { provider: "scripted", message: "connection reset".into() }
    }

    #[test]
    fn fences_are_stripped_with_and_without_language_tag() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}"), "{\"a\":1}");
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried_until_success() {
        let (backend, calls) =
            ScriptedBackend::new(vec![Err(transient()), Err(transient()), Ok("{}".into())]);
        let gateway = ProviderGateway::with_backend(Box::new(backend), 3);

        let text = gateway
            .invoke("scripted", "model", "system", "prompt")
            .await
            .expect("should succeed on third attempt");
        assert_eq!(text, "{}");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_exhaust_the_attempt_budget() {
        let (backend, calls) =
            ScriptedBackend::new(vec![Err(transient()), Err(transient()), Err(transient())]);
        let gateway = ProviderGateway::with_backend(Box::new(backend), 3);

        let err = gateway
            .invoke("scripted", "model", "system", "prompt")
            .await
            .expect_err("should exhaust retries");
        assert!(err.is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_errors_fail_fast() {
        let (backend, calls) = ScriptedBackend::new(vec![Err(ProviderError::Api {
            provider: "scripted",
            status: 401,
            message: "bad key".into(),
        })]);
        let gateway = ProviderGateway::with_backend(Box::new(backend), 3);

        let err = gateway
            .invoke("scripted", "model", "system", "prompt")
            .await
            .expect_err("should fail fast");
        assert!(!err.is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unconfigured_provider_fails_without_calling_anything() {
        let (backend, calls) = ScriptedBackend::new(vec![]);
        let gateway = ProviderGateway::with_backend(Box::new(backend), 3);

        let err = gateway
            .invoke("openai", "model", "system", "prompt")
            .await
            .expect_err("provider is not registered");
        assert!(matches!(err, ProviderError::NotConfigured(ref p) if p == "openai"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_status_is_retried() {
        let (backend, calls) = ScriptedBackend::new(vec![
            Err(ProviderError::Api { provider: "scripted", status: 429, message: "slow down".into() }),
            Ok("ok".into()),
        ]);
        let gateway = ProviderGateway::with_backend(Box::new(backend), 3);

        let text = gateway
            .invoke("scripted", "model", "system", "prompt")
            .await
            .expect("retried after 429");
        assert_eq!(text, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

use thiserror::Error;

use crate::plans::validate::ValidationIssue;

/// Errors from the nutrition profile calculator. These are input errors:
/// they surface straight to the caller of the submit endpoint and are
/// never retried.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("age {0} is outside the supported range (10-120)")]
    InvalidAge(i64),

    #[error("no usable {0} measurement: provide either the metric or the imperial value")]
    MissingMeasurement(&'static str),

    #[error("ambiguous {0} measurement: both metric and imperial values are set")]
    AmbiguousMeasurement(&'static str),

    #[error("sex field is empty")]
    UnsupportedSex,

    #[error("implausible {field} value {value}")]
    ImplausibleMeasurement { field: &'static str, value: f64 },

    #[error("calorie target resolved to zero, cannot derive macro split")]
    ZeroCalorieTarget,
}

/// Errors from the provider gateway.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider '{0}' is not configured: missing API key")]
    NotConfigured(String),

    #[error("unsupported provider '{0}'")]
    Unsupported(String),

    #[error("{provider} request failed: {message}")]
    Transport { provider: &'static str, message: String },

    #[error("{provider} returned status {status}: {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("{provider} returned an empty completion")]
    EmptyCompletion { provider: &'static str },
}

impl ProviderError {
    /// Transient failures are worth retrying with backoff: network/timeout
    /// trouble, rate limits and upstream 5xx. Configuration problems and
    /// auth rejections are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::NotConfigured(_) | Self::Unsupported(_) | Self::EmptyCompletion { .. } => false,
        }
    }
}

/// Terminal outcome of one generation unit. Never crosses the orchestrator
/// boundary: callers only ever observe the stored status and message.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("plan failed validation after {attempts} attempts; last errors: {}", format_issues(.issues))]
    ValidationExhausted {
        attempts: u32,
        issues: Vec<ValidationIssue>,
    },

    #[error("failed to encode validated plan: {0}")]
    Encode(#[from] serde_json::Error),
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_attempts: u32,
    pub backoff_start_secs: u64,
    pub backoff_cap_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Extra attempts after the first one when the model returns a plan
    /// that fails schema validation.
    pub validation_retries: u32,
    pub cache_ttl_hours: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_pool_min: u32,
    pub db_pool_max: u32,
    pub db_acquire_timeout_secs: u64,
    pub ai: AiConfig,
    pub generation: GenerationConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let ai = AiConfig {
            openai_api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            max_tokens: env_parse("AI_MAX_TOKENS", 4000),
            temperature: env_parse("AI_TEMPERATURE", 0.7),
            request_attempts: env_parse("AI_REQUEST_ATTEMPTS", 3),
            backoff_start_secs: env_parse("AI_BACKOFF_START_SECS", 2),
            backoff_cap_secs: env_parse("AI_BACKOFF_CAP_SECS", 10),
        };
        let generation = GenerationConfig {
            validation_retries: env_parse("PLAN_VALIDATION_RETRIES", 2),
            cache_ttl_hours: env_parse("PLAN_CACHE_TTL_HOURS", 24),
        };
        Ok(Self {
            database_url,
            db_pool_min: env_parse("DB_POOL_MIN", 1),
            db_pool_max: env_parse("DB_POOL_MAX", 10),
            db_acquire_timeout_secs: env_parse("DB_ACQUIRE_TIMEOUT_SECS", 10),
            ai,
            generation,
        })
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::ai::ProviderGateway;
use crate::cache::ResponseCache;
use crate::config::AppConfig;
use crate::plans::repo::{PgPlanStore, PlanStore};
use crate::plans::services::PlanEngine;

const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn PlanStore>,
    pub cache: Arc<ResponseCache>,
    pub engine: Arc<PlanEngine>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .min_connections(config.db_pool_min)
            .max_connections(config.db_pool_max)
            .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
            .connect(&config.database_url)
            .await?;

        let gateway = Arc::new(ProviderGateway::from_config(&config.ai));
        let store: Arc<dyn PlanStore> = Arc::new(PgPlanStore::new(db.clone()));
        let cache = Arc::new(ResponseCache::new(Duration::from_secs(
            config.generation.cache_ttl_hours * 3600,
        )));
        cache.spawn_sweeper(CACHE_SWEEP_INTERVAL);

        let engine = Arc::new(PlanEngine::new(
            gateway,
            Arc::clone(&store),
            Arc::clone(&cache),
            config.generation.validation_retries,
        ));

        Ok(Self { db, config, store, cache, engine })
    }
}

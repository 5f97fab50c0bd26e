use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::error::ProfileError;
use crate::plans::dto::{
    GeneratePlansRequest, GeneratePlansResponse, GenerationStatus, InvalidateCacheRequest,
    InvalidateCacheResponse, PlanStatusResponse,
};
use crate::state::AppState;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/plan-status/:user_id", get(plan_status))
        .route("/cache/stats", get(cache_stats))
        .route("/health", get(health))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/generate-plans", post(generate_plans))
        .route("/cache/invalidate", post(invalidate_cache))
}

/// POST /generate-plans
///
/// Computes the nutrition profile synchronously, kicks off both generation
/// units in the background and returns immediately.
#[instrument(skip(state, payload), fields(user_id = %payload.user_id))]
pub async fn generate_plans(
    State(state): State<AppState>,
    Json(payload): Json<GeneratePlansRequest>,
) -> Result<Json<GeneratePlansResponse>, (StatusCode, String)> {
    match state.engine.submit(&payload).await {
        Ok(profile) => {
            let macros = profile.macros.clone();
            Ok(Json(GeneratePlansResponse {
                success: true,
                calculations: profile,
                macros,
                meal_plan_status: GenerationStatus::Generating,
                workout_plan_status: GenerationStatus::Generating,
                message: "Calculations complete. Plans are being generated in the background."
                    .into(),
            }))
        }
        Err(e) => {
            warn!(error = %e, "rejected plan generation request");
            Err((profile_error_status(&e), e.to_string()))
        }
    }
}

const fn profile_error_status(error: &ProfileError) -> StatusCode {
    match error {
        ProfileError::InvalidAge(_)
        | ProfileError::MissingMeasurement(_)
        | ProfileError::AmbiguousMeasurement(_)
        | ProfileError::UnsupportedSex
        | ProfileError::ImplausibleMeasurement { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ProfileError::ZeroCalorieTarget => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// GET /plan-status/:user_id
#[instrument(skip(state))]
pub async fn plan_status(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<PlanStatusResponse>, (StatusCode, String)> {
    let row = state.store.read_status(user_id).await.map_err(|e| {
        error!(%user_id, error = %e, "failed to read plan status");
        (StatusCode::INTERNAL_SERVER_ERROR, "failed to read plan status".to_string())
    })?;

    match row {
        Some(row) => Ok(Json(PlanStatusResponse {
            success: true,
            meal_plan_status: row.meal_plan_status,
            workout_plan_status: row.workout_plan_status,
            meal_plan_error: row.meal_plan_error,
            workout_plan_error: row.workout_plan_error,
        })),
        None => Err((StatusCode::NOT_FOUND, "No plan generation found for user".into())),
    }
}

/// POST /cache/invalidate
#[instrument(skip(state, payload))]
pub async fn invalidate_cache(
    State(state): State<AppState>,
    Json(payload): Json<InvalidateCacheRequest>,
) -> Json<InvalidateCacheResponse> {
    let invalidated = state.cache.invalidate(payload.plan_type, &payload.answers).await;
    Json(InvalidateCacheResponse { invalidated })
}

/// GET /cache/stats
pub async fn cache_stats(State(state): State<AppState>) -> Json<crate::cache::CacheStats> {
    Json(state.cache.stats().await)
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let database = !state.db.is_closed();
    Json(json!({
        "status": "healthy",
        "service": "planmind",
        "ai_providers": {
            "openai": state.config.ai.openai_api_key.is_some(),
            "anthropic": state.config.ai.anthropic_api_key.is_some(),
        },
        "database": database,
    }))
}

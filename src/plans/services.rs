use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::ai::ProviderGateway;
use crate::cache::ResponseCache;
use crate::error::{GenerationError, ProfileError};
use crate::plans::dto::{GeneratePlansRequest, GenerationStatus, NutritionProfile, PlanType};
use crate::plans::prompts;
use crate::plans::profile;
use crate::plans::repo::{PlanMetadata, PlanStore};
use crate::plans::validate::validate_plan;

/// Top-level coordinator for plan generation.
///
/// Owns the injected collaborators and drives the full flow: cache lookup,
/// prompt construction, gateway call, validation repair loop, persistence
/// and status tracking. Errors never escape the spawned units; callers
/// observe the stored status only.
pub struct PlanEngine {
    gateway: Arc<ProviderGateway>,
    store: Arc<dyn PlanStore>,
    cache: Arc<ResponseCache>,
    validation_retries: u32,
}

impl PlanEngine {
    pub fn new(
        gateway: Arc<ProviderGateway>,
        store: Arc<dyn PlanStore>,
        cache: Arc<ResponseCache>,
        validation_retries: u32,
    ) -> Self {
        Self { gateway, store, cache, validation_retries }
    }

    /// Handle a fresh submission: compute the profile synchronously, reset
    /// the status row and launch both generation units. Returns as soon as
    /// the profile is known; the caller polls for plan completion.
    pub async fn submit(
        self: &Arc<Self>,
        request: &GeneratePlansRequest,
    ) -> Result<NutritionProfile, ProfileError> {
        let profile = profile::compute(&request.answers)?;

        match serde_json::to_value(&profile) {
            Ok(calculations) => {
                if let Err(e) = self
                    .store
                    .save_calculations(request.quiz_result_id, &calculations)
                    .await
                {
                    error!(user_id = %request.user_id, error = %e, "failed to save calculations");
                }
            }
            Err(e) => error!(error = %e, "failed to encode calculations"),
        }

        if let Err(e) = self
            .store
            .init_status(request.user_id, request.quiz_result_id)
            .await
        {
            error!(user_id = %request.user_id, error = %e, "failed to initialize plan status");
        }

        // Fire both units; the supervisors record terminal status on their own.
        let _ = self.spawn_generation(PlanType::Meal, request.clone(), profile.clone());
        let _ = self.spawn_generation(PlanType::Workout, request.clone(), profile.clone());

        Ok(profile)
    }

    /// Launch one supervised generation unit. The inner task does the work
    /// and records its own outcome; the supervisor catches an aborted or
    /// panicked task so a failure is never silently dropped.
    pub fn spawn_generation(
        self: &Arc<Self>,
        plan_type: PlanType,
        request: GeneratePlansRequest,
        profile: NutritionProfile,
    ) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let user_id = request.user_id;
            let worker = tokio::spawn({
                let engine = Arc::clone(&engine);
                async move { engine.generate_and_record(plan_type, &request, &profile).await }
            });
            if let Err(join_err) = worker.await {
                error!(%user_id, %plan_type, error = %join_err, "generation task aborted");
                if let Err(e) = engine
                    .store
                    .write_status(user_id, plan_type, GenerationStatus::Failed, Some("generation task aborted"))
                    .await
                {
                    error!(%user_id, %plan_type, error = %e, "failed to record aborted generation");
                }
            }
        })
    }

    /// Run one generation unit to a terminal status.
    async fn generate_and_record(
        &self,
        plan_type: PlanType,
        request: &GeneratePlansRequest,
        profile: &NutritionProfile,
    ) {
        let user_id = request.user_id;
        match self.generate_plan(plan_type, request, profile).await {
            Ok((payload, from_cache)) => {
                let metadata = PlanMetadata {
                    provider: request.ai_provider.clone(),
                    model: request.model_name.clone(),
                    daily_calories: matches!(plan_type, PlanType::Meal)
                        .then_some(profile.goal_calories),
                    preferences: request.answers.preferred_exercise.clone(),
                    restrictions: match plan_type {
                        PlanType::Meal => Some(request.answers.dietary_style.clone()),
                        PlanType::Workout => request.answers.injuries.clone(),
                    },
                    from_cache,
                };
                if let Err(e) = self
                    .store
                    .persist_plan(user_id, request.quiz_result_id, plan_type, &payload, &metadata)
                    .await
                {
                    // The plan exists in memory and in cache; a persistence
                    // failure degrades observability, not correctness.
                    error!(%user_id, %plan_type, error = %e, "failed to persist generated plan");
                }
                if let Err(e) = self
                    .store
                    .write_status(user_id, plan_type, GenerationStatus::Completed, None)
                    .await
                {
                    error!(%user_id, %plan_type, error = %e, "failed to record completed status");
                }
                info!(%user_id, %plan_type, from_cache, "plan generation completed");
            }
            Err(e) => {
                let message = e.to_string();
                warn!(%user_id, %plan_type, error = %message, "plan generation failed");
                if let Err(write_err) = self
                    .store
                    .write_status(user_id, plan_type, GenerationStatus::Failed, Some(&message))
                    .await
                {
                    error!(%user_id, %plan_type, error = %write_err, "failed to record failed status");
                }
            }
        }
    }

    /// Produce a validated plan payload: cache hit, or provider call with a
    /// bounded validation repair loop. The boolean is true for a cache hit.
    async fn generate_plan(
        &self,
        plan_type: PlanType,
        request: &GeneratePlansRequest,
        profile: &NutritionProfile,
    ) -> Result<(Value, bool), GenerationError> {
        let answers_value = serde_json::to_value(&request.answers)?;

        if let Some(cached) = self.cache.get(plan_type, &answers_value).await {
            info!(user_id = %request.user_id, %plan_type, "cache hit, skipping provider call");
            return Ok((cached, true));
        }

        let base_prompt = prompts::plan_prompt(plan_type, &request.answers, profile);
        let mut prompt = base_prompt.clone();
        let max_attempts = 1 + self.validation_retries;
        let mut last_issues = Vec::new();

        for attempt in 1..=max_attempts {
            let raw = self
                .gateway
                .invoke(&request.ai_provider, &request.model_name, prompts::SYSTEM_PREAMBLE, &prompt)
                .await?;

            match validate_plan(plan_type, &raw) {
                Ok(plan) => {
                    let payload = serde_json::to_value(&plan)?;
                    self.cache.set(plan_type, &answers_value, payload.clone()).await;
                    return Ok((payload, false));
                }
                Err(issues) => {
                    warn!(
                        user_id = %request.user_id,
                        %plan_type,
                        attempt,
                        issue_count = issues.len(),
                        "generated plan failed validation"
                    );
                    last_issues = issues;
                    if attempt < max_attempts {
                        prompt = prompts::repair_prompt(&base_prompt, attempt, &last_issues);
                    }
                }
            }
        }

        Err(GenerationError::ValidationExhausted { attempts: max_attempts, issues: last_issues })
    }
}

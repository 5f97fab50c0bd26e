use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::plans::dto::{GenerationStatus, PlanType};

#[derive(Debug, Clone, FromRow)]
pub struct PlanStatusRow {
    pub user_id: Uuid,
    pub quiz_result_id: Uuid,
    pub meal_plan_status: String,
    pub meal_plan_error: Option<String>,
    pub workout_plan_status: String,
    pub workout_plan_error: Option<String>,
    pub updated_at: OffsetDateTime,
}

/// Metadata stored next to a generated plan payload.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PlanMetadata {
    pub provider: String,
    pub model: String,
    pub daily_calories: Option<i32>,
    pub preferences: Vec<String>,
    pub restrictions: Option<String>,
    pub from_cache: bool,
}

/// Minimal storage contract the orchestrator needs. The Postgres
/// implementation lives below; tests substitute an in-memory fake.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Create or supersede the status row for a fresh submission: both plan
    /// types back to `generating`, errors cleared.
    async fn init_status(&self, user_id: Uuid, quiz_result_id: Uuid) -> anyhow::Result<()>;

    async fn write_status(
        &self,
        user_id: Uuid,
        plan_type: PlanType,
        status: GenerationStatus,
        error: Option<&str>,
    ) -> anyhow::Result<()>;

    async fn read_status(&self, user_id: Uuid) -> anyhow::Result<Option<PlanStatusRow>>;

    async fn persist_plan(
        &self,
        user_id: Uuid,
        quiz_result_id: Uuid,
        plan_type: PlanType,
        payload: &Value,
        metadata: &PlanMetadata,
    ) -> anyhow::Result<()>;

    async fn save_calculations(&self, quiz_result_id: Uuid, calculations: &Value) -> anyhow::Result<()>;
}

pub struct PgPlanStore {
    db: PgPool,
}

impl PgPlanStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PlanStore for PgPlanStore {
    async fn init_status(&self, user_id: Uuid, quiz_result_id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO plan_status
                (user_id, quiz_result_id, meal_plan_status, workout_plan_status, updated_at)
            VALUES ($1, $2, 'generating', 'generating', now())
            ON CONFLICT (user_id) DO UPDATE
            SET quiz_result_id = EXCLUDED.quiz_result_id,
                meal_plan_status = 'generating',
                meal_plan_error = NULL,
                workout_plan_status = 'generating',
                workout_plan_error = NULL,
                updated_at = now()
            "#,
        )
        .bind(user_id)
        .bind(quiz_result_id)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn write_status(
        &self,
        user_id: Uuid,
        plan_type: PlanType,
        status: GenerationStatus,
        error: Option<&str>,
    ) -> anyhow::Result<()> {
        let sql = match plan_type {
            PlanType::Meal => {
                r#"
                UPDATE plan_status
                SET meal_plan_status = $2, meal_plan_error = $3, updated_at = now()
                WHERE user_id = $1
                "#
            }
            PlanType::Workout => {
                r#"
                UPDATE plan_status
                SET workout_plan_status = $2, workout_plan_error = $3, updated_at = now()
                WHERE user_id = $1
                "#
            }
        };
        sqlx::query(sql)
            .bind(user_id)
            .bind(status.as_str())
            .bind(error)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn read_status(&self, user_id: Uuid) -> anyhow::Result<Option<PlanStatusRow>> {
        let row = sqlx::query_as::<_, PlanStatusRow>(
            r#"
            SELECT user_id, quiz_result_id, meal_plan_status, meal_plan_error,
                   workout_plan_status, workout_plan_error, updated_at
            FROM plan_status
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn persist_plan(
        &self,
        user_id: Uuid,
        quiz_result_id: Uuid,
        plan_type: PlanType,
        payload: &Value,
        metadata: &PlanMetadata,
    ) -> anyhow::Result<()> {
        let mut tx = self.db.begin().await?;

        // Audit trail: older rows stay, only the active flag moves.
        sqlx::query(
            r#"
            UPDATE generated_plans
            SET is_active = false
            WHERE user_id = $1 AND plan_type = $2 AND is_active
            "#,
        )
        .bind(user_id)
        .bind(plan_type.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO generated_plans
                (id, user_id, quiz_result_id, plan_type, payload, metadata, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, true)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(quiz_result_id)
        .bind(plan_type.as_str())
        .bind(payload)
        .bind(serde_json::to_value(metadata)?)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn save_calculations(&self, quiz_result_id: Uuid, calculations: &Value) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE quiz_results
            SET calculations = $1
            WHERE id = $2
            "#,
        )
        .bind(calculations)
        .bind(quiz_result_id)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}

use crate::domain::{models::slot_config::SlotConfig, ports::SlotConfigRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

const DUPLICATE_ACTIVE: &str = "An active slot config already exists for this service and day";

pub struct PostgresSlotConfigRepo {
    pool: PgPool,
}

impl PostgresSlotConfigRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SlotConfigRepository for PostgresSlotConfigRepo {
    async fn create(&self, config: &SlotConfig) -> Result<SlotConfig, AppError> {
        sqlx::query_as::<_, SlotConfig>(
            "INSERT INTO slot_configs (id, service_id, day_of_week, start_time, end_time, slot_duration_minutes, gap_between_slots_minutes, max_bookings_per_slot, is_active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING *"
        )
            .bind(&config.id).bind(&config.service_id).bind(config.day_of_week)
            .bind(config.start_time).bind(config.end_time)
            .bind(config.slot_duration_minutes).bind(config.gap_between_slots_minutes).bind(config.max_bookings_per_slot)
            .bind(config.is_active).bind(config.created_at).bind(config.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::unique_violation_as_conflict(e, DUPLICATE_ACTIVE))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<SlotConfig>, AppError> {
        sqlx::query_as::<_, SlotConfig>("SELECT * FROM slot_configs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self, service_id: Option<&str>) -> Result<Vec<SlotConfig>, AppError> {
        sqlx::query_as::<_, SlotConfig>(
            "SELECT * FROM slot_configs WHERE ($1::text IS NULL OR service_id = $1) ORDER BY service_id ASC NULLS FIRST, day_of_week ASC NULLS FIRST, created_at ASC"
        )
            .bind(service_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_active_for_service(&self, service_id: Option<&str>) -> Result<Vec<SlotConfig>, AppError> {
        sqlx::query_as::<_, SlotConfig>(
            "SELECT * FROM slot_configs WHERE is_active AND (service_id IS NULL OR service_id = $1)"
        )
            .bind(service_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, config: &SlotConfig) -> Result<SlotConfig, AppError> {
        sqlx::query_as::<_, SlotConfig>(
            "UPDATE slot_configs SET service_id = $1, day_of_week = $2, start_time = $3, end_time = $4, slot_duration_minutes = $5,
                gap_between_slots_minutes = $6, max_bookings_per_slot = $7, is_active = $8, updated_at = $9
             WHERE id = $10
             RETURNING *"
        )
            .bind(&config.service_id).bind(config.day_of_week).bind(config.start_time).bind(config.end_time)
            .bind(config.slot_duration_minutes).bind(config.gap_between_slots_minutes).bind(config.max_bookings_per_slot)
            .bind(config.is_active).bind(config.updated_at)
            .bind(&config.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::unique_violation_as_conflict(e, DUPLICATE_ACTIVE))?
            .ok_or_else(|| AppError::NotFound(format!("Slot config {} not found", config.id)))
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM slot_configs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Slot config {} not found", id)));
        }
        Ok(())
    }
}

use crate::domain::{models::blackout::BlackoutDate, ports::BlackoutRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

pub struct PostgresBlackoutRepo {
    pool: PgPool,
}

impl PostgresBlackoutRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlackoutRepository for PostgresBlackoutRepo {
    async fn create(&self, blackout: &BlackoutDate) -> Result<BlackoutDate, AppError> {
        sqlx::query_as::<_, BlackoutDate>(
            "INSERT INTO slot_blackout_dates (id, blackout_date, service_id, reason, created_by, created_at) VALUES ($1, $2, $3, $4, $5, $6) RETURNING *"
        )
            .bind(&blackout.id)
            .bind(blackout.blackout_date)
            .bind(&blackout.service_id)
            .bind(&blackout.reason)
            .bind(&blackout.created_by)
            .bind(blackout.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::unique_violation_as_conflict(e, "A blackout already exists for this date and service"))
    }

    async fn list_by_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<BlackoutDate>, AppError> {
        sqlx::query_as::<_, BlackoutDate>(
            "SELECT * FROM slot_blackout_dates WHERE blackout_date BETWEEN $1 AND $2 ORDER BY blackout_date ASC"
        )
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn blacked_out_dates(&self, service_id: Option<&str>, start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>, AppError> {
        sqlx::query_scalar::<_, NaiveDate>(
            "SELECT DISTINCT blackout_date FROM slot_blackout_dates WHERE blackout_date BETWEEN $1 AND $2 AND (service_id IS NULL OR service_id = $3)"
        )
            .bind(start)
            .bind(end)
            .bind(service_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn is_blacked_out(&self, service_id: Option<&str>, date: NaiveDate) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM slot_blackout_dates WHERE blackout_date = $1 AND (service_id IS NULL OR service_id = $2))"
        )
            .bind(date)
            .bind(service_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM slot_blackout_dates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Blackout {} not found", id)));
        }
        Ok(())
    }
}

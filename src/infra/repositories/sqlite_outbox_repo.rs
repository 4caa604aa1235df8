use crate::domain::{models::notification::NotificationEvent, ports::NotificationOutboxRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

pub struct SqliteOutboxRepo {
    pool: SqlitePool,
}

impl SqliteOutboxRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Writes events on the caller's connection so they commit with its transaction.
pub(crate) async fn insert_events(conn: &mut SqliteConnection, events: &[NotificationEvent]) -> Result<(), AppError> {
    for event in events {
        sqlx::query(
            "INSERT INTO notification_events (id, booking_id, audience, recipient_id, event_type, payload, status, attempts, error_message, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
            .bind(&event.id)
            .bind(&event.booking_id)
            .bind(event.audience.as_str())
            .bind(&event.recipient_id)
            .bind(&event.event_type)
            .bind(&event.payload)
            .bind(&event.status)
            .bind(event.attempts)
            .bind(&event.error_message)
            .bind(event.created_at)
            .execute(&mut *conn)
            .await
            .map_err(AppError::Database)?;
    }
    Ok(())
}

#[async_trait]
impl NotificationOutboxRepository for SqliteOutboxRepo {
    async fn claim_pending(&self, limit: i32) -> Result<Vec<NotificationEvent>, AppError> {
        sqlx::query_as::<_, NotificationEvent>(
            "UPDATE notification_events SET status = 'PROCESSING', attempts = attempts + 1, claimed_at = ? WHERE id IN (SELECT id FROM notification_events WHERE status = 'PENDING' ORDER BY created_at ASC LIMIT ?) RETURNING *"
        )
            .bind(Utc::now())
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn requeue_stale(&self, max_attempts: i32, claimed_before: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        sqlx::query(
            "UPDATE notification_events SET status = 'FAILED', error_message = COALESCE(error_message, 'Abandoned while processing') WHERE status = 'PROCESSING' AND attempts >= ? AND claimed_at < ?"
        )
            .bind(max_attempts)
            .bind(claimed_before)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let requeued = sqlx::query(
            "UPDATE notification_events SET status = 'PENDING' WHERE status IN ('FAILED', 'PROCESSING') AND attempts < ? AND claimed_at < ?"
        )
            .bind(max_attempts)
            .bind(claimed_before)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .rows_affected();

        tx.commit().await.map_err(AppError::Database)?;
        Ok(requeued)
    }

    async fn mark_sent(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE notification_events SET status = 'SENT', error_message = NULL WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn mark_failed(&self, id: &str, error_message: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE notification_events SET status = 'FAILED', error_message = ? WHERE id = ?")
            .bind(error_message)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn list_recent(&self, status: Option<&str>, limit: i32) -> Result<Vec<NotificationEvent>, AppError> {
        sqlx::query_as::<_, NotificationEvent>(
            "SELECT * FROM notification_events WHERE (? IS NULL OR status = ?) ORDER BY created_at DESC LIMIT ?"
        )
            .bind(status)
            .bind(status)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}

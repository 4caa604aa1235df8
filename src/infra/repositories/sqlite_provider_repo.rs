use crate::domain::{models::provider::Provider, ports::ProviderDirectory};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Reads the `providers` table owned by the onboarding subsystem.
pub struct SqliteProviderRepo {
    pool: SqlitePool,
}

impl SqliteProviderRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProviderDirectory for SqliteProviderRepo {
    async fn get_provider(&self, id: &str) -> Result<Option<Provider>, AppError> {
        sqlx::query_as::<_, Provider>("SELECT id, status FROM providers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}

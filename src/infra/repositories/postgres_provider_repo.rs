use crate::domain::{models::provider::Provider, ports::ProviderDirectory};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

/// Reads the `providers` table owned by the onboarding subsystem.
pub struct PostgresProviderRepo {
    pool: PgPool,
}

impl PostgresProviderRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProviderDirectory for PostgresProviderRepo {
    async fn get_provider(&self, id: &str) -> Result<Option<Provider>, AppError> {
        sqlx::query_as::<_, Provider>("SELECT id, status FROM providers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}

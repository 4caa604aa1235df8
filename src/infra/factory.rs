use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::state::{AppState, Repositories};
use crate::domain::services::notification_templates::NotificationTemplates;
use crate::infra::notifications::http_notification_dispatcher::HttpNotificationDispatcher;
use crate::infra::payments::razorpay_gateway::RazorpayGateway;
use crate::infra::repositories::{
    postgres_blackout_repo::PostgresBlackoutRepo, postgres_booking_repo::PostgresBookingRepo,
    postgres_outbox_repo::PostgresOutboxRepo, postgres_provider_repo::PostgresProviderRepo,
    postgres_slot_config_repo::PostgresSlotConfigRepo,
    sqlite_blackout_repo::SqliteBlackoutRepo, sqlite_booking_repo::SqliteBookingRepo,
    sqlite_outbox_repo::SqliteOutboxRepo, sqlite_provider_repo::SqliteProviderRepo,
    sqlite_slot_config_repo::SqliteSlotConfigRepo,
};

const SLOW_STATEMENT: Duration = Duration::from_millis(500);

fn is_postgres_url(url: &str) -> bool {
    url.starts_with("postgres://") || url.starts_with("postgresql://")
}

pub async fn bootstrap_state(config: &Config) -> AppState {
    let templates = NotificationTemplates::new().expect("Failed to load notification templates");
    let notification_dispatcher = Arc::new(HttpNotificationDispatcher::new(
        config.notification_service_url.clone(),
        config.notification_service_token.clone(),
        templates,
    ));
    let payment_gateway = Arc::new(RazorpayGateway::new(
        config.razorpay_api_url.clone(),
        config.razorpay_key_id.clone(),
        config.razorpay_key_secret.clone(),
    ));

    let repos = if is_postgres_url(&config.database_url) {
        postgres_repositories(&connect_postgres(&config.database_url).await)
    } else {
        sqlite_repositories(&connect_sqlite(&config.database_url).await)
    };

    AppState::assemble(config.clone(), repos, payment_gateway, notification_dispatcher)
}

async fn connect_postgres(url: &str) -> PgPool {
    info!("Initializing PostgreSQL connection...");

    let opts = url
        .parse::<PgConnectOptions>()
        .expect("Invalid Postgres URL")
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, SLOW_STATEMENT);

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect_with(opts)
        .await
        .expect("Failed to connect to Postgres");

    sqlx::migrate!("./migrations/postgres")
        .run(&pool)
        .await
        .expect("Failed to run Postgres migrations");
    pool
}

/// WAL plus a busy timeout lets concurrent booking transactions queue on the
/// write lock instead of failing with SQLITE_BUSY.
async fn connect_sqlite(url: &str) -> SqlitePool {
    info!("Initializing SQLite connection with WAL Mode...");

    let opts = SqliteConnectOptions::from_str(url)
        .expect("Invalid SQLite connection string")
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, SLOW_STATEMENT);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
        .expect("Failed to connect to SQLite");

    sqlx::migrate!("./migrations/sqlite")
        .run(&pool)
        .await
        .expect("Failed to run SQLite migrations");
    pool
}

pub fn postgres_repositories(pool: &PgPool) -> Repositories {
    Repositories {
        slot_config_repo: Arc::new(PostgresSlotConfigRepo::new(pool.clone())),
        blackout_repo: Arc::new(PostgresBlackoutRepo::new(pool.clone())),
        booking_repo: Arc::new(PostgresBookingRepo::new(pool.clone())),
        outbox_repo: Arc::new(PostgresOutboxRepo::new(pool.clone())),
        provider_directory: Arc::new(PostgresProviderRepo::new(pool.clone())),
    }
}

pub fn sqlite_repositories(pool: &SqlitePool) -> Repositories {
    Repositories {
        slot_config_repo: Arc::new(SqliteSlotConfigRepo::new(pool.clone())),
        blackout_repo: Arc::new(SqliteBlackoutRepo::new(pool.clone())),
        booking_repo: Arc::new(SqliteBookingRepo::new(pool.clone())),
        outbox_repo: Arc::new(SqliteOutboxRepo::new(pool.clone())),
        provider_directory: Arc::new(SqliteProviderRepo::new(pool.clone())),
    }
}

use home_services_booking::{
    api::router::create_router,
    config::Config,
    domain::models::notification::NotificationPayload,
    domain::ports::{NotificationDispatcher, PaymentGateway, PaymentOrder},
    error::AppError,
    infra::factory::sqlite_repositories,
    state::AppState,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use async_trait::async_trait;
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, Utc, Weekday};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const ADMIN_KEY: &str = "test-admin-key";
pub const VALID_SIGNATURE: &str = "valid-signature";

#[derive(Default)]
pub struct MockPaymentGateway {
    pub unavailable: AtomicBool,
    pub refunds: Mutex<Vec<(String, Option<i64>)>>,
    /// When set, `refund` cancels the paid booking behind the caller's back.
    pub cancel_during_refund: Mutex<Option<Pool<Sqlite>>>,
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_order(&self, amount: i64, currency: &str, receipt: &str) -> Result<PaymentOrder, AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Dependency("gateway down".into()));
        }
        Ok(PaymentOrder {
            id: format!("order_{}", receipt),
            amount,
            currency: currency.to_string(),
        })
    }

    async fn verify_signature(&self, _order_id: &str, _payment_id: &str, signature: &str) -> Result<bool, AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Dependency("gateway down".into()));
        }
        Ok(signature == VALID_SIGNATURE)
    }

    async fn refund(&self, payment_id: &str, amount: Option<i64>) -> Result<String, AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Dependency("gateway down".into()));
        }
        self.refunds.lock().unwrap().push((payment_id.to_string(), amount));
        let racing_pool = self.cancel_during_refund.lock().unwrap().take();
        if let Some(pool) = racing_pool {
            sqlx::query("UPDATE bookings SET status = 'cancelled' WHERE payment_id = ?")
                .bind(payment_id)
                .execute(&pool)
                .await
                .unwrap();
        }
        Ok(format!("rfnd_{}", payment_id))
    }
}

/// Records every delivery as "audience:recipient:event_type".
#[derive(Default)]
pub struct MockDispatcher {
    pub failing: AtomicBool,
    pub delivered: Mutex<Vec<String>>,
}

impl MockDispatcher {
    fn record(&self, entry: String) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Dependency("relay unreachable".into()));
        }
        self.delivered.lock().unwrap().push(entry);
        Ok(())
    }
}

#[async_trait]
impl NotificationDispatcher for MockDispatcher {
    async fn notify_provider(&self, provider_id: &str, event_type: &str, _payload: &NotificationPayload) -> Result<(), AppError> {
        self.record(format!("provider:{}:{}", provider_id, event_type))
    }

    async fn notify_user(&self, user_id: &str, event_type: &str, _payload: &NotificationPayload) -> Result<(), AppError> {
        self.record(format!("user:{}:{}", user_id, event_type))
    }

    async fn notify_admins(&self, event_type: &str, _payload: &NotificationPayload) -> Result<(), AppError> {
        self.record(format!("admins:-:{}", event_type))
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub gateway: Arc<MockPaymentGateway>,
    pub dispatcher: Arc<MockDispatcher>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url,
            port: 0,
            business_timezone: chrono_tz::UTC,
            admin_api_key: ADMIN_KEY.to_string(),
            notification_service_url: "http://localhost".to_string(),
            notification_service_token: "token".to_string(),
            razorpay_api_url: "http://localhost".to_string(),
            razorpay_key_id: "rzp_test_key".to_string(),
            razorpay_key_secret: "secret".to_string(),
            outbox_poll_seconds: 1,
        };

        let repos = sqlite_repositories(&pool);

        let gateway = Arc::new(MockPaymentGateway::default());
        let dispatcher = Arc::new(MockDispatcher::default());
        let state = Arc::new(AppState::assemble(config, repos, gateway.clone(), dispatcher.clone()));
        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            gateway,
            dispatcher,
        }
    }

    pub async fn send(&self, method: &str, uri: &str, headers: &[(&str, &str)], body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, parse_body(response).await)
    }

    pub async fn admin(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(method, uri, &[("X-Admin-Key", ADMIN_KEY)], body).await
    }

    pub async fn customer(&self, user_id: &str, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(method, uri, &[("X-User-Id", user_id)], body).await
    }

    pub async fn provider(&self, provider_id: &str, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(method, uri, &[("X-Provider-Id", provider_id)], body).await
    }

    pub async fn seed_provider(&self, id: &str, status: &str) {
        sqlx::query("INSERT INTO providers (id, status) VALUES (?, ?)")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await
            .expect("Failed to seed provider");
    }

    /// Creates an active slot config for `service_id` on every day.
    pub async fn seed_config(&self, service_id: &str, start: &str, end: &str, duration: i32, capacity: i32) -> Value {
        let (status, body) = self.admin("POST", "/api/v1/admin/slot-configs", Some(json!({
            "service_id": service_id,
            "start_time": start,
            "end_time": end,
            "slot_duration_minutes": duration,
            "max_bookings_per_slot": capacity
        }))).await;
        assert_eq!(status, StatusCode::CREATED, "seed_config failed: {}", body);
        body
    }

    /// Books `service_id` at `date`/`time_slot` and returns the raw response.
    pub async fn book(&self, user_id: &str, service_id: &str, date: &str, time_slot: &str, payment_method: &str) -> (StatusCode, Value) {
        self.customer(user_id, "POST", "/api/v1/bookings", Some(booking_payload(service_id, date, time_slot, payment_method))).await
    }

    pub async fn booking_status(&self, id: &str) -> Value {
        let (status, body) = self.admin("GET", &format!("/api/v1/bookings/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        body
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}

pub async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

#[allow(dead_code)]
pub fn service_json(service_id: &str) -> Value {
    json!({
        "service_id": service_id,
        "name": "Deep Cleaning",
        "quantity": 1,
        "price": 49900,
        "category": "cleaning",
        "image_url": null
    })
}

#[allow(dead_code)]
pub fn address_json() -> Value {
    json!({
        "line1": "12 MG Road",
        "line2": null,
        "city": "Bengaluru",
        "state": "Karnataka",
        "pincode": "560001"
    })
}

#[allow(dead_code)]
pub fn booking_payload(service_id: &str, date: &str, time_slot: &str, payment_method: &str) -> Value {
    json!({
        "service": service_json(service_id),
        "date": date,
        "time_slot": time_slot,
        "address": address_json(),
        "payment_method": payment_method
    })
}

/// A date `days` ahead of today (UTC, the test business timezone).
#[allow(dead_code)]
pub fn days_ahead(days: i64) -> NaiveDate {
    Utc::now().date_naive() + ChronoDuration::days(days)
}

/// The first `weekday` strictly after tomorrow.
#[allow(dead_code)]
pub fn next_weekday(weekday: Weekday) -> NaiveDate {
    let mut date = days_ahead(2);
    while date.weekday() != weekday {
        date += ChronoDuration::days(1);
    }
    date
}

use crate::domain::models::{
    blackout::BlackoutDate,
    booking::{Booking, BookingStatus, PaymentStatus},
    notification::{NotificationEvent, NotificationPayload},
    provider::Provider,
    slot_config::SlotConfig,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[async_trait]
pub trait SlotConfigRepository: Send + Sync {
    async fn create(&self, config: &SlotConfig) -> Result<SlotConfig, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<SlotConfig>, AppError>;
    async fn list(&self, service_id: Option<&str>) -> Result<Vec<SlotConfig>, AppError>;
    /// Active rows that can apply to `service_id`: its own plus the global ones.
    async fn list_active_for_service(&self, service_id: Option<&str>) -> Result<Vec<SlotConfig>, AppError>;
    async fn update(&self, config: &SlotConfig) -> Result<SlotConfig, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait BlackoutRepository: Send + Sync {
    async fn create(&self, blackout: &BlackoutDate) -> Result<BlackoutDate, AppError>;
    async fn list_by_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<BlackoutDate>, AppError>;
    /// Dates in `[start, end]` closed for `service_id`, global rows included.
    async fn blacked_out_dates(&self, service_id: Option<&str>, start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>, AppError>;
    async fn is_blacked_out(&self, service_id: Option<&str>, date: NaiveDate) -> Result<bool, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

/// A booking to insert together with the capacity of its slot.
#[derive(Debug, Clone)]
pub struct GuardedBooking {
    pub booking: Booking,
    pub capacity: i32,
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserts every booking and `events` in one transaction, rolling back if
    /// any slot ends up above its capacity.
    async fn insert_guarded(&self, items: &[GuardedBooking], events: Vec<NotificationEvent>) -> Result<Vec<Booking>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Booking>, AppError>;
    async fn list_by_provider(&self, provider_id: &str) -> Result<Vec<Booking>, AppError>;
    async fn list_by_batch(&self, batch_id: &str) -> Result<Vec<Booking>, AppError>;
    async fn list_filtered(&self, date: Option<NaiveDate>, status: Option<BookingStatus>) -> Result<Vec<Booking>, AppError>;
    async fn count_occupied(
        &self,
        date: NaiveDate,
        slot_start_minute: i32,
        service_id: Option<&str>,
        provider_id: Option<&str>,
    ) -> Result<i64, AppError>;
    /// Compare-and-set on (status, payment_status). `Ok(None)` means the row
    /// moved on since it was read.
    async fn apply_transition(
        &self,
        updated: &Booking,
        expected_status: BookingStatus,
        expected_payment: PaymentStatus,
        events: Vec<NotificationEvent>,
    ) -> Result<Option<Booking>, AppError>;
    /// Moves a booking to a new slot, guarded like `insert_guarded`.
    async fn reschedule_guarded(
        &self,
        updated: &Booking,
        expected_status: BookingStatus,
        capacity: i32,
        events: Vec<NotificationEvent>,
    ) -> Result<Option<Booking>, AppError>;
}

#[async_trait]
pub trait NotificationOutboxRepository: Send + Sync {
    /// Moves up to `limit` pending events to PROCESSING and returns them.
    async fn claim_pending(&self, limit: i32) -> Result<Vec<NotificationEvent>, AppError>;
    /// Puts FAILED events and PROCESSING events left by a dead worker back to
    /// PENDING when they were claimed before `claimed_before` and have fewer
    /// than `max_attempts` attempts. Stale PROCESSING events at the cap become
    /// FAILED. Returns how many events were re-queued.
    async fn requeue_stale(&self, max_attempts: i32, claimed_before: DateTime<Utc>) -> Result<u64, AppError>;
    async fn mark_sent(&self, id: &str) -> Result<(), AppError>;
    async fn mark_failed(&self, id: &str, error_message: &str) -> Result<(), AppError>;
    async fn list_recent(&self, status: Option<&str>, limit: i32) -> Result<Vec<NotificationEvent>, AppError>;
}

#[async_trait]
pub trait ProviderDirectory: Send + Sync {
    async fn get_provider(&self, id: &str) -> Result<Option<Provider>, AppError>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, amount: i64, currency: &str, receipt: &str) -> Result<PaymentOrder, AppError>;
    async fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> Result<bool, AppError>;
    /// Returns the gateway's refund reference.
    async fn refund(&self, payment_id: &str, amount: Option<i64>) -> Result<String, AppError>;
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify_provider(&self, provider_id: &str, event_type: &str, payload: &NotificationPayload) -> Result<(), AppError>;
    async fn notify_user(&self, user_id: &str, event_type: &str, payload: &NotificationPayload) -> Result<(), AppError>;
    async fn notify_admins(&self, event_type: &str, payload: &NotificationPayload) -> Result<(), AppError>;
}

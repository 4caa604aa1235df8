use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use crate::error::AppError;

pub const STATUS_PENDING: &str = "PENDING";
pub const STATUS_PROCESSING: &str = "PROCESSING";
pub const STATUS_SENT: &str = "SENT";
pub const STATUS_FAILED: &str = "FAILED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    Provider,
    User,
    Admins,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Provider => "provider",
            Audience::User => "user",
            Audience::Admins => "admins",
        }
    }
}

impl TryFrom<String> for Audience {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "provider" => Ok(Audience::Provider),
            "user" => Ok(Audience::User),
            "admins" => Ok(Audience::Admins),
            _ => Err(AppError::InternalWithMsg(format!("Unknown notification audience '{}'", value))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingCreated,
    BookingConfirmed,
    BookingAssigned,
    BookingStarted,
    BookingCompleted,
    BookingCancelled,
    ProviderCancelled,
    BookingRescheduled,
    PaymentUpdated,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::BookingCreated => "booking_created",
            NotificationKind::BookingConfirmed => "booking_confirmed",
            NotificationKind::BookingAssigned => "booking_assigned",
            NotificationKind::BookingStarted => "booking_started",
            NotificationKind::BookingCompleted => "booking_completed",
            NotificationKind::BookingCancelled => "booking_cancelled",
            NotificationKind::ProviderCancelled => "provider_cancelled",
            NotificationKind::BookingRescheduled => "booking_rescheduled",
            NotificationKind::PaymentUpdated => "payment_updated",
        }
    }
}

/// Snapshot of the booking at the moment the event was recorded, so the
/// dispatcher never has to re-read a row that may have moved on.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NotificationPayload {
    pub booking_id: String,
    pub status: String,
    pub payment_status: String,
    pub service_name: String,
    pub booking_date: String,
    pub time_slot: String,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct NotificationEvent {
    pub id: String,
    pub booking_id: Option<String>,
    #[sqlx(try_from = "String")]
    pub audience: Audience,
    pub recipient_id: Option<String>,
    pub event_type: String,
    pub payload: Json<NotificationPayload>,
    pub status: String,
    pub attempts: i32,
    pub error_message: Option<String>,
    /// Last time a worker picked the event up.
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn new(audience: Audience, recipient_id: Option<String>, kind: NotificationKind, payload: NotificationPayload) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            booking_id: Some(payload.booking_id.clone()),
            audience,
            recipient_id,
            event_type: kind.as_str().to_string(),
            payload: Json(payload),
            status: STATUS_PENDING.to_string(),
            attempts: 0,
            error_message: None,
            claimed_at: None,
            created_at: Utc::now(),
        }
    }
}

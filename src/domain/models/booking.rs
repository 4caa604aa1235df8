use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use crate::domain::models::slot::SlotWindow;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
    ProviderCancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 7] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Assigned,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
        BookingStatus::ProviderCancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Assigned => "assigned",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::ProviderCancelled => "provider_cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// `provider_cancelled` keeps its slot: the customer's commitment survives
    /// until an admin reassigns or cancels it.
    pub fn occupies_capacity(&self) -> bool {
        !self.is_terminal()
    }

    /// Statuses excluded from capacity counting, as stored in the database.
    pub fn released() -> [&'static str; 2] {
        [BookingStatus::Completed.as_str(), BookingStatus::Cancelled.as_str()]
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending | Confirmed | ProviderCancelled, Assigned)
                | (Pending | Confirmed | Assigned, InProgress)
                | (InProgress, Completed)
                | (Pending | Confirmed | Assigned | InProgress | ProviderCancelled, Cancelled)
                | (Confirmed | Assigned | InProgress, ProviderCancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Unknown booking status '{}'", s)))
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Paid)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
                | (PaymentStatus::Paid, PaymentStatus::Refunded)
        )
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            _ => Err(AppError::Validation(format!("Unknown payment status '{}'", s))),
        }
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cod,
    Online,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::Online => "online",
        }
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "cod" => Ok(PaymentMethod::Cod),
            "online" => Ok(PaymentMethod::Online),
            _ => Err(AppError::Validation(format!("Unknown payment method '{}'", value))),
        }
    }
}

/// Service details frozen at booking time.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct ServiceSnapshot {
    pub service_id: String,
    #[sqlx(rename = "service_name")]
    pub name: String,
    #[sqlx(rename = "service_quantity")]
    pub quantity: i32,
    /// Unit price in minor currency units.
    #[sqlx(rename = "service_price")]
    pub price: i64,
    #[sqlx(rename = "service_category")]
    pub category: String,
    #[sqlx(rename = "service_image_url")]
    pub image_url: Option<String>,
}

impl ServiceSnapshot {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.service_id.trim().is_empty() || self.name.trim().is_empty() {
            return Err(AppError::Validation("Service id and name are required".into()));
        }
        if self.quantity < 1 {
            return Err(AppError::Validation("Service quantity must be at least 1".into()));
        }
        if self.price < 0 {
            return Err(AppError::Validation("Service price cannot be negative".into()));
        }
        self.subtotal()?;
        Ok(())
    }

    pub fn subtotal(&self) -> Result<i64, AppError> {
        self.price
            .checked_mul(i64::from(self.quantity))
            .ok_or_else(amount_too_large)
    }
}

fn amount_too_large() -> AppError {
    AppError::Validation("Booking amount is too large".into())
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct DeliveryAddress {
    #[sqlx(rename = "address_line1")]
    pub line1: String,
    #[sqlx(rename = "address_line2")]
    pub line2: Option<String>,
    #[sqlx(rename = "address_city")]
    pub city: String,
    #[sqlx(rename = "address_state")]
    pub state: String,
    #[sqlx(rename = "address_pincode")]
    pub pincode: String,
}

impl DeliveryAddress {
    pub fn validate(&self) -> Result<(), AppError> {
        let missing: Vec<&str> = [
            ("line1", &self.line1),
            ("city", &self.city),
            ("state", &self.state),
            ("pincode", &self.pincode),
        ]
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect();

        if !missing.is_empty() {
            return Err(AppError::Validation(format!("Delivery address is missing: {}", missing.join(", "))));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub batch_id: Option<String>,
    pub user_id: String,
    #[sqlx(flatten)]
    pub service: ServiceSnapshot,
    pub total_amount: i64,
    pub currency: String,
    #[sqlx(flatten)]
    pub address: DeliveryAddress,
    pub booking_date: NaiveDate,
    pub slot_start_minute: i32,
    pub slot_duration_minutes: i32,
    pub time_slot: String,
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
    pub provider_id: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    #[sqlx(try_from = "String")]
    pub payment_status: PaymentStatus,
    #[sqlx(try_from = "String")]
    pub payment_method: PaymentMethod,
    pub payment_order_id: Option<String>,
    pub payment_id: Option<String>,
    pub discount_amount: i64,
    pub tip_amount: i64,
    pub customer_notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

pub struct NewBookingParams {
    pub batch_id: Option<String>,
    pub user_id: String,
    pub service: ServiceSnapshot,
    pub address: DeliveryAddress,
    pub booking_date: NaiveDate,
    pub window: SlotWindow,
    pub provider_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub currency: String,
    pub discount_amount: i64,
    pub tip_amount: i64,
    pub customer_notes: Option<String>,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Result<Self, AppError> {
        let now = Utc::now();
        let total_amount = params.service.subtotal()?
            .saturating_sub(params.discount_amount)
            .max(0)
            .checked_add(params.tip_amount)
            .ok_or_else(amount_too_large)?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            batch_id: params.batch_id,
            user_id: params.user_id,
            service: params.service,
            total_amount,
            currency: params.currency,
            address: params.address,
            booking_date: params.booking_date,
            slot_start_minute: params.window.start_minute,
            slot_duration_minutes: params.window.duration_minutes,
            time_slot: params.window.label(),
            status: BookingStatus::Pending,
            provider_id: params.provider_id,
            assigned_at: None,
            payment_status: PaymentStatus::Pending,
            payment_method: params.payment_method,
            payment_order_id: None,
            payment_id: None,
            discount_amount: params.discount_amount,
            tip_amount: params.tip_amount,
            customer_notes: params.customer_notes,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
            cancelled_at: None,
        })
    }

    pub fn window(&self) -> SlotWindow {
        SlotWindow::new(self.slot_start_minute, self.slot_duration_minutes)
    }

    /// Key serialising capacity checks for one (service, date, slot).
    pub fn capacity_key(&self) -> String {
        format!("{}|{}|{}", self.service.service_id, self.booking_date, self.slot_start_minute)
    }
}

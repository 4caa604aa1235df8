use serde::{Deserialize, Deserializer};
use crate::domain::models::booking::{DeliveryAddress, PaymentMethod, ServiceSnapshot};

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: String,
    pub service_id: Option<String>,
    pub provider_id: Option<String>,
}

#[derive(Deserialize)]
pub struct AvailabilityRangeQuery {
    pub start_date: String,
    pub end_date: String,
    pub service_id: Option<String>,
    pub provider_id: Option<String>,
}

#[derive(Deserialize)]
pub struct SlotCheckQuery {
    pub date: String,
    pub time_slot: String,
    pub service_id: Option<String>,
    pub provider_id: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub service: ServiceSnapshot,
    pub date: String,
    pub time_slot: String,
    pub address: DeliveryAddress,
    pub payment_method: PaymentMethod,
    pub provider_id: Option<String>,
    pub discount_amount: Option<i64>,
    pub tip_amount: Option<i64>,
    pub customer_notes: Option<String>,
}

#[derive(Deserialize)]
pub struct BatchItemRequest {
    pub service: ServiceSnapshot,
    pub date: String,
    pub time_slot: String,
    pub provider_id: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateBatchRequest {
    pub items: Vec<BatchItemRequest>,
    pub address: DeliveryAddress,
    pub payment_method: PaymentMethod,
    pub discount_total: Option<i64>,
    pub tip_total: Option<i64>,
    pub customer_notes: Option<String>,
}

#[derive(Deserialize)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct RescheduleRequest {
    pub date: String,
    pub time_slot: String,
}

#[derive(Deserialize)]
pub struct VerifyPaymentRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

#[derive(Deserialize)]
pub struct CodPaymentRequest {
    pub payment_status: String,
}

#[derive(Deserialize)]
pub struct AdminStatusRequest {
    pub status: String,
    pub provider_id: Option<String>,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct AssignProviderRequest {
    pub provider_id: String,
}

#[derive(Deserialize)]
pub struct RefundRequest {
    pub amount: Option<i64>,
}

#[derive(Deserialize)]
pub struct AdminBookingsQuery {
    pub date: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct SlotConfigQuery {
    pub service_id: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateSlotConfigRequest {
    pub service_id: Option<String>,
    pub day_of_week: Option<i32>,
    pub start_time: String,
    pub end_time: String,
    pub slot_duration_minutes: i32,
    pub gap_between_slots_minutes: Option<i32>,
    pub max_bookings_per_slot: i32,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
pub struct UpdateSlotConfigRequest {
    #[serde(default, deserialize_with = "nullable")]
    pub service_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub day_of_week: Option<Option<i32>>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub slot_duration_minutes: Option<i32>,
    pub gap_between_slots_minutes: Option<i32>,
    pub max_bookings_per_slot: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
pub struct CreateBlackoutRequest {
    pub date: String,
    pub service_id: Option<String>,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct BlackoutRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Deserialize)]
pub struct NotificationsQuery {
    pub status: Option<String>,
    pub limit: Option<i32>,
}

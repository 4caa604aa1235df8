use serde::Serialize;
use crate::domain::models::slot::Slot;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct SlotCheckResponse {
    pub date: String,
    pub time_slot: String,
    pub is_available: bool,
    /// Absent when the requested time is not an offered window.
    pub slot: Option<Slot>,
}

#[derive(Serialize)]
pub struct PaymentOrderResponse {
    pub booking_id: String,
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
}

use std::sync::Arc;
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;
use crate::domain::models::booking::{Booking, DeliveryAddress, PaymentMethod, ServiceSnapshot};
use crate::domain::services::booking_service::{BookingRequest, BookingService};
use crate::error::AppError;

pub const MAX_BATCH_ITEMS: usize = 20;

#[derive(Debug, Clone)]
pub struct BatchItem {
    pub service: ServiceSnapshot,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub provider_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub items: Vec<BatchItem>,
    pub address: DeliveryAddress,
    pub payment_method: PaymentMethod,
    pub discount_total: i64,
    pub tip_total: i64,
    pub customer_notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub batch_id: String,
    pub bookings: Vec<Booking>,
}

/// Checks out a whole cart: one booking per item, all or nothing.
pub struct BatchBookingCoordinator {
    booking_service: Arc<BookingService>,
}

impl BatchBookingCoordinator {
    pub fn new(booking_service: Arc<BookingService>) -> Self {
        Self { booking_service }
    }

    pub async fn create_batch(&self, user_id: &str, request: BatchRequest) -> Result<BatchResult, AppError> {
        let count = request.items.len();
        if count == 0 {
            return Err(AppError::Validation("Cart is empty".into()));
        }
        if count > MAX_BATCH_ITEMS {
            return Err(AppError::Validation(format!("A cart can hold at most {} items", MAX_BATCH_ITEMS)));
        }
        if request.discount_total < 0 || request.tip_total < 0 {
            return Err(AppError::Validation("Discount and tip cannot be negative".into()));
        }
        request.address.validate()?;
        for (index, item) in request.items.iter().enumerate() {
            item.service.validate().map_err(|e| for_item(index, e))?;
        }

        let batch_id = Uuid::new_v4().to_string();
        let discounts = split_evenly(request.discount_total, count);
        let tips = split_evenly(request.tip_total, count);

        let mut prepared = Vec::with_capacity(count);
        for (index, item) in request.items.into_iter().enumerate() {
            let booking_request = BookingRequest {
                service: item.service,
                date: item.date,
                time: item.time,
                address: request.address.clone(),
                payment_method: request.payment_method,
                provider_id: item.provider_id,
                discount_amount: discounts[index],
                tip_amount: tips[index],
                customer_notes: request.customer_notes.clone(),
            };
            let guarded = self.booking_service
                .prepare(user_id, booking_request, Some(batch_id.clone()))
                .await
                .map_err(|e| for_item(index, e))?;
            prepared.push(guarded);
        }

        let bookings = self.booking_service.insert(prepared).await?;
        info!(batch_id = %batch_id, items = bookings.len(), "Batch checkout committed");

        Ok(BatchResult { batch_id, bookings })
    }
}

/// Even split in minor units; the first `total % parts` shares get one extra.
pub fn split_evenly(total: i64, parts: usize) -> Vec<i64> {
    if parts == 0 {
        return Vec::new();
    }
    let n = parts as i64;
    let base = total / n;
    let remainder = total % n;
    (0..n).map(|i| if i < remainder { base + 1 } else { base }).collect()
}

fn for_item(index: usize, err: AppError) -> AppError {
    match err {
        AppError::Validation(msg) => AppError::Validation(format!("Item {}: {}", index + 1, msg)),
        AppError::Conflict(msg) => AppError::Conflict(format!("Item {}: {}", index + 1, msg)),
        other => other,
    }
}

use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::info;
use crate::api::dtos::{
    requests::{CancelBookingRequest, CreateBatchRequest, CreateBookingRequest, RescheduleRequest, VerifyPaymentRequest},
    responses::PaymentOrderResponse,
};
use crate::api::extractors::identity::{Caller, CustomerId};
use crate::domain::models::booking::Booking;
use crate::domain::models::slot::{parse_date, parse_time_slot};
use crate::domain::services::batch::{BatchItem, BatchRequest, BatchResult};
use crate::domain::services::booking_service::{Actor, BookingRequest};
use crate::error::AppError;
use crate::state::AppState;

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    CustomerId(user_id): CustomerId,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let request = BookingRequest {
        service: payload.service,
        date: parse_date(&payload.date)?,
        time: parse_time_slot(&payload.time_slot)?,
        address: payload.address,
        payment_method: payload.payment_method,
        provider_id: payload.provider_id,
        discount_amount: payload.discount_amount.unwrap_or(0),
        tip_amount: payload.tip_amount.unwrap_or(0),
        customer_notes: payload.customer_notes,
    };

    let booking = state.booking_service.create(&user_id, request).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn create_batch(
    State(state): State<Arc<AppState>>,
    CustomerId(user_id): CustomerId,
    Json(payload): Json<CreateBatchRequest>,
) -> Result<(StatusCode, Json<BatchResult>), AppError> {
    info!("Batch booking with {} items for user {}", payload.items.len(), user_id);

    let mut items = Vec::with_capacity(payload.items.len());
    for (index, item) in payload.items.into_iter().enumerate() {
        let prefix = |e: AppError| match e {
            AppError::Validation(msg) => AppError::Validation(format!("Item {}: {}", index + 1, msg)),
            other => other,
        };
        items.push(BatchItem {
            service: item.service,
            date: parse_date(&item.date).map_err(prefix)?,
            time: parse_time_slot(&item.time_slot).map_err(prefix)?,
            provider_id: item.provider_id,
        });
    }

    let request = BatchRequest {
        items,
        address: payload.address,
        payment_method: payload.payment_method,
        discount_total: payload.discount_total.unwrap_or(0),
        tip_total: payload.tip_total.unwrap_or(0),
        customer_notes: payload.customer_notes,
    };

    let result = state.batch_coordinator.create_batch(&user_id, request).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn list_my_bookings(
    State(state): State<Arc<AppState>>,
    CustomerId(user_id): CustomerId,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.booking_service.list_for_user(&user_id).await?))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
    Path(booking_id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.booking_service.get(&booking_id, &actor).await?))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    CustomerId(user_id): CustomerId,
    Path(booking_id): Path<String>,
    payload: Option<Json<CancelBookingRequest>>,
) -> Result<Json<Booking>, AppError> {
    let reason = payload.and_then(|Json(body)| body.reason);
    let booking = state.booking_service
        .cancel(&booking_id, &Actor::Customer(user_id), reason)
        .await?;
    Ok(Json(booking))
}

pub async fn reschedule_booking(
    State(state): State<Arc<AppState>>,
    CustomerId(user_id): CustomerId,
    Path(booking_id): Path<String>,
    Json(payload): Json<RescheduleRequest>,
) -> Result<Json<Booking>, AppError> {
    let date = parse_date(&payload.date)?;
    let time = parse_time_slot(&payload.time_slot)?;
    Ok(Json(state.booking_service.reschedule(&booking_id, &user_id, date, time).await?))
}

pub async fn create_payment_order(
    State(state): State<Arc<AppState>>,
    CustomerId(user_id): CustomerId,
    Path(booking_id): Path<String>,
) -> Result<(StatusCode, Json<PaymentOrderResponse>), AppError> {
    let (booking, order) = state.booking_service.create_payment_order(&booking_id, &user_id).await?;
    Ok((StatusCode::CREATED, Json(PaymentOrderResponse {
        booking_id: booking.id,
        order_id: order.id,
        amount: order.amount,
        currency: order.currency,
        key_id: state.config.razorpay_key_id.clone(),
    })))
}

pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    CustomerId(user_id): CustomerId,
    Path(booking_id): Path<String>,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.booking_service
        .verify_payment(&booking_id, &user_id, &payload.order_id, &payload.payment_id, &payload.signature)
        .await?;
    Ok(Json(booking))
}

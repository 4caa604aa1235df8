use axum::{extract::{Path, State}, Json};
use std::sync::Arc;
use crate::api::dtos::requests::{CancelBookingRequest, CodPaymentRequest};
use crate::api::extractors::identity::ProviderId;
use crate::domain::models::booking::{Booking, PaymentStatus};
use crate::error::AppError;
use crate::state::AppState;

pub async fn list_assigned(
    State(state): State<Arc<AppState>>,
    ProviderId(provider_id): ProviderId,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.booking_service.list_for_provider(&provider_id).await?))
}

pub async fn start_job(
    State(state): State<Arc<AppState>>,
    ProviderId(provider_id): ProviderId,
    Path(booking_id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.booking_service.start(&booking_id, Some(&provider_id)).await?))
}

pub async fn complete_job(
    State(state): State<Arc<AppState>>,
    ProviderId(provider_id): ProviderId,
    Path(booking_id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.booking_service.complete(&booking_id, Some(&provider_id)).await?))
}

pub async fn decline_job(
    State(state): State<Arc<AppState>>,
    ProviderId(provider_id): ProviderId,
    Path(booking_id): Path<String>,
    payload: Option<Json<CancelBookingRequest>>,
) -> Result<Json<Booking>, AppError> {
    let reason = payload.and_then(|Json(body)| body.reason);
    Ok(Json(state.booking_service.provider_cancel(&booking_id, Some(&provider_id), reason).await?))
}

pub async fn update_cash_payment(
    State(state): State<Arc<AppState>>,
    ProviderId(provider_id): ProviderId,
    Path(booking_id): Path<String>,
    Json(payload): Json<CodPaymentRequest>,
) -> Result<Json<Booking>, AppError> {
    let target: PaymentStatus = payload.payment_status.parse()?;
    Ok(Json(state.booking_service.update_cod_payment(&booking_id, &provider_id, target).await?))
}

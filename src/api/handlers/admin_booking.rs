use axum::{extract::{Path, Query, State}, Json};
use std::sync::Arc;
use tracing::info;
use crate::api::dtos::requests::{AdminBookingsQuery, AdminStatusRequest, AssignProviderRequest, RefundRequest};
use crate::api::extractors::identity::AdminAccess;
use crate::domain::models::booking::{Booking, BookingStatus};
use crate::domain::models::slot::parse_date;
use crate::error::AppError;
use crate::state::AppState;

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
    Query(query): Query<AdminBookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let date = query.date.as_deref().map(parse_date).transpose()?;
    let status = query.status.as_deref().map(str::parse::<BookingStatus>).transpose()?;
    Ok(Json(state.booking_service.list_filtered(date, status).await?))
}

pub async fn set_status(
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
    Path(booking_id): Path<String>,
    Json(payload): Json<AdminStatusRequest>,
) -> Result<Json<Booking>, AppError> {
    let target: BookingStatus = payload.status.parse()?;
    info!("Admin moving booking {} to {}", booking_id, target);

    let booking = state.booking_service
        .admin_set_status(&booking_id, target, payload.provider_id.as_deref(), payload.reason)
        .await?;
    Ok(Json(booking))
}

pub async fn assign_provider(
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
    Path(booking_id): Path<String>,
    Json(payload): Json<AssignProviderRequest>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.booking_service.assign(&booking_id, &payload.provider_id).await?))
}

pub async fn refund_booking(
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
    Path(booking_id): Path<String>,
    payload: Option<Json<RefundRequest>>,
) -> Result<Json<Booking>, AppError> {
    let amount = payload.and_then(|Json(body)| body.amount);
    Ok(Json(state.booking_service.refund(&booking_id, amount).await?))
}

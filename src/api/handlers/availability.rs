use axum::{extract::{Query, State}, Json};
use chrono::Utc;
use std::sync::Arc;
use crate::api::dtos::{
    requests::{AvailabilityQuery, AvailabilityRangeQuery, SlotCheckQuery},
    responses::SlotCheckResponse,
};
use crate::domain::models::slot::{parse_date, parse_time_slot, DayAvailability};
use crate::error::AppError;
use crate::state::AppState;

pub async fn get_day(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<DayAvailability>, AppError> {
    let date = parse_date(&query.date)?;
    let day = state.availability
        .get_available_slots(date, query.service_id.as_deref(), query.provider_id.as_deref())
        .await?;
    Ok(Json(day))
}

pub async fn get_range(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityRangeQuery>,
) -> Result<Json<Vec<DayAvailability>>, AppError> {
    let start = parse_date(&query.start_date)?;
    let end = parse_date(&query.end_date)?;
    let days = state.availability
        .get_available_slots_range(start, end, query.service_id.as_deref(), query.provider_id.as_deref())
        .await?;
    Ok(Json(days))
}

pub async fn check_slot(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotCheckQuery>,
) -> Result<Json<SlotCheckResponse>, AppError> {
    let date = parse_date(&query.date)?;
    let time = parse_time_slot(&query.time_slot)?;

    let check = state.availability
        .check_slot_at(date, time, query.service_id.as_deref(), query.provider_id.as_deref(), Utc::now())
        .await?;

    Ok(Json(SlotCheckResponse {
        date: date.to_string(),
        time_slot: query.time_slot,
        is_available: check.as_ref().is_some_and(|c| c.slot.is_available),
        slot: check.map(|c| c.slot),
    }))
}

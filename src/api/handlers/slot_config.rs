use axum::{extract::{Path, Query, State}, http::StatusCode, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use crate::api::dtos::requests::{CreateSlotConfigRequest, SlotConfigQuery, UpdateSlotConfigRequest};
use crate::api::extractors::identity::AdminAccess;
use crate::domain::models::slot::parse_time_slot;
use crate::domain::models::slot_config::{NewSlotConfigParams, SlotConfig};
use crate::error::AppError;
use crate::state::AppState;

pub async fn create_config(
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
    Json(payload): Json<CreateSlotConfigRequest>,
) -> Result<(StatusCode, Json<SlotConfig>), AppError> {
    let config = SlotConfig::new(NewSlotConfigParams {
        service_id: payload.service_id,
        day_of_week: payload.day_of_week,
        start_time: parse_time_slot(&payload.start_time)?,
        end_time: parse_time_slot(&payload.end_time)?,
        slot_duration_minutes: payload.slot_duration_minutes,
        gap_between_slots_minutes: payload.gap_between_slots_minutes.unwrap_or(0),
        max_bookings_per_slot: payload.max_bookings_per_slot,
        is_active: payload.is_active.unwrap_or(true),
    });
    config.validate()?;

    let created = state.slot_config_repo.create(&config).await?;
    info!(
        config_id = %created.id,
        service_id = ?created.service_id,
        day_of_week = ?created.day_of_week,
        "Slot config created"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_configs(
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
    Query(query): Query<SlotConfigQuery>,
) -> Result<Json<Vec<SlotConfig>>, AppError> {
    Ok(Json(state.slot_config_repo.list(query.service_id.as_deref()).await?))
}

pub async fn get_config(
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
    Path(config_id): Path<String>,
) -> Result<Json<SlotConfig>, AppError> {
    let config = state.slot_config_repo.find_by_id(&config_id).await?
        .ok_or_else(|| AppError::NotFound(format!("Slot config {} not found", config_id)))?;
    Ok(Json(config))
}

pub async fn update_config(
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
    Path(config_id): Path<String>,
    Json(payload): Json<UpdateSlotConfigRequest>,
) -> Result<Json<SlotConfig>, AppError> {
    let mut config = state.slot_config_repo.find_by_id(&config_id).await?
        .ok_or_else(|| AppError::NotFound(format!("Slot config {} not found", config_id)))?;

    if let Some(service_id) = payload.service_id { config.service_id = service_id; }
    if let Some(day_of_week) = payload.day_of_week { config.day_of_week = day_of_week; }
    if let Some(start) = payload.start_time { config.start_time = parse_time_slot(&start)?; }
    if let Some(end) = payload.end_time { config.end_time = parse_time_slot(&end)?; }
    if let Some(duration) = payload.slot_duration_minutes { config.slot_duration_minutes = duration; }
    if let Some(gap) = payload.gap_between_slots_minutes { config.gap_between_slots_minutes = gap; }
    if let Some(capacity) = payload.max_bookings_per_slot { config.max_bookings_per_slot = capacity; }
    if let Some(active) = payload.is_active { config.is_active = active; }
    config.validate()?;
    config.updated_at = Utc::now();

    let updated = state.slot_config_repo.update(&config).await?;
    info!(config_id = %updated.id, "Slot config updated");
    Ok(Json(updated))
}

pub async fn delete_config(
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
    Path(config_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.slot_config_repo.delete(&config_id).await?;
    info!(config_id = %config_id, "Slot config deleted");
    Ok(StatusCode::NO_CONTENT)
}

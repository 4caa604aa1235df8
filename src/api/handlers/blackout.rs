use axum::{extract::{Path, Query, State}, http::StatusCode, Json};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::info;
use crate::api::dtos::requests::{BlackoutRangeQuery, CreateBlackoutRequest};
use crate::api::extractors::identity::AdminAccess;
use crate::domain::models::blackout::BlackoutDate;
use crate::domain::models::slot::parse_date;
use crate::error::AppError;
use crate::state::AppState;

const DEFAULT_LISTING_DAYS: i64 = 90;

pub async fn create_blackout(
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
    Json(payload): Json<CreateBlackoutRequest>,
) -> Result<(StatusCode, Json<BlackoutDate>), AppError> {
    let date = parse_date(&payload.date)?;
    let blackout = BlackoutDate::new(date, payload.service_id, payload.reason, "admin".to_string());

    let created = state.blackout_repo.create(&blackout).await?;
    info!(blackout_id = %created.id, date = %created.blackout_date, service_id = ?created.service_id, "Blackout date added");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Lists blackouts in `[start_date, end_date]`, defaulting to the next 90 days.
pub async fn list_blackouts(
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
    Query(query): Query<BlackoutRangeQuery>,
) -> Result<Json<Vec<BlackoutDate>>, AppError> {
    let today = state.availability.local_now(Utc::now()).date();
    let start = query.start_date.as_deref().map(parse_date).transpose()?.unwrap_or(today);
    let end = query.end_date.as_deref().map(parse_date).transpose()?
        .unwrap_or(start + Duration::days(DEFAULT_LISTING_DAYS));

    if end < start {
        return Err(AppError::Validation("end_date must not be before start_date".into()));
    }
    Ok(Json(state.blackout_repo.list_by_range(start, end).await?))
}

pub async fn delete_blackout(
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
    Path(blackout_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.blackout_repo.delete(&blackout_id).await?;
    info!(blackout_id = %blackout_id, "Blackout date removed");
    Ok(StatusCode::NO_CONTENT)
}

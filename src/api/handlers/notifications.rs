use axum::{extract::{Query, State}, Json};
use std::sync::Arc;
use crate::api::dtos::requests::NotificationsQuery;
use crate::api::extractors::identity::AdminAccess;
use crate::domain::models::notification::{NotificationEvent, STATUS_FAILED, STATUS_PENDING, STATUS_PROCESSING, STATUS_SENT};
use crate::error::AppError;
use crate::state::AppState;

const MAX_LIMIT: i32 = 200;

pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
    Query(query): Query<NotificationsQuery>,
) -> Result<Json<Vec<NotificationEvent>>, AppError> {
    let status = query.status.map(|s| s.to_uppercase());
    if let Some(status) = status.as_deref()
        && ![STATUS_PENDING, STATUS_PROCESSING, STATUS_SENT, STATUS_FAILED].contains(&status) {
        return Err(AppError::Validation(format!("Unknown notification status '{}'", status)));
    }

    let limit = query.limit.unwrap_or(50).clamp(1, MAX_LIMIT);
    Ok(Json(state.outbox_repo.list_recent(status.as_deref(), limit).await?))
}

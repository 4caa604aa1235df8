use std::sync::Arc;
use std::time::Duration;
use chrono::{Duration as ChronoDuration, Utc};
use tokio::time::sleep;
use tracing::{error, info, warn, info_span, Instrument};
use crate::domain::models::notification::{Audience, NotificationEvent};
use crate::error::AppError;
use crate::state::AppState;

const CLAIM_BATCH: i32 = 20;
/// Deliveries attempted per event before it stays FAILED.
pub const MAX_DELIVERY_ATTEMPTS: i32 = 5;
/// How long a FAILED or PROCESSING event rests before it is picked up again.
pub const RETRY_AFTER_MINUTES: i64 = 5;

pub async fn start_outbox_worker(state: Arc<AppState>) {
    info!("Starting notification outbox worker...");
    let interval = Duration::from_secs(state.config.outbox_poll_seconds.max(1));

    loop {
        if let Err(e) = drain_outbox(&state).await {
            error!("Failed to fetch pending notifications: {:?}", e);
        }
        sleep(interval).await;
    }
}

/// Dispatches one claimed batch. A failed delivery is recorded on the event
/// and never touches the booking it describes.
pub async fn drain_outbox(state: &AppState) -> Result<usize, AppError> {
    let claimed_before = Utc::now() - ChronoDuration::minutes(RETRY_AFTER_MINUTES);
    let requeued = state.outbox_repo.requeue_stale(MAX_DELIVERY_ATTEMPTS, claimed_before).await?;
    if requeued > 0 {
        info!(requeued, "Re-queued notifications for another attempt");
    }

    let events = state.outbox_repo.claim_pending(CLAIM_BATCH).await?;
    let claimed = events.len();

    for event in events {
        let span = info_span!(
            "notification",
            event_id = %event.id,
            event_type = %event.event_type,
            audience = %event.audience.as_str(),
            booking_id = ?event.booking_id
        );

        async {
            match dispatch(state, &event).await {
                Ok(_) => {
                    info!("Notification delivered");
                    if let Err(e) = state.outbox_repo.mark_sent(&event.id).await {
                        error!("Failed to mark notification as sent: {:?}", e);
                    }
                }
                Err(e) => {
                    let err_msg = format!("{}", e);
                    warn!("Notification delivery failed: {}", err_msg);
                    if let Err(up_err) = state.outbox_repo.mark_failed(&event.id, &err_msg).await {
                        error!("Failed to mark notification as failed: {:?}", up_err);
                    }
                }
            }
        }
            .instrument(span)
            .await;
    }

    Ok(claimed)
}

async fn dispatch(state: &AppState, event: &NotificationEvent) -> Result<(), AppError> {
    let dispatcher = &state.notification_dispatcher;
    let payload = &event.payload.0;

    match event.audience {
        Audience::Admins => dispatcher.notify_admins(&event.event_type, payload).await,
        Audience::User => {
            let user_id = recipient(event)?;
            dispatcher.notify_user(user_id, &event.event_type, payload).await
        }
        Audience::Provider => {
            let provider_id = recipient(event)?;
            dispatcher.notify_provider(provider_id, &event.event_type, payload).await
        }
    }
}

fn recipient(event: &NotificationEvent) -> Result<&str, AppError> {
    event.recipient_id.as_deref().ok_or_else(|| {
        AppError::InternalWithMsg(format!("Notification {} has no recipient", event.id))
    })
}

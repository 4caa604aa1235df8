use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use crate::api::extractors::identity::Caller;
use crate::domain::services::booking_service::Actor;
use crate::realtime::BookingUpdate;
use crate::state::AppState;

/// Server-sent events for committed booking changes the caller may see.
pub async fn stream_updates(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(actor = ?actor, "Realtime subscriber connected");
    let receiver = state.realtime.subscribe();

    let updates = stream::unfold((receiver, actor), |(mut receiver, actor)| async move {
        loop {
            match receiver.recv().await {
                Ok(update) if visible_to(&actor, &update) => {
                    match Event::default().event(update.event.as_str()).json_data(&update) {
                        Ok(event) => return Some((Ok(event), (receiver, actor))),
                        Err(e) => warn!("Failed to encode realtime update: {}", e),
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Realtime subscriber fell behind"),
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(updates).keep_alive(KeepAlive::default())
}

fn visible_to(actor: &Actor, update: &BookingUpdate) -> bool {
    match actor {
        Actor::Admin => true,
        Actor::Provider(id) => update.provider_id.as_deref() == Some(id.as_str()),
        Actor::Customer(id) => update.user_id == *id,
    }
}

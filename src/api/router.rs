use axum::{
    body::Body,
    extract::Request,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{
    admin_booking, availability, blackout, booking, health, notifications, provider_booking, realtime, slot_config,
};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Availability
        .route("/api/v1/availability", get(availability::get_day))
        .route("/api/v1/availability/range", get(availability::get_range))
        .route("/api/v1/availability/check", get(availability::check_slot))

        // Customer
        .route("/api/v1/bookings", post(booking::create_booking).get(booking::list_my_bookings))
        .route("/api/v1/bookings/batch", post(booking::create_batch))
        .route("/api/v1/bookings/{booking_id}", get(booking::get_booking))
        .route("/api/v1/bookings/{booking_id}/cancel", post(booking::cancel_booking))
        .route("/api/v1/bookings/{booking_id}/reschedule", post(booking::reschedule_booking))
        .route("/api/v1/bookings/{booking_id}/payment/order", post(booking::create_payment_order))
        .route("/api/v1/bookings/{booking_id}/payment/verify", post(booking::verify_payment))

        // Provider
        .route("/api/v1/provider/bookings", get(provider_booking::list_assigned))
        .route("/api/v1/provider/bookings/{booking_id}/start", post(provider_booking::start_job))
        .route("/api/v1/provider/bookings/{booking_id}/complete", post(provider_booking::complete_job))
        .route("/api/v1/provider/bookings/{booking_id}/decline", post(provider_booking::decline_job))
        .route("/api/v1/provider/bookings/{booking_id}/payment", post(provider_booking::update_cash_payment))

        // Admin Booking Management
        .route("/api/v1/admin/bookings", get(admin_booking::list_bookings))
        .route("/api/v1/admin/bookings/{booking_id}/status", put(admin_booking::set_status))
        .route("/api/v1/admin/bookings/{booking_id}/assign", post(admin_booking::assign_provider))
        .route("/api/v1/admin/bookings/{booking_id}/refund", post(admin_booking::refund_booking))

        // Admin Scheduling
        .route("/api/v1/admin/slot-configs", get(slot_config::list_configs).post(slot_config::create_config))
        .route(
            "/api/v1/admin/slot-configs/{config_id}",
            get(slot_config::get_config).put(slot_config::update_config).delete(slot_config::delete_config),
        )
        .route("/api/v1/admin/blackouts", get(blackout::list_blackouts).post(blackout::create_blackout))
        .route("/api/v1/admin/blackouts/{blackout_id}", delete(blackout::delete_blackout))
        .route("/api/v1/admin/notifications", get(notifications::list_notifications))

        // Realtime
        .route("/api/v1/realtime/bookings", get(realtime::stream_updates))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        actor = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}

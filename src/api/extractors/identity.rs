use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use std::sync::Arc;
use tracing::{field::display, Span};
use crate::domain::services::booking_service::Actor;
use crate::error::AppError;
use crate::state::AppState;

pub const USER_HEADER: &str = "x-user-id";
pub const PROVIDER_HEADER: &str = "x-provider-id";
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Customer identity forwarded by the gateway.
pub struct CustomerId(pub String);

/// Provider identity forwarded by the gateway.
pub struct ProviderId(pub String);

/// Proof that the request carries the configured admin key.
pub struct AdminAccess;

/// Whoever is calling, for endpoints shared by every role.
/// The admin key wins over a provider header, which wins over a user header.
pub struct Caller(pub Actor);

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts.headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
}

fn has_admin_key(parts: &Parts, state: &AppState) -> bool {
    let expected = state.config.admin_api_key.as_str();
    !expected.is_empty() && header_value(parts, ADMIN_KEY_HEADER).is_some_and(|key| key == expected)
}

impl FromRequestParts<Arc<AppState>> for CustomerId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, USER_HEADER).ok_or(AppError::Unauthorized)?;
        Span::current().record("actor", display(format!("user:{}", user_id)));
        Ok(CustomerId(user_id))
    }
}

impl FromRequestParts<Arc<AppState>> for ProviderId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let provider_id = header_value(parts, PROVIDER_HEADER).ok_or(AppError::Unauthorized)?;
        Span::current().record("actor", display(format!("provider:{}", provider_id)));
        Ok(ProviderId(provider_id))
    }
}

impl FromRequestParts<Arc<AppState>> for AdminAccess {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        if !has_admin_key(parts, state) {
            return Err(AppError::Unauthorized);
        }
        Span::current().record("actor", "admin");
        Ok(AdminAccess)
    }
}

impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        if has_admin_key(parts, state) {
            Span::current().record("actor", "admin");
            return Ok(Caller(Actor::Admin));
        }
        if let Some(provider_id) = header_value(parts, PROVIDER_HEADER) {
            Span::current().record("actor", display(format!("provider:{}", provider_id)));
            return Ok(Caller(Actor::Provider(provider_id)));
        }
        if let Some(user_id) = header_value(parts, USER_HEADER) {
            Span::current().record("actor", display(format!("user:{}", user_id)));
            return Ok(Caller(Actor::Customer(user_id)));
        }
        Err(AppError::Unauthorized)
    }
}

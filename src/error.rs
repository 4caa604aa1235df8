use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

// 2067 = SQLite Unique Constraint
// 23505 = PostgreSQL Unique Violation
const UNIQUE_VIOLATION_CODES: [&str; 2] = ["2067", "23505"];

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Upstream dependency failed: {0}")]
    Dependency(String),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl AppError {
    pub fn slot_unavailable() -> Self {
        AppError::Conflict("This time slot is no longer available, please choose another".into())
    }

    /// Same as `slot_unavailable`, naming the cart item that lost its slot.
    pub fn slot_unavailable_in_batch(index: usize) -> Self {
        AppError::Conflict(format!(
            "Item {}: This time slot is no longer available, please choose another", index + 1
        ))
    }

    pub fn invalid_transition(from: &str, to: &str) -> Self {
        AppError::Conflict(format!("Cannot move booking from '{}' to '{}'", from, to))
    }

    /// Turns a unique-constraint violation into a `Conflict` carrying `msg`;
    /// every other database error passes through untouched.
    pub fn unique_violation_as_conflict(err: sqlx::Error, msg: &str) -> Self {
        if is_unique_violation(&err) {
            AppError::Conflict(msg.to_string())
        } else {
            AppError::Database(err)
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| UNIQUE_VIOLATION_CODES.contains(&code.as_ref()))
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(e) if is_unique_violation(e) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal | AppError::InternalWithMsg(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Dependency(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Text safe to show a client. Server-side details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::Database(e) if is_unique_violation(e) => "Resource already exists (duplicate entry)".to_string(),
            AppError::Database(_) | AppError::Internal | AppError::InternalWithMsg(_) => "Internal error".to_string(),
            AppError::Unauthorized => "Unauthorized".to_string(),
            AppError::Dependency(_) => "An upstream service is unavailable, please retry".to_string(),
            AppError::NotFound(msg)
            | AppError::Forbidden(msg)
            | AppError::Conflict(msg)
            | AppError::Validation(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(e) if !is_unique_violation(e) => error!("Database error: {:?}", e),
            AppError::Dependency(msg) => error!("Dependency failure: {}", msg),
            AppError::InternalWithMsg(msg) => error!("Internal error: {}", msg),
            _ => {}
        }

        (self.status(), Json(json!({ "error": self.public_message() }))).into_response()
    }
}

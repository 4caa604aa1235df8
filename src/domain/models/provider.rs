use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Read-only view of a provider owned by the onboarding subsystem.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Provider {
    pub id: String,
    pub status: String,
}

impl Provider {
    pub fn can_take_assignments(&self) -> bool {
        matches!(self.status.as_str(), "approved" | "active")
    }
}

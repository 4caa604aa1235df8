use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct BlackoutDate {
    pub id: String,
    pub blackout_date: NaiveDate,
    /// `None` closes every service on that date.
    pub service_id: Option<String>,
    pub reason: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl BlackoutDate {
    pub fn new(blackout_date: NaiveDate, service_id: Option<String>, reason: Option<String>, created_by: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            blackout_date,
            service_id,
            reason,
            created_by,
            created_at: Utc::now(),
        }
    }
}

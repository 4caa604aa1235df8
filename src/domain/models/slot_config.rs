use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use crate::error::AppError;

pub const FALLBACK_CONFIG_ID: &str = "builtin-default";
/// Upper bound for slot length and gap: one full day.
pub const MAX_SLOT_MINUTES: i32 = 1440;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct SlotConfig {
    pub id: String,
    pub service_id: Option<String>,
    /// 0 = Sunday ... 6 = Saturday. `None` applies to every day.
    pub day_of_week: Option<i32>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_duration_minutes: i32,
    pub gap_between_slots_minutes: i32,
    pub max_bookings_per_slot: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewSlotConfigParams {
    pub service_id: Option<String>,
    pub day_of_week: Option<i32>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_duration_minutes: i32,
    pub gap_between_slots_minutes: i32,
    pub max_bookings_per_slot: i32,
    pub is_active: bool,
}

impl SlotConfig {
    pub fn new(params: NewSlotConfigParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            service_id: params.service_id,
            day_of_week: params.day_of_week,
            start_time: params.start_time,
            end_time: params.end_time,
            slot_duration_minutes: params.slot_duration_minutes,
            gap_between_slots_minutes: params.gap_between_slots_minutes,
            max_bookings_per_slot: params.max_bookings_per_slot,
            is_active: params.is_active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Used when no admin configuration matches at all.
    pub fn fallback() -> Self {
        let epoch = DateTime::<Utc>::default();
        Self {
            id: FALLBACK_CONFIG_ID.to_string(),
            service_id: None,
            day_of_week: None,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            end_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
            slot_duration_minutes: 60,
            gap_between_slots_minutes: 0,
            max_bookings_per_slot: 5,
            is_active: true,
            created_at: epoch,
            updated_at: epoch,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(day) = self.day_of_week
            && !(0..=6).contains(&day) {
            return Err(AppError::Validation("day_of_week must be between 0 (Sunday) and 6 (Saturday)".into()));
        }
        if self.start_time >= self.end_time {
            return Err(AppError::Validation("start_time must be before end_time".into()));
        }
        if !(1..=MAX_SLOT_MINUTES).contains(&self.slot_duration_minutes) {
            return Err(AppError::Validation(format!(
                "slot_duration_minutes must be between 1 and {}", MAX_SLOT_MINUTES
            )));
        }
        if !(0..=MAX_SLOT_MINUTES).contains(&self.gap_between_slots_minutes) {
            return Err(AppError::Validation(format!(
                "gap_between_slots_minutes must be between 0 and {}", MAX_SLOT_MINUTES
            )));
        }
        if self.max_bookings_per_slot < 1 {
            return Err(AppError::Validation("max_bookings_per_slot must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_valid() {
        assert!(SlotConfig::fallback().validate().is_ok());
    }

    #[test]
    fn rejects_durations_and_gaps_longer_than_a_day() {
        let mut config = SlotConfig::fallback();
        config.slot_duration_minutes = i32::MAX;
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));

        config.slot_duration_minutes = MAX_SLOT_MINUTES;
        assert!(config.validate().is_ok());

        config.gap_between_slots_minutes = i32::MAX;
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));

        config.gap_between_slots_minutes = -1;
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));
    }
}

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use crate::error::AppError;

/// Display format of slot labels. Labels are stored verbatim on bookings,
/// so changing this format is a data migration.
pub const LABEL_FORMAT: &str = "%I:%M %p";

/// A bookable window inside one day, in minutes since local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotWindow {
    pub start_minute: i32,
    pub duration_minutes: i32,
}

impl SlotWindow {
    pub fn new(start_minute: i32, duration_minutes: i32) -> Self {
        Self { start_minute, duration_minutes }
    }

    pub fn end_minute(&self) -> i32 {
        self.start_minute + self.duration_minutes
    }

    pub fn start_time(&self) -> NaiveTime {
        NaiveTime::default() + Duration::minutes(self.start_minute as i64)
    }

    pub fn end_time(&self) -> NaiveTime {
        NaiveTime::default() + Duration::minutes(self.end_minute() as i64)
    }

    pub fn label(&self) -> String {
        self.start_time().format(LABEL_FORMAT).to_string()
    }

    pub fn starts_at(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(NaiveTime::default()) + Duration::minutes(self.start_minute as i64)
    }
}

pub fn minute_of_day(time: NaiveTime) -> i32 {
    (time.hour() * 60 + time.minute()) as i32
}

/// Accepts either the stored label form (`09:00 AM`) or 24h `HH:MM`.
pub fn parse_time_slot(input: &str) -> Result<NaiveTime, AppError> {
    let trimmed = input.trim();
    NaiveTime::parse_from_str(trimmed, LABEL_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|_| AppError::Validation(format!("Invalid time slot '{}' (expected '09:00 AM' or 'HH:MM')", input)))
}

pub fn parse_date(input: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid date '{}' (expected YYYY-MM-DD)", input)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    Blackout,
    Full,
    Past,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slot {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub label: String,
    pub capacity_used: i64,
    pub capacity_max: i32,
    pub is_available: bool,
    pub unavailable_reason: Option<UnavailableReason>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub service_id: Option<String>,
    pub is_blackout: bool,
    pub slots: Vec<Slot>,
}

use std::sync::Arc;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use crate::domain::models::slot::{minute_of_day, DayAvailability, Slot, SlotWindow, UnavailableReason};
use crate::domain::models::slot_config::SlotConfig;
use crate::domain::ports::{BlackoutRepository, BookingRepository, SlotConfigRepository};
use crate::domain::services::slot_config::resolve_config;
use crate::domain::services::slot_generator::generate;
use crate::error::AppError;

pub const MAX_RANGE_DAYS: i64 = 30;

/// Result of evaluating one requested window.
#[derive(Debug, Clone)]
pub struct SlotCheck {
    pub window: SlotWindow,
    pub capacity: i32,
    pub slot: Slot,
}

pub struct AvailabilityResolver {
    slot_config_repo: Arc<dyn SlotConfigRepository>,
    blackout_repo: Arc<dyn BlackoutRepository>,
    booking_repo: Arc<dyn BookingRepository>,
    timezone: Tz,
}

impl AvailabilityResolver {
    pub fn new(
        slot_config_repo: Arc<dyn SlotConfigRepository>,
        blackout_repo: Arc<dyn BlackoutRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        timezone: Tz,
    ) -> Self {
        Self { slot_config_repo, blackout_repo, booking_repo, timezone }
    }

    pub fn local_now(&self, now: DateTime<Utc>) -> NaiveDateTime {
        now.with_timezone(&self.timezone).naive_local()
    }

    pub async fn get_available_slots(
        &self,
        date: NaiveDate,
        service_id: Option<&str>,
        provider_id: Option<&str>,
    ) -> Result<DayAvailability, AppError> {
        self.get_available_slots_at(date, service_id, provider_id, Utc::now()).await
    }

    pub async fn get_available_slots_at(
        &self,
        date: NaiveDate,
        service_id: Option<&str>,
        provider_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<DayAvailability, AppError> {
        let local_now = self.local_now(now);
        ensure_not_past(date, local_now)?;

        let configs = self.slot_config_repo.list_active_for_service(service_id).await?;
        let blacked_out = self.blackout_repo.is_blacked_out(service_id, date).await?;
        self.day_availability(&configs, date, blacked_out, service_id, provider_id, local_now).await
    }

    pub async fn get_available_slots_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        service_id: Option<&str>,
        provider_id: Option<&str>,
    ) -> Result<Vec<DayAvailability>, AppError> {
        self.get_available_slots_range_at(start, end, service_id, provider_id, Utc::now()).await
    }

    pub async fn get_available_slots_range_at(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        service_id: Option<&str>,
        provider_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<DayAvailability>, AppError> {
        if end < start {
            return Err(AppError::Validation("end_date must not be before start_date".into()));
        }
        let days = (end - start).num_days() + 1;
        if days > MAX_RANGE_DAYS {
            return Err(AppError::Validation(format!(
                "Date range spans {} days, at most {} are allowed", days, MAX_RANGE_DAYS
            )));
        }

        let local_now = self.local_now(now);
        ensure_not_past(start, local_now)?;

        let configs = self.slot_config_repo.list_active_for_service(service_id).await?;
        let blackouts = self.blackout_repo.blacked_out_dates(service_id, start, end).await?;

        let mut result = Vec::with_capacity(days as usize);
        for date in start.iter_days().take(days as usize) {
            let blacked_out = blackouts.contains(&date);
            result.push(self.day_availability(&configs, date, blacked_out, service_id, provider_id, local_now).await?);
        }
        Ok(result)
    }

    /// Evaluates a single window with the same rules as the day listing.
    /// `None` when `time` is not one of the windows offered that day.
    pub async fn check_slot_at(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        service_id: Option<&str>,
        provider_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<SlotCheck>, AppError> {
        let local_now = self.local_now(now);
        ensure_not_past(date, local_now)?;

        let configs = self.slot_config_repo.list_active_for_service(service_id).await?;
        let config = resolve_config(&configs, service_id, date);
        let start_minute = minute_of_day(time);
        let Some(window) = generate(&config).into_iter().find(|w| w.start_minute == start_minute) else {
            return Ok(None);
        };

        let blacked_out = self.blackout_repo.is_blacked_out(service_id, date).await?;
        let used = self.booking_repo.count_occupied(date, window.start_minute, service_id, provider_id).await?;

        Ok(Some(SlotCheck {
            window,
            capacity: config.max_bookings_per_slot,
            slot: assess(date, window, &config, blacked_out, used, local_now),
        }))
    }

    pub async fn is_slot_available(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        service_id: Option<&str>,
        provider_id: Option<&str>,
    ) -> Result<bool, AppError> {
        self.is_slot_available_at(date, time, service_id, provider_id, Utc::now()).await
    }

    pub async fn is_slot_available_at(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        service_id: Option<&str>,
        provider_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        Ok(self
            .check_slot_at(date, time, service_id, provider_id, now)
            .await?
            .is_some_and(|check| check.slot.is_available))
    }

    async fn day_availability(
        &self,
        configs: &[SlotConfig],
        date: NaiveDate,
        blacked_out: bool,
        service_id: Option<&str>,
        provider_id: Option<&str>,
        local_now: NaiveDateTime,
    ) -> Result<DayAvailability, AppError> {
        let config = resolve_config(configs, service_id, date);

        let mut slots = Vec::new();
        for window in generate(&config) {
            let used = self.booking_repo.count_occupied(date, window.start_minute, service_id, provider_id).await?;
            slots.push(assess(date, window, &config, blacked_out, used, local_now));
        }

        Ok(DayAvailability {
            date,
            service_id: service_id.map(String::from),
            is_blackout: blacked_out,
            slots,
        })
    }
}

fn ensure_not_past(date: NaiveDate, local_now: NaiveDateTime) -> Result<(), AppError> {
    if date < local_now.date() {
        return Err(AppError::Validation(format!("Date {} is in the past", date)));
    }
    Ok(())
}

/// The single availability predicate. Blackout wins over past, past over full.
pub fn assess(
    date: NaiveDate,
    window: SlotWindow,
    config: &SlotConfig,
    blacked_out: bool,
    used: i64,
    local_now: NaiveDateTime,
) -> Slot {
    let reason = if blacked_out {
        Some(UnavailableReason::Blackout)
    } else if window.starts_at(date) <= local_now {
        Some(UnavailableReason::Past)
    } else if used >= config.max_bookings_per_slot as i64 {
        Some(UnavailableReason::Full)
    } else {
        None
    };

    Slot {
        date,
        start_time: window.start_time(),
        end_time: window.end_time(),
        label: window.label(),
        capacity_used: used,
        capacity_max: config.max_bookings_per_slot,
        is_available: reason.is_none(),
        unavailable_reason: reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        date.and_hms_opt(h, m, 0).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 11, 2).unwrap()
    }

    #[test]
    fn open_window_is_available() {
        let config = SlotConfig::fallback();
        let slot = assess(date(), SlotWindow::new(10 * 60, 60), &config, false, 4, at(date(), 8, 0));
        assert!(slot.is_available);
        assert_eq!(slot.capacity_used, 4);
        assert_eq!(slot.capacity_max, 5);
        assert_eq!(slot.label, "10:00 AM");
    }

    #[test]
    fn full_window_reports_full() {
        let config = SlotConfig::fallback();
        let slot = assess(date(), SlotWindow::new(10 * 60, 60), &config, false, 5, at(date(), 8, 0));
        assert!(!slot.is_available);
        assert_eq!(slot.unavailable_reason, Some(UnavailableReason::Full));
    }

    #[test]
    fn started_window_is_past() {
        let config = SlotConfig::fallback();
        let slot = assess(date(), SlotWindow::new(9 * 60, 60), &config, false, 0, at(date(), 14, 0));
        assert_eq!(slot.unavailable_reason, Some(UnavailableReason::Past));

        let exact = assess(date(), SlotWindow::new(14 * 60, 60), &config, false, 0, at(date(), 14, 0));
        assert_eq!(exact.unavailable_reason, Some(UnavailableReason::Past));
    }

    #[test]
    fn blackout_takes_precedence() {
        let config = SlotConfig::fallback();
        let slot = assess(date(), SlotWindow::new(9 * 60, 60), &config, true, 5, at(date(), 14, 0));
        assert_eq!(slot.unavailable_reason, Some(UnavailableReason::Blackout));
    }

    #[test]
    fn past_dates_are_rejected() {
        let yesterday = date().pred_opt().unwrap();
        assert!(ensure_not_past(yesterday, at(date(), 0, 1)).is_err());
        assert!(ensure_not_past(date(), at(date(), 23, 59)).is_ok());
    }
}

use crate::domain::models::slot::{minute_of_day, SlotWindow};
use crate::domain::models::slot_config::SlotConfig;

const MINUTES_PER_DAY: i32 = 1440;

/// Candidate windows for one day, in start order. A window is emitted only
/// when it ends at or before the config's end time.
pub fn generate(config: &SlotConfig) -> Vec<SlotWindow> {
    let start = minute_of_day(config.start_time);
    let mut end = minute_of_day(config.end_time);
    // 23:59 means "until midnight".
    if end == MINUTES_PER_DAY - 1 {
        end = MINUTES_PER_DAY;
    }

    if config.slot_duration_minutes <= 0 || start >= end {
        return Vec::new();
    }
    // Widened so that stored rows with oversized values cannot overflow.
    let duration = i64::from(config.slot_duration_minutes);
    let step = duration + i64::from(config.gap_between_slots_minutes.max(0));
    let end = i64::from(end);

    let mut windows = Vec::new();
    let mut cursor = i64::from(start);
    while cursor + duration <= end {
        // Both values fit in a day here.
        windows.push(SlotWindow::new(cursor as i32, duration as i32));
        cursor += step;
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn config(start: (u32, u32), end: (u32, u32), duration: i32, gap: i32) -> SlotConfig {
        let mut config = SlotConfig::fallback();
        config.start_time = NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap();
        config.end_time = NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap();
        config.slot_duration_minutes = duration;
        config.gap_between_slots_minutes = gap;
        config
    }

    fn labels(windows: &[SlotWindow]) -> Vec<String> {
        windows.iter().map(|w| w.label()).collect()
    }

    #[test]
    fn default_day_has_nine_hourly_slots() {
        let windows = generate(&SlotConfig::fallback());
        assert_eq!(windows.len(), 9);
        assert_eq!(windows[0].label(), "09:00 AM");
        assert_eq!(windows[8].label(), "05:00 PM");
        assert_eq!(windows[8].end_minute(), 18 * 60);
    }

    #[test]
    fn gap_advances_the_cursor() {
        let windows = generate(&config((9, 0), (12, 0), 45, 15));
        assert_eq!(labels(&windows), vec!["09:00 AM", "10:00 AM", "11:00 AM"]);
    }

    #[test]
    fn partial_trailing_window_is_dropped() {
        let windows = generate(&config((9, 0), (10, 30), 60, 0));
        assert_eq!(labels(&windows), vec!["09:00 AM"]);
    }

    #[test]
    fn degenerate_configs_yield_nothing() {
        assert!(generate(&config((9, 0), (18, 0), 0, 0)).is_empty());
        assert!(generate(&config((9, 0), (18, 0), -30, 0)).is_empty());
        assert!(generate(&config((18, 0), (9, 0), 60, 0)).is_empty());
        assert!(generate(&config((9, 0), (9, 0), 60, 0)).is_empty());
    }

    #[test]
    fn oversized_duration_or_gap_terminates() {
        assert!(generate(&config((9, 0), (18, 0), i32::MAX, 0)).is_empty());
        assert!(generate(&config((0, 0), (23, 59), i32::MAX, i32::MAX)).is_empty());

        let windows = generate(&config((9, 0), (18, 0), 60, i32::MAX));
        assert_eq!(labels(&windows), vec!["09:00 AM"]);
    }

    #[test]
    fn end_of_day_includes_last_window() {
        let windows = generate(&config((22, 0), (23, 59), 60, 0));
        assert_eq!(labels(&windows), vec!["10:00 PM", "11:00 PM"]);
    }

    #[test]
    fn generation_is_deterministic() {
        let config = config((7, 30), (20, 0), 50, 10);
        assert_eq!(generate(&config), generate(&config));
    }
}

use chrono::{Datelike, NaiveDate};
use crate::domain::models::slot_config::SlotConfig;

/// Picks the most specific active config for `service_id` on `date`:
/// service+weekday, service, weekday, global, then the built-in fallback.
/// `configs` is the snapshot read for this request.
pub fn resolve_config(configs: &[SlotConfig], service_id: Option<&str>, date: NaiveDate) -> SlotConfig {
    let weekday = date.weekday().num_days_from_sunday() as i32;

    let lookup = |service: Option<&str>, day: Option<i32>| {
        configs.iter().find(|c| {
            c.is_active && c.service_id.as_deref() == service && c.day_of_week == day
        })
    };

    let service_layers = service_id
        .into_iter()
        .flat_map(|id| [(Some(id), Some(weekday)), (Some(id), None)]);
    let global_layers = [(None, Some(weekday)), (None, None)];

    service_layers
        .chain(global_layers)
        .find_map(|(service, day)| lookup(service, day))
        .cloned()
        .unwrap_or_else(SlotConfig::fallback)
}

use serde::Serialize;
use tera::{Context, Tera};
use crate::domain::models::notification::{Audience, NotificationPayload};
use crate::error::AppError;

const TEMPLATES: [(&str, &str, &str); 9] = [
    (
        "booking_created",
        "{% if audience == 'user' %}Booking received{% else %}New booking{% endif %}",
        "{{ service_name }} on {{ booking_date }} at {{ time_slot }} has been booked.",
    ),
    (
        "booking_confirmed",
        "Booking confirmed",
        "Your {{ service_name }} on {{ booking_date }} at {{ time_slot }} is confirmed.",
    ),
    (
        "booking_assigned",
        "{% if audience == 'provider' %}New job assigned{% else %}Professional assigned{% endif %}",
        "{% if audience == 'provider' %}You have been assigned {{ service_name }} on {{ booking_date }} at {{ time_slot }}.{% else %}A professional will handle your {{ service_name }} on {{ booking_date }} at {{ time_slot }}.{% endif %}",
    ),
    (
        "booking_started",
        "Service started",
        "Your {{ service_name }} is now in progress.",
    ),
    (
        "booking_completed",
        "Service completed",
        "{{ service_name }} on {{ booking_date }} has been completed.",
    ),
    (
        "booking_cancelled",
        "Booking cancelled",
        "{{ service_name }} on {{ booking_date }} at {{ time_slot }} was cancelled.{% if reason %} Reason: {{ reason }}{% endif %}",
    ),
    (
        "provider_cancelled",
        "{% if audience == 'admins' %}Booking needs reassignment{% else %}Finding you a new professional{% endif %}",
        "The assigned professional withdrew from {{ service_name }} on {{ booking_date }} at {{ time_slot }}.{% if reason %} Reason: {{ reason }}{% endif %}",
    ),
    (
        "booking_rescheduled",
        "Booking rescheduled",
        "{{ service_name }} is now on {{ booking_date }} at {{ time_slot }}.",
    ),
    (
        "payment_updated",
        "Payment {{ payment_status }}",
        "Payment for {{ service_name }} on {{ booking_date }} is {{ payment_status }}.",
    ),
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RenderedMessage {
    pub title: String,
    pub body: String,
}

/// Built-in message text for every notification kind.
pub struct NotificationTemplates {
    tera: Tera,
}

impl NotificationTemplates {
    pub fn new() -> Result<Self, AppError> {
        let mut tera = Tera::default();
        for (name, title, body) in TEMPLATES {
            tera.add_raw_template(&format!("{}.title", name), title)
                .and_then(|_| tera.add_raw_template(&format!("{}.body", name), body))
                .map_err(|e| AppError::InternalWithMsg(format!("Template {} failed to parse: {:?}", name, e)))?;
        }
        Ok(Self { tera })
    }

    pub fn render(&self, audience: Audience, event_type: &str, payload: &NotificationPayload) -> Result<RenderedMessage, AppError> {
        let mut context = Context::from_serialize(payload)
            .map_err(|e| AppError::InternalWithMsg(format!("Template context error: {:?}", e)))?;
        context.insert("audience", audience.as_str());

        let render = |part: &str| {
            self.tera
                .render(&format!("{}.{}", event_type, part), &context)
                .map_err(|e| AppError::InternalWithMsg(format!("Template {} render error: {:?}", event_type, e)))
        };

        Ok(RenderedMessage { title: render("title")?, body: render("body")? })
    }
}

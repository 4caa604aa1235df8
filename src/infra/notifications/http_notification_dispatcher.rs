use crate::domain::models::notification::{Audience, NotificationPayload};
use crate::domain::ports::NotificationDispatcher;
use crate::domain::services::notification_templates::NotificationTemplates;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::error;

/// Posts rendered messages to the notification relay (SMS / push).
pub struct HttpNotificationDispatcher {
    client: Client,
    api_url: String,
    api_key: String,
    templates: NotificationTemplates,
}

impl HttpNotificationDispatcher {
    pub fn new(api_url: String, api_key: String, templates: NotificationTemplates) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
            templates,
        }
    }

    async fn send(&self, audience: Audience, recipient_id: Option<&str>, event_type: &str, payload: &NotificationPayload) -> Result<(), AppError> {
        let message = self.templates.render(audience, event_type, payload)?;

        let body = RelayPayload {
            audience: audience.as_str(),
            recipient_id,
            event_type,
            title: &message.title,
            body: &message.body,
            data: payload,
        };

        let res = self.client.post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Notification relay connection error: {}", e);
                error!("{}", msg);
                AppError::Dependency(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Notification relay failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::Dependency(msg));
        }

        Ok(())
    }
}

#[derive(Serialize)]
struct RelayPayload<'a> {
    audience: &'a str,
    recipient_id: Option<&'a str>,
    event_type: &'a str,
    title: &'a str,
    body: &'a str,
    data: &'a NotificationPayload,
}

#[async_trait]
impl NotificationDispatcher for HttpNotificationDispatcher {
    async fn notify_provider(&self, provider_id: &str, event_type: &str, payload: &NotificationPayload) -> Result<(), AppError> {
        self.send(Audience::Provider, Some(provider_id), event_type, payload).await
    }

    async fn notify_user(&self, user_id: &str, event_type: &str, payload: &NotificationPayload) -> Result<(), AppError> {
        self.send(Audience::User, Some(user_id), event_type, payload).await
    }

    async fn notify_admins(&self, event_type: &str, payload: &NotificationPayload) -> Result<(), AppError> {
        self.send(Audience::Admins, None, event_type, payload).await
    }
}

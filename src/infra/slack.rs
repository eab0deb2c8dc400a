use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::services::{Notification, NotifierService};

pub struct SlackWebhook {
    http: Client,
    webhook_url: Option<String>,
}

impl SlackWebhook {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            http: Client::new(),
            webhook_url,
        }
    }

    fn webhook_url(&self) -> AppResult<&str> {
        self.webhook_url
            .as_deref()
            .ok_or_else(|| AppError::Configuration("webhook URL not configured".to_string()))
    }
}

#[async_trait]
impl NotifierService for SlackWebhook {
    async fn send(&self, notification: &Notification) -> AppResult<()> {
        let url = self.webhook_url()?;
        let payload = WebhookPayload::from_notification(notification);

        let response = self
            .http
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|err| AppError::Notification(format!("failed to call the webhook: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::Notification(format!(
                "webhook responded with {status}: {body}"
            )));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
    username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachments: Option<&'a serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon_emoji: Option<&'a str>,
}

impl<'a> WebhookPayload<'a> {
    fn from_notification(notification: &'a Notification) -> Self {
        Self {
            text: &notification.text,
            username: &notification.username,
            channel: notification.channel.as_deref().map(prefix_channel),
            attachments: notification.attachments.as_ref(),
            icon_emoji: notification.icon_emoji.as_deref(),
        }
    }
}

fn prefix_channel(channel: &str) -> String {
    format!("#{}", channel.trim_start_matches('#'))
}

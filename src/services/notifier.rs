use async_trait::async_trait;

use crate::error::AppResult;

#[derive(Debug, Clone)]
pub struct Notification {
    pub text: String,
    pub username: String,
    pub channel: Option<String>,
    pub attachments: Option<serde_json::Value>,
    pub icon_emoji: Option<String>,
}

#[async_trait]
pub trait NotifierService: Send + Sync {
    async fn send(&self, notification: &Notification) -> AppResult<()>;
}

//! Telegram alert channel.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use super::Notifier;
use crate::config::TelegramConfig;
use crate::errors::NotifierError;

pub struct TelegramNotifier {
    client: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self { client, config }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn notify(&self, message: &str) -> Result<(), NotifierError> {
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.config.bot_token
        );
        self.client
            .post(&url)
            .json(&json!({
                "chat_id": self.config.chat_id,
                "text": message,
                "parse_mode": "Markdown",
                "disable_web_page_preview": true,
            }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

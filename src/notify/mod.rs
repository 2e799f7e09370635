//! Alert delivery through a fan-out of notifier channels.
//!
//! Channels are configured independently (Telegram, SMTP email) and an
//! unconfigured channel simply isn't in the set. Delivery failures are
//! logged and swallowed here: alerting problems must never feed back into
//! pipeline failure, or a broken webhook would fail runs that are
//! otherwise healthy.

pub mod email;
pub mod telegram;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::errors::NotifierError;

/// One alert delivery channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;
    async fn notify(&self, message: &str) -> Result<(), NotifierError>;
}

/// The set of configured channels. Every alert goes to all of them.
#[derive(Default)]
pub struct NotifierSet {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierSet {
    /// Build the set from whatever channels the configuration provides.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();

        if let Some(tg) = &config.telegram {
            notifiers.push(Box::new(telegram::TelegramNotifier::new(tg.clone())));
        }
        if let Some(smtp) = &config.smtp {
            match email::EmailNotifier::new(smtp.clone()) {
                Ok(n) => notifiers.push(Box::new(n)),
                Err(e) => warn!(error = %e, "email notifier misconfigured; channel disabled"),
            }
        }

        if notifiers.is_empty() {
            info!("no notifier channels configured; alerts will only be logged");
        }
        Self { notifiers }
    }

    /// Assemble a set from already-built channels. Used by tests to inject
    /// recording stubs.
    pub fn from_notifiers(notifiers: Vec<Box<dyn Notifier>>) -> Self {
        Self { notifiers }
    }

    /// Deliver one message to every channel, logging failures.
    pub async fn notify_all(&self, message: &str) {
        for notifier in &self.notifiers {
            match notifier.notify(message).await {
                Ok(()) => debug!(channel = notifier.name(), "alert delivered"),
                Err(e) => warn!(channel = notifier.name(), error = %e, "alert delivery failed"),
            }
        }
    }
}

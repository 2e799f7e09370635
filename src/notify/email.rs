//! SMTP email alert channel.

use async_trait::async_trait;
use lettre::message::{Mailbox, Message, header};
use lettre::transport::smtp::{AsyncSmtpTransport, authentication::Credentials};
use lettre::{AsyncTransport, Tokio1Executor};

use super::Notifier;
use crate::config::SmtpConfig;
use crate::errors::NotifierError;

pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    pub fn new(config: SmtpConfig) -> Result<Self, NotifierError> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .credentials(creds)
            .build();

        let from: Mailbox = config.user.parse()?;
        let to: Mailbox = config.to.parse()?;
        Ok(Self { mailer, from, to })
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn notify(&self, message: &str) -> Result<(), NotifierError> {
        // First line of the alert doubles as the subject.
        let subject = message.lines().next().unwrap_or("Pipeline alert").to_string();

        let msg = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(message.to_string())?;

        self.mailer.send(msg).await?;
        Ok(())
    }
}

// src/notify/email.rs
use lettre::message::header::{self, ContentType};
use lettre::message::{Mailbox, Message, MultiPart, SinglePart};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{Address, AsyncTransport, Tokio1Executor};
use tracing::{error, info};

use super::FlashbackMailer;
use crate::compose::{ComposedEmail, EMAIL_TITLE};
use crate::config::{Config, SmtpConfig};
use crate::error::{FlashbackError, Result};

pub const SENDER_NAME: &str = "Weekly Flashbacks";

/// SMTP delivery over an authenticated STARTTLS session.
pub struct EmailSender {
    smtp: SmtpConfig,
    recipients: Vec<String>,
}

impl EmailSender {
    pub fn new(smtp: SmtpConfig, recipients: Vec<String>) -> Self {
        Self { smtp, recipients }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.smtp.clone(), cfg.subscribers.clone())
    }

    async fn try_deliver(&self, email: &ComposedEmail) -> Result<()> {
        let msg = build_message(&self.smtp.username, &self.recipients, email)?;

        let creds = Credentials::new(self.smtp.username.clone(), self.smtp.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp.host)
            .map_err(|e| FlashbackError::TransportDeliveryFailed(format!("smtp relay: {e}")))?
            .port(self.smtp.port)
            .credentials(creds)
            .build();

        mailer
            .send(msg)
            .await
            .map_err(|e| FlashbackError::TransportDeliveryFailed(format!("send email: {e}")))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl FlashbackMailer for EmailSender {
    async fn deliver(&self, email: &ComposedEmail) -> bool {
        match self.try_deliver(email).await {
            Ok(()) => {
                info!(
                    recipients = self.recipients.len(),
                    images = email.images.len(),
                    "flashback email sent"
                );
                true
            }
            Err(e) => {
                error!(error = %e, "email send failed");
                false
            }
        }
    }
}

/// `multipart/related`: the HTML body first, then one inline JPEG per image
/// carrying its `Content-ID`.
pub fn build_message(from_addr: &str, to: &[String], email: &ComposedEmail) -> Result<Message> {
    let invalid = |what: &str, e: &dyn std::fmt::Display| {
        FlashbackError::TransportDeliveryFailed(format!("{what}: {e}"))
    };

    let from = Mailbox::new(
        Some(SENDER_NAME.to_string()),
        from_addr
            .parse::<Address>()
            .map_err(|e| invalid("sender address", &e))?,
    );

    let mut builder = Message::builder().from(from).subject(EMAIL_TITLE);
    for addr in to {
        let mbox = addr
            .parse::<Mailbox>()
            .map_err(|e| invalid("recipient address", &e))?;
        builder = builder.to(mbox);
    }

    let jpeg = ContentType::parse("image/jpeg").map_err(|e| invalid("content type", &e))?;
    let mut body = MultiPart::related().singlepart(SinglePart::html(email.html.clone()));
    for img in &email.images {
        body = body.singlepart(
            SinglePart::builder()
                .header(jpeg.clone())
                .header(header::ContentDisposition::inline_with_name(&img.filename))
                .header(header::ContentId::from(format!("<{}>", img.content_id)))
                .body(img.bytes.clone()),
        );
    }

    builder
        .multipart(body)
        .map_err(|e| invalid("build email", &e))
}

//! SMTP Email Service Implementation
//!
//! Delivers email through `lettre`'s async SMTP transport. STARTTLS and
//! authentication follow the `EMAIL_*` settings in [`EmailConfig`].

use chrono::Utc;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use uuid::Uuid;

use crate::{EmailConfig, EmailError, EmailMessage, EmailReceipt, EmailService};

/// SMTP email service implementation
pub struct SmtpEmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailService {
    /// Create a new SMTP email service. No connection is opened until the first send.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let smtp = &config.smtp;

        let mut builder = if smtp.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
                .map_err(|e| EmailError::Smtp(format!("Invalid SMTP relay {}: {}", smtp.host, e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
        };

        builder = builder.port(smtp.port).timeout(smtp.timeout);

        match (&config.host_user, &smtp.password) {
            (Some(user), Some(password)) => {
                builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
            }
            (Some(_), None) => {
                tracing::warn!("EMAIL_HOST_USER set without EMAIL_HOST_PASSWORD, sending unauthenticated");
            }
            _ => {}
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

/// Convert an email message into a MIME message.
///
/// Messages with an HTML body become `multipart/alternative` with the plain
/// text first; the returned id is the generated `Message-ID`.
fn build_mime_message(message: &EmailMessage) -> Result<(Message, String), EmailError> {
    if message.to.is_empty() {
        return Err(EmailError::Validation("No recipients".to_string()));
    }

    let from: Mailbox = message.from.parse().map_err(|e| {
        EmailError::Validation(format!("Invalid from address '{}': {}", message.from, e))
    })?;

    let message_id = format!("<{}@{}>", Uuid::new_v4(), from.email.domain());

    let mut builder = Message::builder()
        .from(from)
        .subject(message.subject.clone())
        .message_id(Some(message_id.clone()));

    for recipient in &message.to {
        let to: Mailbox = recipient.parse().map_err(|e| {
            EmailError::Validation(format!("Invalid recipient address '{}': {}", recipient, e))
        })?;
        builder = builder.to(to);
    }

    let mime = match &message.body_html {
        Some(html) => builder.multipart(MultiPart::alternative_plain_html(
            message.body_text.clone(),
            html.clone(),
        )),
        None => builder.singlepart(SinglePart::plain(message.body_text.clone())),
    }
    .map_err(|e| EmailError::Validation(format!("Failed to build message: {}", e)))?;

    Ok((mime, message_id))
}

#[async_trait::async_trait]
impl EmailService for SmtpEmailService {
    async fn send_email(&self, message: EmailMessage) -> Result<EmailReceipt, EmailError> {
        tracing::info!(recipients = ?message.to, "Sending email via SMTP");

        let (mime, message_id) = build_mime_message(&message)?;

        let response = self
            .transport
            .send(mime)
            .await
            .map_err(|e| EmailError::Smtp(format!("Failed to send email: {}", e)))?;

        tracing::info!(
            message_id = %message_id,
            code = %response.code(),
            "Email sent successfully via SMTP"
        );

        Ok(EmailReceipt {
            message_id,
            sent_at: Utc::now(),
            provider: self.provider().to_string(),
            metadata: message.metadata.clone(),
        })
    }

    fn provider(&self) -> &'static str {
        "smtp"
    }
}

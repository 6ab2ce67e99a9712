//! Tracker Email Service
//!
//! Provides email functionality for the invitation workflow with support for:
//! - Invitation composition: acceptance links, templated HTML and plain-text bodies
//! - SMTP delivery through `lettre`
//! - AWS SES integration for production email delivery
//! - Mock email service for testing and development

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod aws_ses;
pub mod composer;
pub mod config;
pub mod content;
pub mod invitation;
pub mod mock;
pub mod observer;
pub mod smtp;
pub mod templates;

pub use composer::{DeliveryResult, InvitationComposer};
pub use config::EmailConfig;
pub use invitation::{Invitation, InvitationRole, Inviter};
pub use observer::{DeliveryObserver, TracingDeliveryObserver};
pub use templates::{TemplateRenderer, TeraTemplateRenderer};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("Email configuration error: {0}")]
    Configuration(String),

    #[error("Email validation error: {0}")]
    Validation(String),

    #[error("Email template error: {0}")]
    Template(String),

    #[error("SMTP error: {0}")]
    Smtp(String),

    #[error("AWS SES error: {0}")]
    AwsSes(String),
}

/// Email message to be sent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub from: String,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl EmailMessage {
    /// Create a new email message
    pub fn new(to: Vec<String>, from: String, subject: String, body_text: String) -> Self {
        Self {
            to,
            from,
            subject,
            body_text,
            body_html: None,
            metadata: HashMap::new(),
        }
    }

    /// Add HTML body content
    pub fn with_html(mut self, body_html: String) -> Self {
        self.body_html = Some(body_html);
        self
    }

    /// Add metadata for tracking
    pub fn with_metadata(mut self, key: String, value: String) -> Self {
        self.metadata.insert(key, value);
        self
    }
}

/// Email delivery receipt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailReceipt {
    pub message_id: String,
    pub sent_at: DateTime<Utc>,
    pub provider: String,
    pub metadata: HashMap<String, String>,
}

impl EmailReceipt {
    /// Receipt handed back when a delivery error was swallowed in [`FailureMode::Silent`]
    fn suppressed(provider: &str, metadata: HashMap<String, String>) -> Self {
        Self {
            message_id: format!("suppressed-{}", Uuid::new_v4()),
            sent_at: Utc::now(),
            provider: format!("{}-suppressed", provider),
            metadata,
        }
    }
}

/// How a transport reports delivery errors to its caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailureMode {
    /// Delivery errors are returned to the caller
    #[default]
    Strict,
    /// Delivery errors are logged and replaced by a suppressed receipt
    Silent,
}

/// Email service trait for different implementations
#[async_trait::async_trait]
pub trait EmailService: Send + Sync {
    /// Send an email message, returning any delivery error
    async fn send_email(&self, message: EmailMessage) -> Result<EmailReceipt, EmailError>;

    /// Short provider name used in receipts and logs
    fn provider(&self) -> &'static str;

    /// Send an email message with an explicit failure mode
    async fn send(
        &self,
        message: EmailMessage,
        mode: FailureMode,
    ) -> Result<EmailReceipt, EmailError> {
        let metadata = message.metadata.clone();

        match self.send_email(message).await {
            Err(e) if mode == FailureMode::Silent => {
                tracing::warn!(
                    provider = self.provider(),
                    error = %e,
                    "Email delivery failed, error suppressed"
                );
                Ok(EmailReceipt::suppressed(self.provider(), metadata))
            }
            result => result,
        }
    }
}

/// Email service factory
pub struct EmailServiceFactory;

impl EmailServiceFactory {
    /// Create email service based on configuration
    pub async fn create(config: &EmailConfig) -> Result<Box<dyn EmailService>, EmailError> {
        if !config.enabled {
            tracing::info!("Email service disabled, using mock implementation");
            return Ok(Box::new(mock::MockEmailService::new()));
        }

        match config.provider.as_str() {
            "ses" | "aws-ses" => {
                tracing::info!("Creating AWS SES email service");
                let ses_service = aws_ses::SesEmailService::new(config).await?;
                Ok(Box::new(ses_service))
            }
            "smtp" => {
                tracing::info!(
                    host = %config.smtp.host,
                    port = config.smtp.port,
                    "Creating SMTP email service"
                );
                Ok(Box::new(smtp::SmtpEmailService::new(config)?))
            }
            "mock" => {
                tracing::info!("Creating mock email service");
                Ok(Box::new(mock::MockEmailService::new()))
            }
            provider => Err(EmailError::Configuration(format!(
                "Unknown email provider: {}. Supported providers: smtp, ses, mock",
                provider
            ))),
        }
    }
}

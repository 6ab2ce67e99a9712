//! Mock Email Service Implementation
//!
//! Provides in-memory email capture for testing without external dependencies.
//! Captured invitation emails can be searched by recipient and their
//! acceptance tokens extracted, and delivery failures can be injected to
//! exercise failure handling.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use regex::Regex;
use uuid::Uuid;

use crate::content::ACCEPT_INVITATION_PATH;
use crate::{EmailError, EmailMessage, EmailReceipt, EmailService};

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"{}\?token=([^\s"'<>&]+)"#,
        regex::escape(ACCEPT_INVITATION_PATH)
    ))
    .expect("valid token regex")
});

/// Email captured by the mock service
#[derive(Debug, Clone)]
pub struct CapturedEmail {
    pub message: EmailMessage,
    pub receipt: EmailReceipt,
    pub captured_at: DateTime<Utc>,
}

impl CapturedEmail {
    /// Extract the decoded invitation token from the acceptance link in the email body
    pub fn extract_invitation_token(&self) -> Option<String> {
        let text = format!(
            "{} {}",
            self.message.body_text,
            self.message.body_html.as_deref().unwrap_or("")
        );

        let encoded = TOKEN_RE.captures(&text)?.get(1)?.as_str();
        urlencoding::decode(encoded).ok().map(|token| token.into_owned())
    }

    pub fn is_invitation(&self) -> bool {
        self.message
            .metadata
            .get("email_type")
            .map(|t| t == "invitation")
            .unwrap_or(false)
            || self.message.subject.to_lowercase().contains("invitation")
    }
}

/// Mock email service for testing
#[derive(Debug, Clone)]
pub struct MockEmailService {
    emails: Arc<Mutex<Vec<CapturedEmail>>>,
    email_by_recipient: Arc<Mutex<HashMap<String, Vec<CapturedEmail>>>>,
    failure: Arc<Mutex<Option<EmailError>>>,
    enabled: bool,
}

impl MockEmailService {
    /// Create a new mock email service
    pub fn new() -> Self {
        Self {
            emails: Arc::new(Mutex::new(Vec::new())),
            email_by_recipient: Arc::new(Mutex::new(HashMap::new())),
            failure: Arc::new(Mutex::new(None)),
            enabled: true,
        }
    }

    /// Create a disabled mock email service (for testing)
    pub fn new_disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    /// Make every following send fail with `error` until [`Self::recover`] is called
    pub fn fail_with(&self, error: EmailError) {
        *lock(&self.failure) = Some(error);
    }

    /// Stop injecting failures
    pub fn recover(&self) {
        *lock(&self.failure) = None;
    }

    /// Get all captured emails
    pub fn get_all_emails(&self) -> Vec<CapturedEmail> {
        lock(&self.emails).clone()
    }

    /// Get emails sent to a specific recipient
    pub fn get_emails_for_recipient(&self, email: &str) -> Vec<CapturedEmail> {
        lock(&self.email_by_recipient)
            .get(email)
            .cloned()
            .unwrap_or_default()
    }

    /// Get the most recent invitation email for a recipient
    pub fn get_latest_invitation_email(&self, email: &str) -> Option<CapturedEmail> {
        self.get_emails_for_recipient(email)
            .into_iter()
            .filter(CapturedEmail::is_invitation)
            .max_by_key(|e| e.captured_at)
    }

    /// Get the invitation token from the most recent invitation email
    pub fn get_invitation_token_for_email(&self, email: &str) -> Option<String> {
        self.get_latest_invitation_email(email)
            .and_then(|email| email.extract_invitation_token())
    }

    /// Check if an invitation email was sent to a specific email address
    pub fn was_invitation_sent_to(&self, email: &str) -> bool {
        self.get_invitation_token_for_email(email).is_some()
    }

    /// Get count of emails sent
    pub fn email_count(&self) -> usize {
        lock(&self.emails).len()
    }

    /// Clear all captured emails
    pub fn clear(&self) {
        lock(&self.emails).clear();
        lock(&self.email_by_recipient).clear();
    }

    /// Check if email sending is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for MockEmailService {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait::async_trait]
impl EmailService for MockEmailService {
    async fn send_email(&self, message: EmailMessage) -> Result<EmailReceipt, EmailError> {
        if let Some(error) = lock(&self.failure).clone() {
            tracing::warn!(error = %error, "Mock email service failing send as instructed");
            return Err(error);
        }

        if !self.enabled {
            tracing::warn!("Mock email service disabled, skipping send");
            return Ok(EmailReceipt {
                message_id: format!("disabled-{}", Uuid::new_v4()),
                sent_at: Utc::now(),
                provider: "mock-disabled".to_string(),
                metadata: message.metadata.clone(),
            });
        }

        if message.to.is_empty() {
            return Err(EmailError::Validation("No recipients".to_string()));
        }

        tracing::info!(recipients = ?message.to, "Mock email service capturing email");

        let receipt = EmailReceipt {
            message_id: format!("mock-{}", Uuid::new_v4()),
            sent_at: Utc::now(),
            provider: self.provider().to_string(),
            metadata: message.metadata.clone(),
        };

        let captured = CapturedEmail {
            message: message.clone(),
            receipt: receipt.clone(),
            captured_at: Utc::now(),
        };

        lock(&self.emails).push(captured.clone());

        {
            let mut by_recipient = lock(&self.email_by_recipient);
            for recipient in &message.to {
                by_recipient
                    .entry(recipient.clone())
                    .or_default()
                    .push(captured.clone());
            }
        }

        tracing::info!(
            message_id = %receipt.message_id,
            "Email captured successfully"
        );

        Ok(receipt)
    }

    fn provider(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_to(recipients: &[&str], body: &str) -> EmailMessage {
        EmailMessage::new(
            recipients.iter().map(|r| r.to_string()).collect(),
            "sender@tracker.test".to_string(),
            "Invitation to join Tracker".to_string(),
            body.to_string(),
        )
        .with_metadata("email_type".to_string(), "invitation".to_string())
    }

    #[tokio::test]
    async fn test_mock_email_service() {
        let service = MockEmailService::new();

        let receipt = service
            .send_email(message_to(&["test@example.com"], "Test body"))
            .await
            .unwrap();

        assert!(receipt.message_id.starts_with("mock-"));
        assert_eq!(receipt.provider, "mock");
        assert_eq!(service.email_count(), 1);

        let emails = service.get_emails_for_recipient("test@example.com");
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].message.subject, "Invitation to join Tracker");
    }

    #[tokio::test]
    async fn test_captures_each_recipient() {
        let service = MockEmailService::new();

        service
            .send_email(message_to(&["a@example.com", "b@example.com"], "Hi"))
            .await
            .unwrap();

        assert_eq!(service.email_count(), 1);
        assert_eq!(service.get_emails_for_recipient("a@example.com").len(), 1);
        assert_eq!(service.get_emails_for_recipient("b@example.com").len(), 1);

        service.clear();
        assert_eq!(service.email_count(), 0);
        assert!(service.get_emails_for_recipient("a@example.com").is_empty());
    }

    #[tokio::test]
    async fn test_invitation_token_extraction() {
        let service = MockEmailService::new();
        let body = "Accept here: http://localhost:4200/accept-invitation?token=x%2By%3D";

        service
            .send_email(message_to(&["invitee@example.com"], body))
            .await
            .unwrap();

        assert!(service.was_invitation_sent_to("invitee@example.com"));
        assert_eq!(
            service
                .get_invitation_token_for_email("invitee@example.com")
                .as_deref(),
            Some("x+y=")
        );
        assert!(!service.was_invitation_sent_to("other@example.com"));
    }

    #[tokio::test]
    async fn test_injected_failure_and_recovery() {
        let service = MockEmailService::new();
        service.fail_with(EmailError::Smtp("connection refused".to_string()));

        let result = service
            .send_email(message_to(&["test@example.com"], "Hi"))
            .await;
        assert_eq!(
            result.unwrap_err(),
            EmailError::Smtp("connection refused".to_string())
        );
        assert_eq!(service.email_count(), 0);

        service.recover();
        assert!(service
            .send_email(message_to(&["test@example.com"], "Hi"))
            .await
            .is_ok());
        assert_eq!(service.email_count(), 1);
    }

    #[tokio::test]
    async fn test_disabled_mock_service() {
        let service = MockEmailService::new_disabled();

        let receipt = service
            .send_email(message_to(&["test@example.com"], "Hi"))
            .await
            .unwrap();

        assert!(!service.is_enabled());
        assert!(receipt.message_id.starts_with("disabled-"));
        assert_eq!(receipt.provider, "mock-disabled");
        assert_eq!(service.email_count(), 0);
    }

    #[tokio::test]
    async fn test_rejects_message_without_recipients() {
        let service = MockEmailService::new();

        let result = service.send_email(message_to(&[], "Hi")).await;

        assert!(matches!(result, Err(EmailError::Validation(_))));
    }
}

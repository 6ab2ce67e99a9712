//! Invitation email composition and delivery
//!
//! [`InvitationComposer::compose_and_send`] builds the acceptance link, renders
//! the invitation template, derives the plain-text body and hands the message
//! to the configured [`EmailService`]. It never returns an error: rendering,
//! configuration and transport failures become [`DeliveryResult::Failure`],
//! which still carries the acceptance link.

use std::sync::Arc;

use serde::Serialize;

use crate::content::{accept_invitation_url, strip_tags};
use crate::observer::{DeliveryObserver, TracingDeliveryObserver};
use crate::templates::{TemplateRenderer, INVITATION_TEMPLATE};
use crate::{
    EmailConfig, EmailError, EmailMessage, EmailReceipt, EmailService, FailureMode, Invitation,
};

/// Outcome of an invitation delivery attempt
#[derive(Debug)]
pub enum DeliveryResult {
    Success {
        invitation_url: String,
        receipt: EmailReceipt,
    },
    Failure {
        invitation_url: String,
        error: EmailError,
    },
}

impl DeliveryResult {
    pub fn succeeded(&self) -> bool {
        matches!(self, DeliveryResult::Success { .. })
    }

    /// The acceptance link, present whether or not the send succeeded
    pub fn invitation_url(&self) -> &str {
        match self {
            DeliveryResult::Success { invitation_url, .. }
            | DeliveryResult::Failure { invitation_url, .. } => invitation_url,
        }
    }

    pub fn error(&self) -> Option<&EmailError> {
        match self {
            DeliveryResult::Success { .. } => None,
            DeliveryResult::Failure { error, .. } => Some(error),
        }
    }

    /// `(succeeded, invitation_url)`
    pub fn into_parts(self) -> (bool, String) {
        match self {
            DeliveryResult::Success { invitation_url, .. } => (true, invitation_url),
            DeliveryResult::Failure { invitation_url, .. } => (false, invitation_url),
        }
    }
}

/// Variables available to the invitation template
#[derive(Serialize)]
struct InvitationTemplateContext<'a> {
    invitation: &'a Invitation,
    invitation_url: &'a str,
    invited_by: String,
    role: &'a str,
    site_name: &'a str,
}

/// Composes and sends invitation emails
pub struct InvitationComposer {
    config: EmailConfig,
    email_service: Arc<dyn EmailService>,
    renderer: Arc<dyn TemplateRenderer>,
    observer: Arc<dyn DeliveryObserver>,
}

impl InvitationComposer {
    pub fn new(
        config: EmailConfig,
        email_service: Arc<dyn EmailService>,
        renderer: Arc<dyn TemplateRenderer>,
    ) -> Self {
        if config.uses_default_site_name() {
            tracing::warn!(
                site_name = config.site_name(),
                "SITE_NAME not configured, using fallback site name"
            );
        }
        if config.uses_default_frontend_base_url() {
            tracing::warn!(
                frontend_base_url = config.frontend_base_url(),
                "FRONTEND_URL not configured, using fallback base URL"
            );
        }

        Self {
            config,
            email_service,
            renderer,
            observer: Arc::new(TracingDeliveryObserver),
        }
    }

    /// Replace the default `tracing` observer
    pub fn with_observer(mut self, observer: Arc<dyn DeliveryObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Subject line: `Invitation to join {site_name}`
    pub fn subject(&self) -> String {
        format!("Invitation to join {}", self.config.site_name())
    }

    /// Acceptance link for `invitation`. A non-empty `base_url_override` wins
    /// over the configured frontend base URL.
    pub fn invitation_url(&self, invitation: &Invitation, base_url_override: Option<&str>) -> String {
        let base_url = base_url_override
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| self.config.frontend_base_url());

        accept_invitation_url(base_url, &invitation.token)
    }

    /// Build the invitation message for `invitation_url` without sending it
    pub fn compose(
        &self,
        invitation: &Invitation,
        invitation_url: &str,
    ) -> Result<EmailMessage, EmailError> {
        let context = InvitationTemplateContext {
            invitation,
            invitation_url,
            invited_by: invitation.invited_by.display_name(),
            role: invitation.role.label(),
            site_name: self.config.site_name(),
        };
        let context = serde_json::to_value(&context)
            .map_err(|e| EmailError::Template(format!("Failed to build context: {}", e)))?;

        let body_html = self.renderer.render(INVITATION_TEMPLATE, &context)?;
        let body_text = strip_tags(&body_html);

        let from = self.config.from_address()?.to_string();

        Ok(EmailMessage::new(
            vec![invitation.email.clone()],
            from,
            self.subject(),
            body_text,
        )
        .with_html(body_html)
        .with_metadata("email_type".to_string(), "invitation".to_string())
        .with_metadata("role".to_string(), invitation.role.label().to_string()))
    }

    /// Compose the invitation email and attempt delivery.
    ///
    /// Failures are reported to the observer and returned as
    /// [`DeliveryResult::Failure`] with the same link a success would carry.
    pub async fn compose_and_send(
        &self,
        invitation: &Invitation,
        base_url_override: Option<&str>,
    ) -> DeliveryResult {
        let invitation_url = self.invitation_url(invitation, base_url_override);

        match self.try_send(invitation, &invitation_url).await {
            Ok(receipt) => {
                self.observer.delivery_succeeded(invitation, &receipt);
                DeliveryResult::Success {
                    invitation_url,
                    receipt,
                }
            }
            Err(error) => {
                self.observer.delivery_failed(invitation, &error);
                DeliveryResult::Failure {
                    invitation_url,
                    error,
                }
            }
        }
    }

    async fn try_send(
        &self,
        invitation: &Invitation,
        invitation_url: &str,
    ) -> Result<EmailReceipt, EmailError> {
        let message = self.compose(invitation, invitation_url)?;

        self.email_service
            .send(message, FailureMode::Strict)
            .await
    }
}

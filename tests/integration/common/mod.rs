//! Common fixtures for the invitation email integration tests

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tracker_email::mock::MockEmailService;
use tracker_email::{
    EmailConfig, Invitation, InvitationComposer, InvitationRole, Inviter, TeraTemplateRenderer,
};

/// Build a config the way a deployment would, through the environment lookup
pub fn config_from(vars: &[(&str, &str)]) -> Result<EmailConfig> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    Ok(EmailConfig::from_lookup(|key| vars.get(key).cloned())?)
}

/// Tracker deployment settings used by most tests
pub fn tracker_config() -> Result<EmailConfig> {
    config_from(&[
        ("SITE_NAME", "Tracker"),
        ("FRONTEND_URL", "http://localhost:4200"),
        ("DEFAULT_FROM_EMAIL", "no-reply@tracker.test"),
    ])
}

/// Composer wired to a mock transport and the embedded templates
pub fn mock_composer(config: EmailConfig) -> Result<(InvitationComposer, MockEmailService)> {
    let service = MockEmailService::new();
    let renderer = TeraTemplateRenderer::from_config(&config)?;

    let composer = InvitationComposer::new(config, Arc::new(service.clone()), Arc::new(renderer));

    Ok((composer, service))
}

pub fn editor_invitation(token: &str, email: &str) -> Invitation {
    Invitation::new(token, email, Inviter::new("admin"), InvitationRole::Editor)
}

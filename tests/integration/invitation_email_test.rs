//! Invitation Email Integration Tests
//!
//! Drives the invitation composer end to end: configuration from environment
//! lookups, the embedded tera template, plain-text stripping and the mock
//! transport, without any network access.

mod common;

use anyhow::Result;
use tracker_email::mock::MockEmailService;
use tracker_email::{
    EmailConfig, EmailError, EmailService, EmailServiceFactory, InvitationComposer, InvitationRole,
    Inviter, TeraTemplateRenderer,
};

use crate::common::{config_from, editor_invitation, mock_composer, tracker_config};

#[test_log::test(tokio::test)]
async fn test_invitation_email_workflow_e2e() -> Result<()> {
    let (composer, service) = mock_composer(tracker_config()?)?;
    let invitation = editor_invitation("abc123", "new@x.com");

    let result = composer.compose_and_send(&invitation, None).await;

    assert_eq!(
        result.into_parts(),
        (
            true,
            "http://localhost:4200/accept-invitation?token=abc123".to_string()
        )
    );

    let captured = service
        .get_latest_invitation_email("new@x.com")
        .expect("invitation email captured");
    let message = &captured.message;

    assert_eq!(message.subject, "Invitation to join Tracker");
    assert_eq!(message.from, "no-reply@tracker.test");
    assert_eq!(message.to, vec!["new@x.com".to_string()]);
    assert_eq!(captured.extract_invitation_token().as_deref(), Some("abc123"));

    let html = message.body_html.as_deref().expect("html body");
    assert!(html.contains("<strong>admin</strong>"));
    assert!(html.contains("<strong>Editor</strong>"));

    // Plain text keeps every readable sentence and drops all markup
    let text = &message.body_text;
    assert!(!text.contains('<') && !text.contains('>'));
    for sentence in [
        "You're invited to join Tracker!",
        "Hi new@x.com,",
        "admin has invited you to join Tracker as Editor.",
        "Accept Invitation",
        "Or copy and paste this link in your browser:",
        "http://localhost:4200/accept-invitation?token=abc123",
        "If you weren't expecting this invitation, you can safely ignore this email.",
        "The Tracker Team",
    ] {
        assert!(text.contains(sentence), "missing {:?} in:\n{}", sentence, text);
    }

    Ok(())
}

#[tokio::test]
async fn test_token_round_trips_through_link() -> Result<()> {
    let (composer, service) = mock_composer(tracker_config()?)?;

    for token in ["plain123", "with space", "a+b/c=", "ünïcødé&more"] {
        let invitation = editor_invitation(token, "round@trip.test");
        let result = composer.compose_and_send(&invitation, None).await;
        assert!(result.succeeded());

        assert_eq!(
            service
                .get_invitation_token_for_email("round@trip.test")
                .as_deref(),
            Some(token)
        );
        service.clear();
    }

    Ok(())
}

#[tokio::test]
async fn test_failed_send_keeps_link_and_does_not_escape() -> Result<()> {
    let (composer, service) = mock_composer(tracker_config()?)?;
    let invitation = editor_invitation("abc123", "new@x.com");

    service.fail_with(EmailError::Smtp("421 service not available".to_string()));
    let result = composer
        .compose_and_send(&invitation, Some("https://school.example.org/"))
        .await;

    assert!(!result.succeeded());
    assert_eq!(
        result.invitation_url(),
        "https://school.example.org/accept-invitation?token=abc123"
    );
    assert!(!service.was_invitation_sent_to("new@x.com"));

    Ok(())
}

#[tokio::test]
async fn test_unconfigured_deployment_uses_fallbacks() -> Result<()> {
    let (composer, service) = mock_composer(config_from(&[(
        "EMAIL_HOST_USER",
        "mailbox@tracker.test",
    )])?)?;
    let invitation = tracker_email::Invitation::new(
        "tok",
        "teacher@school.test",
        Inviter::new("principal").with_name("Ada", "Lovelace"),
        InvitationRole::Teacher,
    );

    let result = composer.compose_and_send(&invitation, None).await;

    assert_eq!(
        result.invitation_url(),
        "http://localhost:4200/accept-invitation?token=tok"
    );

    let message = &service.get_all_emails()[0].message;
    assert_eq!(message.subject, "Invitation to join Student Tracking Platform");
    assert_eq!(message.from, "mailbox@tracker.test");
    assert!(message
        .body_text
        .contains("Ada Lovelace has invited you to join Student Tracking Platform as Teacher."));

    Ok(())
}

#[tokio::test]
async fn test_composer_with_factory_built_service() -> Result<()> {
    let config = config_from(&[
        ("EMAIL_PROVIDER", "mock"),
        ("SITE_NAME", "Tracker"),
        ("DEFAULT_FROM_EMAIL", "no-reply@tracker.test"),
    ])?;

    let service = EmailServiceFactory::create(&config).await?;
    assert_eq!(service.provider(), "mock");

    let composer = InvitationComposer::new(
        config,
        std::sync::Arc::from(service),
        std::sync::Arc::new(TeraTemplateRenderer::new()?),
    );

    let result = composer
        .compose_and_send(&editor_invitation("abc123", "new@x.com"), None)
        .await;
    assert!(result.succeeded());

    Ok(())
}

#[tokio::test]
async fn test_template_directory_override() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::create_dir_all(dir.path().join("emails"))?;
    std::fs::write(
        dir.path().join("emails/invitation.html"),
        "<p>{{ invited_by }} wants you on {{ site_name }}: <a href=\"{{ invitation_url }}\">{{ invitation_url }}</a></p>",
    )?;

    let config = EmailConfig {
        template_dir: Some(dir.path().display().to_string()),
        ..tracker_config()?
    };
    let (composer, service) = mock_composer(config)?;

    composer
        .compose_and_send(&editor_invitation("abc123", "new@x.com"), None)
        .await;

    let message = &service.get_all_emails()[0].message;
    assert_eq!(
        message.body_text,
        "admin wants you on Tracker: http://localhost:4200/accept-invitation?token=abc123"
    );

    Ok(())
}

#[tokio::test]
async fn test_disabled_service_reports_success_without_capture() -> Result<()> {
    let config = tracker_config()?;
    let service = MockEmailService::new_disabled();
    let composer = InvitationComposer::new(
        config,
        std::sync::Arc::new(service.clone()),
        std::sync::Arc::new(TeraTemplateRenderer::new()?),
    );

    let result = composer
        .compose_and_send(&editor_invitation("abc123", "new@x.com"), None)
        .await;

    assert!(result.succeeded());
    assert_eq!(service.email_count(), 0);

    Ok(())
}

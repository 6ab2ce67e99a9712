//! Email configuration
//!
//! Loaded from environment variables (and `.env` through `dotenvy`). Every
//! invitation-related setting is optional; the accessors below apply the
//! documented fallbacks so callers never deal with missing values directly.

use std::time::Duration;

use crate::EmailError;

/// Site name used in subjects and templates when `SITE_NAME` is unset.
///
/// Deployments should set `SITE_NAME`; the fallback exists for local runs.
pub const DEFAULT_SITE_NAME: &str = "Student Tracking Platform";

/// Frontend base URL used for acceptance links when `FRONTEND_URL` is unset.
///
/// Deployments should set `FRONTEND_URL`; the fallback points at the local dev server.
pub const DEFAULT_FRONTEND_BASE_URL: &str = "http://localhost:4200";

/// SMTP transport settings
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Password paired with [`EmailConfig::host_user`] for SMTP authentication
    pub password: Option<String>,
    /// Upgrade the connection with STARTTLS
    pub use_tls: bool,
    pub timeout: Option<Duration>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 587,
            password: None,
            use_tls: true,
            timeout: None,
        }
    }
}

/// Email service configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Email service provider (smtp, ses, mock)
    pub provider: String,
    /// Enable email sending (can disable for testing)
    pub enabled: bool,
    /// Display name of the platform
    pub site_name: Option<String>,
    /// Base URL of the frontend serving the acceptance page
    pub frontend_base_url: Option<String>,
    /// Default from address
    pub default_from: Option<String>,
    /// Mailbox account, used as SMTP login and as the fallback from address
    pub host_user: Option<String>,
    pub smtp: SmtpConfig,
    /// AWS region for SES
    pub aws_region: Option<String>,
    /// AWS endpoint URL (for LocalStack)
    pub aws_endpoint_url: Option<String>,
    /// Directory with template overrides
    pub template_dir: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            enabled: true,
            site_name: None,
            frontend_base_url: None,
            default_from: None,
            host_user: None,
            smtp: SmtpConfig::default(),
            aws_region: None,
            aws_endpoint_url: None,
            template_dir: None,
        }
    }
}

impl EmailConfig {
    /// Create email config from environment variables
    pub fn from_env() -> Result<Self, EmailError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create email config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EmailError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = SmtpConfig::default();

        let port = match get("EMAIL_PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                EmailError::Configuration(format!("EMAIL_PORT is not a valid port: {}", raw))
            })?,
            None => defaults.port,
        };

        let timeout = match get("EMAIL_TIMEOUT") {
            Some(raw) => Some(Duration::from_secs(raw.trim().parse().map_err(|_| {
                EmailError::Configuration(format!(
                    "EMAIL_TIMEOUT is not a number of seconds: {}",
                    raw
                ))
            })?)),
            None => None,
        };

        let smtp = SmtpConfig {
            host: get("EMAIL_HOST").unwrap_or(defaults.host),
            port,
            password: get("EMAIL_HOST_PASSWORD"),
            use_tls: parse_flag("EMAIL_USE_TLS", get("EMAIL_USE_TLS"), defaults.use_tls)?,
            timeout,
        };

        Ok(Self {
            provider: get("EMAIL_PROVIDER").unwrap_or_else(|| "mock".to_string()),
            enabled: parse_flag("EMAIL_ENABLED", get("EMAIL_ENABLED"), true)?,
            site_name: get("SITE_NAME"),
            frontend_base_url: get("FRONTEND_URL"),
            default_from: get("DEFAULT_FROM_EMAIL"),
            host_user: get("EMAIL_HOST_USER"),
            smtp,
            aws_region: get("AWS_REGION"),
            aws_endpoint_url: get("AWS_ENDPOINT_URL"),
            template_dir: get("EMAIL_TEMPLATE_DIR"),
        })
    }

    /// Site display name, falling back to [`DEFAULT_SITE_NAME`]
    pub fn site_name(&self) -> &str {
        non_empty(&self.site_name).unwrap_or(DEFAULT_SITE_NAME)
    }

    /// Frontend base URL, falling back to [`DEFAULT_FRONTEND_BASE_URL`]
    pub fn frontend_base_url(&self) -> &str {
        non_empty(&self.frontend_base_url).unwrap_or(DEFAULT_FRONTEND_BASE_URL)
    }

    /// Sender address: the default from address, else the mailbox account
    pub fn from_address(&self) -> Result<&str, EmailError> {
        non_empty(&self.default_from)
            .or_else(|| non_empty(&self.host_user))
            .ok_or_else(|| {
                EmailError::Configuration(
                    "no sender address: set DEFAULT_FROM_EMAIL or EMAIL_HOST_USER".to_string(),
                )
            })
    }

    /// Whether the site name comes from the hardcoded fallback
    pub fn uses_default_site_name(&self) -> bool {
        non_empty(&self.site_name).is_none()
    }

    /// Whether the frontend base URL comes from the hardcoded fallback
    pub fn uses_default_frontend_base_url(&self) -> bool {
        non_empty(&self.frontend_base_url).is_none()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn parse_flag(key: &str, raw: Option<String>, default: bool) -> Result<bool, EmailError> {
    let Some(raw) = raw else {
        return Ok(default);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(EmailError::Configuration(format!(
            "{} is not a boolean: {}",
            key, raw
        ))),
    }
}

//! Email Templates
//!
//! Rendering of email bodies behind the [`TemplateRenderer`] trait. The
//! production renderer uses `tera` with the invitation template embedded at
//! compile time; a template directory can override it without a rebuild.

use std::error::Error as _;
use std::path::Path;

use tera::{Context, Tera};

use crate::{EmailConfig, EmailError};

/// Template id of the invitation email
pub const INVITATION_TEMPLATE: &str = "emails/invitation.html";

/// Renders a template id with a key-value context into markup
pub trait TemplateRenderer: Send + Sync {
    /// `context` must be a JSON object; each key becomes a template variable.
    fn render(&self, template_id: &str, context: &serde_json::Value) -> Result<String, EmailError>;
}

/// `tera`-backed renderer
pub struct TeraTemplateRenderer {
    engine: Tera,
}

impl TeraTemplateRenderer {
    /// Create a renderer holding the embedded templates
    pub fn new() -> Result<Self, EmailError> {
        let mut engine = Tera::default();

        engine
            .add_raw_templates(vec![(
                INVITATION_TEMPLATE,
                include_str!("../templates/emails/invitation.html"),
            )])
            .map_err(template_error)?;

        Ok(Self { engine })
    }

    /// Create a renderer from `*.html` files under `dir`, falling back to the
    /// embedded templates for ids the directory does not provide
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, EmailError> {
        let pattern = format!("{}/**/*.html", dir.as_ref().display());
        let mut engine = Tera::new(&pattern).map_err(template_error)?;

        let embedded = Self::new()?;
        engine.extend(&embedded.engine).map_err(template_error)?;

        tracing::info!(
            template_dir = %dir.as_ref().display(),
            "Loaded email templates from directory"
        );

        Ok(Self { engine })
    }

    /// Create a renderer honouring `EMAIL_TEMPLATE_DIR` when configured
    pub fn from_config(config: &EmailConfig) -> Result<Self, EmailError> {
        match config.template_dir.as_deref() {
            Some(dir) => Self::from_dir(dir),
            None => Self::new(),
        }
    }
}

impl TemplateRenderer for TeraTemplateRenderer {
    fn render(&self, template_id: &str, context: &serde_json::Value) -> Result<String, EmailError> {
        let context = Context::from_value(context.clone()).map_err(template_error)?;

        self.engine
            .render(template_id, &context)
            .map_err(template_error)
    }
}

/// Flatten a tera error with its causes; the top-level message alone rarely
/// names the missing variable or template.
fn template_error(error: tera::Error) -> EmailError {
    let mut message = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    EmailError::Template(message)
}

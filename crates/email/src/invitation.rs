//! Invitation records as seen by the email service
//!
//! Invitations are created and persisted elsewhere; this crate only reads them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role the invited user will hold once the invitation is accepted
///
/// Known roles serialize as `"ADMIN"`, `"TEACHER"`, ...; any other value
/// round-trips through [`InvitationRole::Other`] unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationRole {
    Admin,
    Teacher,
    Student,
    Parent,
    Editor,
    Viewer,
    #[serde(untagged)]
    Other(String),
}

impl InvitationRole {
    /// Human-readable label shown in emails
    pub fn label(&self) -> &str {
        match self {
            InvitationRole::Admin => "Administrator",
            InvitationRole::Teacher => "Teacher",
            InvitationRole::Student => "Student",
            InvitationRole::Parent => "Parent",
            InvitationRole::Editor => "Editor",
            InvitationRole::Viewer => "Viewer",
            InvitationRole::Other(label) => label,
        }
    }
}

impl fmt::Display for InvitationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The user who sent an invitation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inviter {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl Inviter {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            first_name: String::new(),
            last_name: String::new(),
        }
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    /// First and last name joined by a space, trimmed. Empty when neither is set.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Full name when present, otherwise the username.
    ///
    /// An inviter with neither is caller misuse: debug builds panic on it,
    /// release builds return an empty string.
    pub fn display_name(&self) -> String {
        let full_name = self.full_name();
        let display_name = if full_name.is_empty() {
            self.username.clone()
        } else {
            full_name
        };
        debug_assert!(
            !display_name.is_empty(),
            "inviter has neither name nor username"
        );
        display_name
    }
}

/// A pending invitation to join the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    /// Opaque token identifying the invitation; the only credential in the acceptance link
    pub token: String,
    /// Recipient address
    pub email: String,
    pub invited_by: Inviter,
    pub role: InvitationRole,
}

impl Invitation {
    pub fn new(
        token: impl Into<String>,
        email: impl Into<String>,
        invited_by: Inviter,
        role: InvitationRole,
    ) -> Self {
        Self {
            token: token.into(),
            email: email.into(),
            invited_by,
            role,
        }
    }
}

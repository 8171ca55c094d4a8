use std::fmt;

use serde::{Deserialize, Serialize};

/// The authenticated identity as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl AuthUser {
    /// The part of the email before `@`, used for the greeting.
    pub fn display_name(&self) -> Option<&str> {
        let email = self.email.as_deref()?;
        let local = email.split('@').next().unwrap_or(email);
        if local.is_empty() {
            None
        } else {
            Some(local)
        }
    }
}

/// A signed-in session: bearer tokens plus the user they belong to.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// UNIX timestamp (seconds) at which `access_token` stops being valid.
    pub expires_at: i64,
    pub token_type: String,
    pub user: AuthUser,
}

impl AuthSession {
    /// True when the access token expires within `margin_secs` of `now`.
    pub fn expires_within(&self, now: i64, margin_secs: i64) -> bool {
        self.expires_at.saturating_sub(margin_secs) <= now
    }
}

// Tokens never end up in logs.
impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("token_type", &self.token_type)
            .field("user", &self.user)
            .finish()
    }
}

/// Who the top-level view is showing data for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "user", rename_all = "snake_case")]
pub enum SessionState {
    /// Initial session check has not completed yet.
    Loading,
    Unauthenticated,
    Authenticated(AuthUser),
}

impl SessionState {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

/// Kind of session change being announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// A session-change notification. `session` is `None` after sign-out or expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<AuthSession>,
}

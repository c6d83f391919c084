use serde::{Deserialize, Serialize};

/// The authenticated user for the current session.
///
/// Immutable for the lifetime of a session; a new login produces a new
/// `User` and discards all prior in-memory note state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    /// Display name. Defaults to the email local-part when the account
    /// carries no full name.
    pub name: String,
}

impl User {
    pub fn new(id: String, email: String, name: Option<String>) -> Self {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| default_name(&email));
        Self { id, email, name }
    }

    /// First word of the display name, for greeting copy.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// Fallback display name: the local-part of the email address.
fn default_name(email: &str) -> String {
    let local = email.split('@').next().unwrap_or("");
    if local.is_empty() {
        "User".to_string()
    } else {
        local.to_string()
    }
}

/// An authenticated session as persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: User,
}

/// Outcome of a signup attempt.
///
/// Providers that require email verification return no session from signup;
/// the account becomes usable only after the emailed code is verified.
#[derive(Debug, Clone)]
pub enum SignupOutcome {
    SignedIn(AuthSession),
    VerificationRequired { email: String },
}

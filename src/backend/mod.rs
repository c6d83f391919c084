//! Clients for the hosted backend: a PostgREST-style record service for
//! notes and a GoTrue-style auth service. Both live under one base URL and
//! share the project's public API key.

pub mod auth;
mod error;
pub mod notes;

pub use auth::{AuthClient, SessionManager};
pub use error::BackendError;
pub use notes::{HostedNoteStore, MemoryNoteStore, NoteStore};

/// Default URL for local development (a `supabase start` stack).
const DEFAULT_URL: &str = "http://localhost:54321";

/// Connection settings for the hosted backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    /// The project's public (anon) API key. Sent as the `apikey` header on
    /// every request; user-scoped calls add a bearer token on top.
    pub api_key: String,
}

impl BackendConfig {
    /// Create from environment variables:
    /// - `QUILLPAD_BACKEND_URL` - base URL (default: local dev stack)
    /// - `QUILLPAD_BACKEND_KEY` - public API key
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("QUILLPAD_BACKEND_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        let api_key = std::env::var("QUILLPAD_BACKEND_KEY").unwrap_or_default();
        Self::new(base_url, api_key)
    }

    /// Create with explicit configuration.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            api_key: api_key.into(),
        }
    }
}

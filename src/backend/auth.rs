//! The auth provider: GoTrue-style password sessions with email
//! verification, plus the [`SessionManager`] that persists the session
//! between runs and broadcasts auth-state changes to the host application.

use reqwest::Client;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tokio::sync::watch;

use super::error::error_from_response;
use super::{BackendConfig, BackendError};
use crate::models::{AuthSession, SignupOutcome, User};

/// Client for the auth endpoints.
#[derive(Debug, Clone)]
pub struct AuthClient {
    config: BackendConfig,
    client: Client,
}

/// Wire shape of a session response.
#[derive(Debug, Deserialize)]
struct WireSession {
    access_token: String,
    refresh_token: Option<String>,
    user: WireUser,
}

/// Wire shape of a user record.
#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    email: Option<String>,
    user_metadata: Option<WireMetadata>,
}

#[derive(Debug, Deserialize)]
struct WireMetadata {
    full_name: Option<String>,
}

impl WireUser {
    fn into_user(self) -> User {
        let name = self.user_metadata.and_then(|m| m.full_name);
        User::new(self.id, self.email.unwrap_or_default(), name)
    }
}

impl WireSession {
    fn into_session(self) -> AuthSession {
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            user: self.user.into_user(),
        }
    }
}

impl AuthClient {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/auth/v1{}", self.config.base_url, path);
        self.client
            .request(method, &url)
            .header("apikey", &self.config.api_key)
    }

    async fn session_response(
        &self,
        response: reqwest::Response,
    ) -> Result<AuthSession, BackendError> {
        if response.status().is_success() {
            let wire: WireSession = response.json().await?;
            Ok(wire.into_session())
        } else {
            Err(error_from_response(response).await)
        }
    }

    /// Password login.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let response = self
            .request(reqwest::Method::POST, "/token?grant_type=password")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        self.session_response(response).await
    }

    /// Create an account. When the provider requires email verification it
    /// returns a bare user instead of a session; the account becomes usable
    /// only after [`AuthClient::verify_code`].
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<SignupOutcome, BackendError> {
        let response = self
            .request(reqwest::Method::POST, "/signup")
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": { "full_name": name },
            }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let value: serde_json::Value = response.json().await?;
        if value.get("access_token").is_some() {
            let wire: WireSession = serde_json::from_value(value)
                .map_err(|e| BackendError::Server(format!("malformed session: {}", e)))?;
            Ok(SignupOutcome::SignedIn(wire.into_session()))
        } else {
            Ok(SignupOutcome::VerificationRequired {
                email: email.to_string(),
            })
        }
    }

    /// Redeem an emailed signup code for a session.
    pub async fn verify_code(&self, email: &str, code: &str) -> Result<AuthSession, BackendError> {
        let response = self
            .request(reqwest::Method::POST, "/verify")
            .json(&serde_json::json!({
                "type": "signup",
                "email": email,
                "token": code,
            }))
            .send()
            .await?;
        self.session_response(response).await
    }

    /// Re-send the signup verification email.
    pub async fn resend_verification(&self, email: &str) -> Result<(), BackendError> {
        let response = self
            .request(reqwest::Method::POST, "/resend")
            .json(&serde_json::json!({ "type": "signup", "email": email }))
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }

    /// Revoke the session server-side.
    pub async fn logout(&self, access_token: &str) -> Result<(), BackendError> {
        let response = self
            .request(reqwest::Method::POST, "/logout")
            .bearer_auth(access_token)
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }

    /// The user owning `access_token`, if the token is still valid.
    pub async fn current_user(&self, access_token: &str) -> Result<User, BackendError> {
        let response = self
            .request(reqwest::Method::GET, "/user")
            .bearer_auth(access_token)
            .send()
            .await?;
        if response.status().is_success() {
            let wire: WireUser = response.json().await?;
            Ok(wire.into_user())
        } else {
            Err(error_from_response(response).await)
        }
    }

    /// Exchange a refresh token for a fresh session.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, BackendError> {
        let response = self
            .request(reqwest::Method::POST, "/token?grant_type=refresh_token")
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        self.session_response(response).await
    }
}

// ============================================================
// Session manager
// ============================================================

/// Owns the persisted auth session and broadcasts auth-state changes.
///
/// The session file lives next to the app config; a restart restores the
/// session so the user is not asked to log in every time. Subscribers see
/// `Some(user)` after login/restore and `None` after logout.
pub struct SessionManager {
    client: AuthClient,
    path: PathBuf,
    session: Option<AuthSession>,
    tx: watch::Sender<Option<User>>,
}

impl SessionManager {
    pub fn new(client: AuthClient, path: PathBuf) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            client,
            path,
            session: None,
            tx,
        }
    }

    /// The auth-state stream. Subscribe at startup, before `restore`.
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.tx.subscribe()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn access_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.access_token.as_str())
    }

    /// Restore the persisted session, if any.
    ///
    /// The stored access token is revalidated against the provider. An
    /// expired token is refreshed when a refresh token is on hand; a token
    /// the provider rejects outright clears the stored session. Transport
    /// failures keep the stored session, since nothing can be decided
    /// while the provider is unreachable.
    pub async fn restore(&mut self) -> Option<User> {
        let stored = self.read_session_file()?;
        match self.client.current_user(&stored.access_token).await {
            Ok(user) => {
                let session = AuthSession { user, ..stored };
                self.install(session);
            }
            Err(BackendError::Unauthorized(_)) => {
                let refreshed = match &stored.refresh_token {
                    Some(token) => self.client.refresh(token).await.ok(),
                    None => None,
                };
                match refreshed {
                    Some(session) => self.install(session),
                    None => {
                        tracing::info!("stored session expired, logging out");
                        self.clear();
                        return None;
                    }
                }
            }
            Err(e) => {
                tracing::warn!("could not validate stored session: {}", e);
                self.install(stored);
            }
        }
        self.current_user().cloned()
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<User, BackendError> {
        let session = self.client.login(email, password).await?;
        let user = session.user.clone();
        self.install(session);
        Ok(user)
    }

    pub async fn signup(
        &mut self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<SignupOutcome, BackendError> {
        let outcome = self.client.signup(email, password, name).await?;
        if let SignupOutcome::SignedIn(session) = &outcome {
            self.install(session.clone());
        }
        Ok(outcome)
    }

    pub async fn verify_code(&mut self, email: &str, code: &str) -> Result<User, BackendError> {
        let session = self.client.verify_code(email, code).await?;
        let user = session.user.clone();
        self.install(session);
        Ok(user)
    }

    pub async fn resend_verification(&self, email: &str) -> Result<(), BackendError> {
        self.client.resend_verification(email).await
    }

    /// End the session. Server-side revocation is best-effort; local state
    /// is cleared regardless.
    pub async fn logout(&mut self) {
        if let Some(session) = &self.session {
            if let Err(e) = self.client.logout(&session.access_token).await {
                tracing::warn!("server-side logout failed: {}", e);
            }
        }
        self.clear();
    }

    fn install(&mut self, session: AuthSession) {
        self.write_session_file(&session);
        let user = session.user.clone();
        self.session = Some(session);
        let _ = self.tx.send(Some(user));
    }

    fn clear(&mut self) {
        self.session = None;
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                tracing::warn!("failed to remove session file: {}", e);
            }
        }
        let _ = self.tx.send(None);
    }

    fn read_session_file(&self) -> Option<AuthSession> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!("discarding unreadable session file: {}", e);
                None
            }
        }
    }

    fn write_session_file(&self, session: &AuthSession) {
        let result = (|| -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let content = serde_json::to_string_pretty(session)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            fs::write(&self.path, content)
        })();
        if let Err(e) = result {
            tracing::warn!("failed to persist session: {}", e);
        }
    }
}

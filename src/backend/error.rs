use reqwest::StatusCode;
use thiserror::Error;

/// Errors from the hosted backend (note store and auth provider).
///
/// Callers treat every variant as a generic failure with a human-readable
/// message; the variants exist so the auth screens can distinguish an
/// unauthorized response from transport trouble.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Server error: {0}")]
    Server(String),
}

impl BackendError {
    /// The message shown to the user, without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Http(e) => e.to_string(),
            Self::NotFound(m)
            | Self::BadRequest(m)
            | Self::Unauthorized(m)
            | Self::Server(m) => m.clone(),
        }
    }
}

/// Map a non-success response to a `BackendError`, pulling the provider's
/// human-readable message out of the JSON body when one is present.
pub(crate) async fn error_from_response(response: reqwest::Response) -> BackendError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = extract_message(&body, status);
    match status {
        StatusCode::NOT_FOUND => BackendError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            BackendError::BadRequest(message)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Unauthorized(message),
        _ => BackendError::Server(format!("{}: {}", status, message)),
    }
}

/// Hosted providers disagree on the error-message key; try the known ones
/// before falling back to the raw body.
fn extract_message(body: &str, status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error_description", "message", "msg", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
    }
    if body.is_empty() {
        status.to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_provider_error_description() {
        let body = r#"{"error_description":"Email not confirmed"}"#;
        assert_eq!(
            extract_message(body, StatusCode::BAD_REQUEST),
            "Email not confirmed"
        );
    }

    #[test]
    fn falls_back_to_raw_body() {
        assert_eq!(
            extract_message("upstream timeout", StatusCode::BAD_GATEWAY),
            "upstream timeout"
        );
    }

    #[test]
    fn falls_back_to_status_when_body_empty() {
        assert_eq!(
            extract_message("", StatusCode::INTERNAL_SERVER_ERROR),
            "500 Internal Server Error"
        );
    }
}

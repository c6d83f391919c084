//! Text assist: stateless text-in/text-out transforms backed by a hosted
//! generative model. Each call is a single request/response; no chat state
//! is kept anywhere.
//!
//! Degradation rules differ by action. Title generation is cosmetic and
//! never fails: any problem collapses to a default title. Continuation
//! returns an empty string when no credentials are configured. The
//! rewrite-style actions surface their errors so the caller can show them,
//! except that an empty model response falls back to the input text.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

/// Default title used when generation is unavailable or yields nothing.
pub const DEFAULT_TITLE: &str = "Untitled Note";

/// Model used for all transforms.
const MODEL: &str = "gemini-3-flash-preview";

/// Default endpoint for the hosted model.
const DEFAULT_URL: &str = "https://generativelanguage.googleapis.com";

/// How much leading context a title request sees.
const TITLE_INPUT_CHARS: usize = 1000;

/// How much trailing context a continuation request sees.
const CONTINUE_INPUT_CHARS: usize = 1000;

/// Errors surfaced to the editor's status line.
#[derive(Debug, Error)]
pub enum AssistError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI assist is not configured (set QUILLPAD_ASSIST_KEY)")]
    NotConfigured,

    #[error("{0}")]
    Failed(String),
}

/// The five assist actions offered by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistAction {
    GenerateTitle,
    Summarize,
    Improve,
    FixGrammar,
    Continue,
}

impl AssistAction {
    pub const ALL: [AssistAction; 5] = [
        AssistAction::GenerateTitle,
        AssistAction::Summarize,
        AssistAction::Improve,
        AssistAction::FixGrammar,
        AssistAction::Continue,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::GenerateTitle => "Generate title",
            Self::Summarize => "Summarize",
            Self::Improve => "Improve writing",
            Self::FixGrammar => "Fix grammar",
            Self::Continue => "Continue writing",
        }
    }
}

/// Client for the assist provider.
#[derive(Debug, Clone)]
pub struct AssistClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl AssistClient {
    /// Create from environment variables:
    /// - `QUILLPAD_ASSIST_KEY` - API key; absent means degraded mode
    /// - `QUILLPAD_ASSIST_URL` - endpoint override
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("QUILLPAD_ASSIST_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        let api_key = std::env::var("QUILLPAD_ASSIST_KEY")
            .ok()
            .filter(|k| !k.is_empty());
        Self::new(base_url, api_key)
    }

    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            client: Client::new(),
        }
    }

    /// One generateContent round trip, trimmed.
    async fn generate(&self, prompt: String) -> Result<String, AssistError> {
        let key = self.api_key.as_ref().ok_or(AssistError::NotConfigured)?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, MODEL
        );
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .json(&serde_json::json!({
                "contents": [{ "parts": [{ "text": prompt }] }],
            }))
            .send()
            .await?
            .error_for_status()?;
        let body: GenerateResponse = response.json().await?;
        let text = body
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect::<String>();
        Ok(text.trim().to_string())
    }

    /// Generate a short title for the note content. Never fails: missing
    /// credentials, provider errors and empty output all collapse to
    /// [`DEFAULT_TITLE`].
    pub async fn generate_title(&self, content: &str) -> String {
        if content.trim().is_empty() {
            return DEFAULT_TITLE.to_string();
        }
        let prompt = format!(
            "Generate a concise, engaging title (max 6 words) for the following note content. \
             Do not use quotes. Content: {}",
            head(content, TITLE_INPUT_CHARS)
        );
        match self.generate(prompt).await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => DEFAULT_TITLE.to_string(),
            Err(e) => {
                tracing::error!("title generation failed: {}", e);
                DEFAULT_TITLE.to_string()
            }
        }
    }

    /// Bullet-point summary of the content.
    pub async fn summarize(&self, content: &str) -> Result<String, AssistError> {
        if content.trim().is_empty() {
            return Ok(String::new());
        }
        let prompt = format!(
            "Provide a concise bullet-point summary of the following text. \
             Use markdown for the bullets. Text: {}",
            content
        );
        self.generate(prompt).await.map_err(|e| {
            tracing::error!("summarize failed: {}", e);
            action_error(e, "Failed to summarize content.")
        })
    }

    /// Rewrite for clarity. Empty model output falls back to the input.
    pub async fn improve(&self, content: &str) -> Result<String, AssistError> {
        if content.trim().is_empty() {
            return Ok(String::new());
        }
        let prompt = format!(
            "Rewrite the following text to be more clear, professional, and concise. \
             Maintain the original meaning. Return only the rewritten text. Text: {}",
            content
        );
        match self.generate(prompt).await {
            Ok(text) if text.is_empty() => Ok(content.to_string()),
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::error!("improve failed: {}", e);
                Err(action_error(e, "Failed to improve writing."))
            }
        }
    }

    /// Correct grammar and spelling. Empty model output falls back to the
    /// input.
    pub async fn fix_grammar(&self, content: &str) -> Result<String, AssistError> {
        if content.trim().is_empty() {
            return Ok(String::new());
        }
        let prompt = format!(
            "Correct the grammar and spelling in the following text. \
             Return only the corrected text. Text: {}",
            content
        );
        match self.generate(prompt).await {
            Ok(text) if text.is_empty() => Ok(content.to_string()),
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::error!("fix grammar failed: {}", e);
                Err(action_error(e, "Failed to fix grammar."))
            }
        }
    }

    /// Continue the text from its trailing context, returning only the
    /// added sentences. Missing credentials degrade to an empty addition.
    pub async fn continue_writing(&self, content: &str) -> Result<String, AssistError> {
        if content.trim().is_empty() {
            return Ok(String::new());
        }
        if self.api_key.is_none() {
            return Ok(String::new());
        }
        let prompt = format!(
            "Continue the following text naturally. Add about 2-3 sentences. \
             Return only the added text. Text: {}",
            tail(content, CONTINUE_INPUT_CHARS)
        );
        self.generate(prompt).await.map_err(|e| {
            tracing::error!("continue failed: {}", e);
            action_error(e, "Failed to continue writing.")
        })
    }
}

/// Keep configuration errors recognizable; everything else becomes the
/// action's user-facing message.
fn action_error(e: AssistError, message: &str) -> AssistError {
    match e {
        AssistError::NotConfigured => AssistError::NotConfigured,
        _ => AssistError::Failed(message.to_string()),
    }
}

/// First `limit` characters, on a char boundary.
fn head(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Last `limit` characters, on a char boundary.
fn tail(text: &str, limit: usize) -> &str {
    let count = text.chars().count();
    if count <= limit {
        return text;
    }
    let (idx, _) = text.char_indices().nth(count - limit).unwrap();
    &text[idx..]
}

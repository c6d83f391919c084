//! The note store: remote CRUD for note records, keyed by id and scoped by
//! owner. The hosted implementation talks PostgREST; the in-memory
//! implementation backs demo mode and the specs.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::error_from_response;
use super::{BackendConfig, BackendError};
use crate::models::{CreateNoteInput, Note, UpdateNoteInput};

/// Remote CRUD for note records.
///
/// Every operation fails with a generic [`BackendError`] carrying a
/// human-readable message; callers decide per operation whether to absorb,
/// roll back, or surface it.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// All notes owned by `owner_id`, most recently updated first.
    async fn list(&self, owner_id: &str) -> Result<Vec<Note>, BackendError>;

    /// Create a note. The store assigns id and timestamps.
    async fn create(&self, owner_id: &str, input: CreateNoteInput) -> Result<Note, BackendError>;

    /// Partial update of title/content/updated_at by id.
    async fn update(&self, id: &str, input: UpdateNoteInput) -> Result<(), BackendError>;

    /// Delete by id. Deleting an already-absent id is not an error.
    async fn delete(&self, id: &str) -> Result<(), BackendError>;
}

// ============================================================
// Hosted implementation
// ============================================================

/// PostgREST-backed note store.
#[derive(Debug, Clone)]
pub struct HostedNoteStore {
    config: BackendConfig,
    access_token: String,
    client: Client,
}

impl HostedNoteStore {
    /// A store acting as the user that owns `access_token`. Row-level
    /// security on the hosted table scopes every query to that user.
    pub fn new(config: BackendConfig, access_token: impl Into<String>) -> Self {
        Self {
            config,
            access_token: access_token.into(),
            client: Client::new(),
        }
    }

    /// Build a request against the record endpoint with auth headers.
    fn request(&self, method: reqwest::Method, query: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/rest/v1/notes{}", self.config.base_url, query);
        self.client
            .request(method, &url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.access_token)
    }

    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), BackendError> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }
}

#[async_trait]
impl NoteStore for HostedNoteStore {
    async fn list(&self, owner_id: &str) -> Result<Vec<Note>, BackendError> {
        let query = format!("?select=*&user_id=eq.{}&order=updated_at.desc", owner_id);
        let response = self.request(reqwest::Method::GET, &query).send().await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn create(&self, owner_id: &str, input: CreateNoteInput) -> Result<Note, BackendError> {
        let response = self
            .request(reqwest::Method::POST, "")
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({
                "user_id": owner_id,
                "title": input.title,
                "content": input.content,
            }))
            .send()
            .await?;
        if response.status().is_success() {
            // PostgREST returns the inserted rows as an array.
            let mut rows: Vec<Note> = response.json().await?;
            rows.pop()
                .ok_or_else(|| BackendError::Server("insert returned no row".to_string()))
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn update(&self, id: &str, input: UpdateNoteInput) -> Result<(), BackendError> {
        let response = self
            .request(reqwest::Method::PATCH, &format!("?id=eq.{}", id))
            .json(&input)
            .send()
            .await?;
        self.handle_empty_response(response).await
    }

    async fn delete(&self, id: &str) -> Result<(), BackendError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("?id=eq.{}", id))
            .send()
            .await?;
        self.handle_empty_response(response).await
    }
}

// ============================================================
// In-memory implementation
// ============================================================

/// In-memory note store. Backs `--demo` mode and the integration specs;
/// assigns ids and timestamps the way the hosted service would.
#[derive(Debug, Clone, Default)]
pub struct MemoryNoteStore {
    notes: Arc<RwLock<Vec<Note>>>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing notes, e.g. a prior session's state.
    pub async fn seed(&self, notes: Vec<Note>) {
        *self.notes.write().await = notes;
    }

    /// Snapshot of every stored note regardless of owner.
    pub async fn dump(&self) -> Vec<Note> {
        self.notes.read().await.clone()
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn list(&self, owner_id: &str) -> Result<Vec<Note>, BackendError> {
        let mut notes: Vec<Note> = self
            .notes
            .read()
            .await
            .iter()
            .filter(|n| n.owner_id == owner_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(notes)
    }

    async fn create(&self, owner_id: &str, input: CreateNoteInput) -> Result<Note, BackendError> {
        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            title: input.title,
            content: input.content,
            created_at: now,
            updated_at: now,
        };
        self.notes.write().await.push(note.clone());
        Ok(note)
    }

    async fn update(&self, id: &str, input: UpdateNoteInput) -> Result<(), BackendError> {
        let mut notes = self.notes.write().await;
        match notes.iter_mut().find(|n| n.id == id) {
            Some(note) => {
                note.title = input.title;
                note.content = input.content;
                note.updated_at = input.updated_at;
                Ok(())
            }
            None => Err(BackendError::NotFound(format!("no note with id {}", id))),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), BackendError> {
        self.notes.write().await.retain(|n| n.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_assigns_id_and_timestamps() {
        let store = MemoryNoteStore::new();
        let note = store
            .create("owner-1", CreateNoteInput::default())
            .await
            .unwrap();
        assert!(!note.id.is_empty());
        assert_eq!(note.created_at, note.updated_at);
        assert!(note.is_vacant());
    }

    #[tokio::test]
    async fn memory_store_lists_by_owner_most_recent_first() {
        let store = MemoryNoteStore::new();
        let a = store
            .create("owner-1", CreateNoteInput::default())
            .await
            .unwrap();
        store
            .create("owner-2", CreateNoteInput::default())
            .await
            .unwrap();
        let b = store
            .create("owner-1", CreateNoteInput::default())
            .await
            .unwrap();

        store
            .update(
                &a.id,
                UpdateNoteInput {
                    title: "bumped".to_string(),
                    content: String::new(),
                    updated_at: Utc::now(),
                },
            )
            .await
            .unwrap();

        let listed = store.list("owner-1").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, a.id);
        assert_eq!(listed[1].id, b.id);
    }

    #[tokio::test]
    async fn memory_store_delete_is_idempotent() {
        let store = MemoryNoteStore::new();
        let note = store
            .create("owner-1", CreateNoteInput::default())
            .await
            .unwrap();
        store.delete(&note.id).await.unwrap();
        store.delete(&note.id).await.unwrap();
        assert!(store.list("owner-1").await.unwrap().is_empty());
    }
}

//! The note lifecycle controller.
//!
//! [`Notebook`] owns the in-memory list of the current user's notes, the
//! single active-note pointer, and the policy for when a note is persisted,
//! garbage-collected, or rolled back. The list is fetched once per session
//! and is the source of truth thereafter; mutations are applied locally and
//! mirrored to the store.
//!
//! Failure policy differs deliberately per operation:
//! - update: optimistic, never rolled back (reverting text the user is
//!   typing would destroy their input);
//! - delete: optimistic with full rollback and a surfaced error;
//! - create and vacant-note cleanup: logged only.

pub mod editor;

use std::sync::Arc;

use crate::backend::{BackendError, NoteStore};
use crate::models::{CreateNoteInput, Note, UpdateNoteInput, User};

/// In-memory state for one authenticated user's notes.
pub struct Notebook {
    store: Arc<dyn NoteStore>,
    owner: User,
    notes: Vec<Note>,
    active_id: Option<String>,
    loading: bool,
}

impl Notebook {
    pub fn new(store: Arc<dyn NoteStore>, owner: User) -> Self {
        Self {
            store,
            owner,
            notes: Vec::new(),
            active_id: None,
            loading: true,
        }
    }

    pub fn owner(&self) -> &User {
        &self.owner
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active_note(&self) -> Option<&Note> {
        let id = self.active_id.as_deref()?;
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    /// The list as rendered: filtered by `search` (case-insensitive, over
    /// title and content), sorted by `updated_at` descending. Storage order
    /// is insertion order and carries no meaning.
    pub fn visible_notes(&self, search: &str) -> Vec<&Note> {
        let needle = search.to_lowercase();
        let mut notes: Vec<&Note> = self
            .notes
            .iter()
            .filter(|n| {
                needle.is_empty()
                    || n.title.to_lowercase().contains(&needle)
                    || n.content.to_lowercase().contains(&needle)
            })
            .collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        notes
    }

    /// Initial load: fetch everything the user owns, show the non-vacant
    /// notes immediately, and delete leftover vacant notes in the
    /// background. The UI never waits on that cleanup; its failures are
    /// logged and the next load purges again.
    pub async fn load(&mut self) {
        self.loading = true;
        match self.store.list(&self.owner.id).await {
            Ok(fetched) => {
                let (vacant, valid): (Vec<Note>, Vec<Note>) =
                    fetched.into_iter().partition(|n| n.is_vacant());
                for note in vacant {
                    let store = Arc::clone(&self.store);
                    tokio::spawn(async move {
                        if let Err(e) = store.delete(&note.id).await {
                            tracing::warn!("failed to clean up vacant note {}: {}", note.id, e);
                        }
                    });
                }
                self.notes = valid;
            }
            Err(e) => {
                tracing::error!("failed to load notes: {}", e);
                self.notes = Vec::new();
            }
        }
        self.loading = false;
    }

    /// Make `id` the active note. If a different note was active, it is
    /// cleaned up first so abandoned vacant notes do not accumulate.
    pub async fn select(&mut self, id: &str) {
        if let Some(active) = self.active_id.clone() {
            if active != id {
                self.cleanup(&active).await;
            }
        }
        self.active_id = Some(id.to_string());
    }

    /// Return to the list view, cleaning up the active note if vacant.
    pub async fn back(&mut self) {
        if let Some(active) = self.active_id.clone() {
            self.cleanup(&active).await;
        }
        self.active_id = None;
    }

    /// Create a new vacant note, prepend it, and make it active. The store
    /// assigns id and timestamps. A creation failure is logged only.
    pub async fn add(&mut self) -> Option<Note> {
        if let Some(active) = self.active_id.clone() {
            self.cleanup(&active).await;
        }
        match self
            .store
            .create(&self.owner.id, CreateNoteInput::default())
            .await
        {
            Ok(note) => {
                self.notes.insert(0, note.clone());
                self.active_id = Some(note.id.clone());
                Some(note)
            }
            Err(e) => {
                tracing::error!("failed to create note: {}", e);
                None
            }
        }
    }

    /// Full replacement of a note's fields, applied to the in-memory list
    /// immediately and then persisted. A persistence failure is logged but
    /// the optimistic edit stands.
    ///
    /// Addresses the note by its id, not "the active note", so a flush that
    /// lands after the user switched notes still hits the right record.
    pub async fn update(&mut self, updated: Note) {
        if let Some(slot) = self.notes.iter_mut().find(|n| n.id == updated.id) {
            *slot = updated.clone();
        }
        let input = UpdateNoteInput::from_note(&updated);
        if let Err(e) = self.store.update(&updated.id, input).await {
            tracing::error!("failed to persist note {}: {}", updated.id, e);
        }
    }

    /// Optimistic removal with full rollback. On store failure the prior
    /// list is restored verbatim, the selection is restored if the deleted
    /// note had been active, and the error is returned for the UI to show.
    pub async fn delete(&mut self, id: &str) -> Result<(), BackendError> {
        let prior_notes = self.notes.clone();
        let was_active = self.active_id.as_deref() == Some(id);

        self.notes.retain(|n| n.id != id);
        if was_active {
            self.active_id = None;
        }

        match self.store.delete(id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!("failed to delete note {}: {}", id, e);
                self.notes = prior_notes;
                if was_active {
                    self.active_id = Some(id.to_string());
                }
                Err(e)
            }
        }
    }

    /// Delete `id` if it is vacant. A failed delete is logged and the note
    /// stays in memory; it is retried the next time cleanup runs against it
    /// or purged on the next session's initial load.
    pub async fn cleanup(&mut self, id: &str) {
        let vacant = self.note(id).is_some_and(Note::is_vacant);
        if !vacant {
            return;
        }
        match self.store.delete(id).await {
            Ok(()) => self.notes.retain(|n| n.id != id),
            Err(e) => {
                tracing::warn!("failed to clean up vacant note {}: {}", id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryNoteStore;

    fn owner() -> User {
        User::new("owner-1".to_string(), "ada@example.com".to_string(), None)
    }

    async fn notebook_with_store() -> (Notebook, Arc<MemoryNoteStore>) {
        let store = Arc::new(MemoryNoteStore::new());
        let notebook = Notebook::new(store.clone(), owner());
        (notebook, store)
    }

    #[tokio::test]
    async fn visible_notes_sorts_by_recency_and_filters_by_search() {
        let (mut notebook, _store) = notebook_with_store().await;
        notebook.add().await.unwrap();
        let groceries = notebook.active_note().unwrap();
        notebook
            .update(groceries.with_draft("Groceries", "milk, eggs"))
            .await;
        notebook.add().await.unwrap();
        let meeting = notebook.active_note().unwrap();
        notebook
            .update(meeting.with_draft("Meeting notes", "quarterly review"))
            .await;

        let all = notebook.visible_notes("");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "Meeting notes");
        assert_eq!(all[1].title, "Groceries");

        let hits = notebook.visible_notes("MILK");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Groceries");
    }

    #[tokio::test]
    async fn add_makes_a_vacant_note_active() {
        let (mut notebook, _store) = notebook_with_store().await;
        let note = notebook.add().await.unwrap();
        assert!(note.is_vacant());
        assert_eq!(notebook.active_id(), Some(note.id.as_str()));
        // Legitimately transient: still present until a cleanup runs.
        assert_eq!(notebook.visible_notes("").len(), 1);
    }

    #[tokio::test]
    async fn selecting_same_note_does_not_clean_it_up() {
        let (mut notebook, store) = notebook_with_store().await;
        let note = notebook.add().await.unwrap();
        notebook.select(&note.id).await;
        assert_eq!(notebook.active_id(), Some(note.id.as_str()));
        assert_eq!(store.dump().await.len(), 1);
    }
}

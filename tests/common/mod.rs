//! Shared test doubles: a note store that can be told to fail specific
//! operations, wrapped around the in-memory store.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use quillpad::backend::{BackendError, MemoryNoteStore, NoteStore};
use quillpad::models::{CreateNoteInput, Note, UpdateNoteInput, User};

pub fn owner() -> User {
    User::new(
        "owner-1".to_string(),
        "ada@example.com".to_string(),
        Some("Ada Lovelace".to_string()),
    )
}

/// In-memory store with per-operation failure injection and an update-call
/// counter for the debounce specs.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryNoteStore,
    fail_lists: AtomicBool,
    fail_updates: AtomicBool,
    fail_deletes: AtomicBool,
    update_calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    fn outage() -> BackendError {
        BackendError::Server("simulated outage".to_string())
    }
}

#[async_trait]
impl NoteStore for FlakyStore {
    async fn list(&self, owner_id: &str) -> Result<Vec<Note>, BackendError> {
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        self.inner.list(owner_id).await
    }

    async fn create(&self, owner_id: &str, input: CreateNoteInput) -> Result<Note, BackendError> {
        self.inner.create(owner_id, input).await
    }

    async fn update(&self, id: &str, input: UpdateNoteInput) -> Result<(), BackendError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        self.inner.update(id, input).await
    }

    async fn delete(&self, id: &str) -> Result<(), BackendError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        self.inner.delete(id).await
    }
}

//! Per-open-note editing state: the draft, the dirty flag, and the debounce
//! timer that turns keystrokes into persisted updates.
//!
//! The timer is a cancellable delayed task, not a poll: every edit aborts
//! the pending task and spawns a fresh one, so at most one flush is pending
//! and it always carries the latest draft. When it fires it posts a
//! [`FlushDue`] on the session's channel; the event loop answers by merging
//! the draft into the committed note and handing it to
//! [`Notebook::update`](super::Notebook::update).

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::models::Note;

/// Delay between the last edit and the automatic flush.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

/// Posted when the debounce timer for a note fires.
///
/// Carries the note id so a flush that arrives after the user switched to a
/// different note can be recognized as stale and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushDue {
    pub note_id: String,
}

/// Transient editing state for the currently open note.
pub struct EditorSession {
    note_id: String,
    title: String,
    content: String,
    dirty: bool,
    flush_tx: mpsc::UnboundedSender<FlushDue>,
    pending: Option<JoinHandle<()>>,
}

impl EditorSession {
    /// Open a session seeded from `note`. Replacing a previous session
    /// drops it, which aborts any in-flight debounce for the old note.
    pub fn open(note: &Note, flush_tx: mpsc::UnboundedSender<FlushDue>) -> Self {
        Self {
            note_id: note.id.clone(),
            title: note.title.clone(),
            content: note.content.clone(),
            dirty: false,
            flush_tx,
            pending: None,
        }
    }

    pub fn note_id(&self) -> &str {
        &self.note_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }

    /// Replace the draft title, restarting the debounce timer.
    pub fn set_title(&mut self, title: String) {
        if self.title != title {
            self.title = title;
            self.mark_edited();
        }
    }

    /// Replace the draft content, restarting the debounce timer.
    pub fn set_content(&mut self, content: String) {
        if self.content != content {
            self.content = content;
            self.mark_edited();
        }
    }

    /// Append assist output to the content, separated from the existing
    /// text. Follows the same debounce path as typing.
    pub fn append_content(&mut self, addition: &str) {
        if addition.is_empty() {
            return;
        }
        if self.content.is_empty() {
            self.content = addition.to_string();
        } else {
            self.content = format!("{} {}", self.content.trim_end(), addition);
        }
        self.mark_edited();
    }

    fn mark_edited(&mut self) {
        self.dirty = true;
        self.restart_timer();
    }

    /// Arm the debounce: cancel the pending task, start a fresh one. The
    /// previous timer's effect is dropped entirely; this is the design's
    /// only cancellation point.
    fn restart_timer(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        let tx = self.flush_tx.clone();
        let note_id = self.note_id.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(DEBOUNCE_DELAY).await;
            let _ = tx.send(FlushDue { note_id });
        }));
    }

    /// Answer a fired debounce: if the draft differs from the committed
    /// note, return the merged note (fresh `updated_at`) for persistence.
    /// Returns `None` for a clean draft or a stale flush for another note.
    pub fn take_flush(&mut self, committed: &Note) -> Option<Note> {
        if committed.id != self.note_id {
            return None;
        }
        self.dirty = false;
        if self.title != committed.title || self.content != committed.content {
            Some(committed.with_draft(&self.title, &self.content))
        } else {
            None
        }
    }

    /// Forced flush on exit: when edits exist that the debounce has not yet
    /// persisted, merge immediately so the navigation's vacancy check sees
    /// the latest draft. Cancels the pending timer either way.
    pub fn flush_now(&mut self, committed: &Note) -> Option<Note> {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        if !self.dirty {
            return None;
        }
        self.take_flush(committed)
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

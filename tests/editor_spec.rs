//! Editor session specs: debounce coalescing, forced flush on exit, and the
//! end-to-end typing scenarios. All run on paused virtual time.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::advance;

use common::{owner, FlakyStore};
use quillpad::models::Note;
use quillpad::notebook::editor::{EditorSession, FlushDue};
use quillpad::notebook::Notebook;

fn committed_note(id: &str, title: &str, content: &str) -> Note {
    let now = Utc::now();
    Note {
        id: id.to_string(),
        owner_id: "owner-1".to_string(),
        title: title.to_string(),
        content: content.to_string(),
        created_at: now,
        updated_at: now,
    }
}

/// Poll spawned debounce tasks so an expected absence of events is real.
async fn drain_tasks() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

mod debounce {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn coalesces_rapid_edits_into_one_flush() {
        let note = committed_note("n1", "", "");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = EditorSession::open(&note, tx);

        session.set_content("H".to_string());
        advance(Duration::from_millis(50)).await;
        session.set_content("He".to_string());
        advance(Duration::from_millis(50)).await;
        session.set_content("Hello".to_string());

        let due = rx.recv().await.expect("debounce should fire");
        assert_eq!(due, FlushDue { note_id: "n1".to_string() });

        let merged = session.take_flush(&note).expect("draft differs");
        assert_eq!(merged.content, "Hello");
        assert_eq!(merged.title, "");
        assert!(merged.updated_at >= note.updated_at);
        assert!(!session.is_dirty());

        // Exactly one flush: the first two timers were cancelled.
        advance(Duration::from_secs(2)).await;
        drain_tasks().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn each_edit_restarts_the_pending_timer() {
        let note = committed_note("n1", "", "");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = EditorSession::open(&note, tx);

        session.set_content("a".to_string());
        advance(Duration::from_millis(400)).await;
        drain_tasks().await;
        assert!(rx.try_recv().is_err());

        session.set_content("ab".to_string());
        advance(Duration::from_millis(400)).await;
        drain_tasks().await;
        assert!(rx.try_recv().is_err());

        advance(Duration::from_millis(100)).await;
        let due = rx.recv().await.expect("timer finally fires");
        assert_eq!(due.note_id, "n1");
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_draft_arms_no_timer() {
        let note = committed_note("n1", "Title", "Body");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = EditorSession::open(&note, tx);

        session.set_title("Title".to_string());
        session.set_content("Body".to_string());

        advance(Duration::from_secs(2)).await;
        drain_tasks().await;
        assert!(rx.try_recv().is_err());
        assert!(!session.is_dirty());
    }

    #[tokio::test(start_paused = true)]
    async fn flush_matching_the_committed_draft_persists_nothing() {
        let note = committed_note("n1", "Title", "Body");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = EditorSession::open(&note, tx);

        // Edit away and back again before the debounce fires.
        session.set_content("Bod".to_string());
        session.set_content("Body".to_string());

        let due = rx.recv().await.expect("debounce fires");
        assert_eq!(due.note_id, "n1");
        assert!(session.take_flush(&note).is_none());
        assert!(!session.is_dirty());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_flush_for_another_note_is_dropped() {
        let note = committed_note("n1", "", "");
        let other = committed_note("n2", "Other", "note");
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut session = EditorSession::open(&note, tx);

        session.set_content("draft".to_string());

        assert!(session.take_flush(&other).is_none());
        // A stale flush does not consume the dirty state.
        assert!(session.is_dirty());
    }

    #[tokio::test(start_paused = true)]
    async fn replacing_the_session_aborts_the_pending_debounce() {
        let first = committed_note("n1", "", "");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = EditorSession::open(&first, tx);
        session.set_content("abandoned".to_string());

        // Switching notes replaces the session; dropping the old one must
        // abort its in-flight debounce.
        drop(session);

        advance(Duration::from_secs(2)).await;
        drain_tasks().await;
        assert!(rx.try_recv().is_err());
    }
}

mod forced_flush {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn exit_flushes_a_dirty_draft_immediately() {
        let note = committed_note("n1", "", "");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = EditorSession::open(&note, tx);

        session.set_content("typed just before leaving".to_string());
        let merged = session.flush_now(&note).expect("dirty draft flushes");
        assert_eq!(merged.content, "typed just before leaving");

        // The pending timer was cancelled along the way.
        advance(Duration::from_secs(2)).await;
        drain_tasks().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn exit_with_a_clean_draft_flushes_nothing() {
        let note = committed_note("n1", "Title", "Body");
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut session = EditorSession::open(&note, tx);

        assert!(session.flush_now(&note).is_none());
    }
}

mod scenarios {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn typing_then_pausing_persists_exactly_once_and_back_deletes_nothing() {
        let store = Arc::new(FlakyStore::new());
        let mut notebook = Notebook::new(store.clone(), owner());
        notebook.load().await;
        let note = notebook.add().await.expect("create succeeds");

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut editor = EditorSession::open(&note, tx);
        editor.set_content("H".to_string());
        advance(Duration::from_millis(50)).await;
        editor.set_content("He".to_string());
        advance(Duration::from_millis(50)).await;
        editor.set_content("Hello".to_string());

        let due = rx.recv().await.expect("debounce fires after the pause");
        let committed = notebook.note(&due.note_id).cloned().unwrap();
        if let Some(merged) = editor.take_flush(&committed) {
            notebook.update(merged).await;
        }

        assert_eq!(store.update_calls(), 1);
        assert_eq!(store.inner.dump().await[0].content, "Hello");

        // Back: the draft is clean and the note is non-vacant, so nothing
        // is flushed and nothing is deleted.
        let committed = notebook.note(&note.id).cloned().unwrap();
        assert!(editor.flush_now(&committed).is_none());
        notebook.back().await;
        assert_eq!(store.inner.dump().await.len(), 1);
        assert_eq!(notebook.visible_notes("").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn back_before_the_debounce_fires_flushes_then_cleans_up() {
        let store = Arc::new(FlakyStore::new());
        let mut notebook = Notebook::new(store.clone(), owner());
        notebook.load().await;
        let note = notebook.add().await.expect("create succeeds");

        let (tx, _rx) = mpsc::unbounded_channel();
        let mut editor = EditorSession::open(&note, tx);
        editor.set_content("Hello".to_string());

        // Navigate back while the debounce is still pending: the forced
        // flush must run before cleanup so the vacancy check sees "Hello".
        let committed = notebook.note(&note.id).cloned().unwrap();
        if let Some(merged) = editor.flush_now(&committed) {
            notebook.update(merged).await;
        }
        notebook.back().await;

        let stored = store.inner.dump().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].content, "Hello");
        assert_eq!(notebook.visible_notes("").len(), 1);
    }
}

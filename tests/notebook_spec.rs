//! Lifecycle controller specs: vacant-note garbage collection, optimistic
//! update, and the delete-rollback asymmetry.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use common::{owner, FlakyStore};
use quillpad::models::Note;
use quillpad::notebook::Notebook;

fn stored_note(id: &str, title: &str, content: &str) -> Note {
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

async fn setup() -> (Notebook, Arc<FlakyStore>) {
    let store = Arc::new(FlakyStore::new());
    let notebook = Notebook::new(store.clone(), owner());
    (notebook, store)
}

/// Let fire-and-forget cleanup tasks run to completion.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

mod initial_load {
    use super::*;

    #[tokio::test]
    async fn excludes_vacant_notes_without_waiting_for_their_deletion() {
        let (mut notebook, store) = setup().await;
        store
            .inner
            .seed(vec![
                stored_note("keep", "Groceries", "milk"),
                stored_note("vacant-1", "", ""),
                stored_note("vacant-2", "  ", "\n\t"),
            ])
            .await;

        notebook.load().await;

        let visible = notebook.visible_notes("");
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "keep");
        assert!(!notebook.is_loading());

        settle().await;
        let remaining = store.inner.dump().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "keep");
    }

    #[tokio::test]
    async fn failed_background_cleanup_is_not_surfaced() {
        let (mut notebook, store) = setup().await;
        store.inner.seed(vec![stored_note("vacant", "", "")]).await;
        store.fail_deletes(true);

        notebook.load().await;
        settle().await;

        // The vacant note stays in the store but never reaches the list;
        // the next session's load purges it again.
        assert!(notebook.visible_notes("").is_empty());
        assert_eq!(store.inner.dump().await.len(), 1);
    }

    #[tokio::test]
    async fn read_failure_degrades_to_empty_list() {
        let (mut notebook, store) = setup().await;
        store.inner.seed(vec![stored_note("a", "Title", "x")]).await;
        store.fail_lists(true);

        notebook.load().await;

        assert!(notebook.visible_notes("").is_empty());
        assert!(!notebook.is_loading());
    }
}

mod select_and_cleanup {
    use super::*;

    #[tokio::test]
    async fn selecting_away_from_a_vacant_note_deletes_it() {
        let (mut notebook, store) = setup().await;
        store
            .inner
            .seed(vec![stored_note("b", "Kept", "text")])
            .await;
        notebook.load().await;
        let vacant = notebook.add().await.unwrap();

        notebook.select("b").await;

        assert_eq!(notebook.active_id(), Some("b"));
        assert!(notebook.note(&vacant.id).is_none());
        assert!(store
            .inner
            .dump()
            .await
            .iter()
            .all(|n| n.id != vacant.id));
    }

    #[tokio::test]
    async fn opening_a_vacant_note_and_backing_out_deletes_it() {
        let (mut notebook, store) = setup().await;
        let vacant = notebook.add().await.unwrap();

        notebook.back().await;

        assert_eq!(notebook.active_id(), None);
        assert!(notebook.visible_notes("").is_empty());
        assert!(store.inner.dump().await.is_empty());
        // The id stays unused afterwards.
        assert!(notebook.note(&vacant.id).is_none());
    }

    #[tokio::test]
    async fn cleanup_failure_keeps_the_note_in_memory() {
        let (mut notebook, store) = setup().await;
        let vacant = notebook.add().await.unwrap();
        store.fail_deletes(true);

        notebook.back().await;

        // Logged only: the note remains and is retried later.
        assert!(notebook.note(&vacant.id).is_some());
        assert_eq!(store.inner.dump().await.len(), 1);

        // Retry once the store recovers.
        store.fail_deletes(false);
        notebook.select(&vacant.id).await;
        notebook.back().await;
        assert!(notebook.note(&vacant.id).is_none());
        assert!(store.inner.dump().await.is_empty());
    }

    #[tokio::test]
    async fn non_vacant_active_note_survives_navigation() {
        let (mut notebook, store) = setup().await;
        let note = notebook.add().await.unwrap();
        notebook.update(note.with_draft("Hello", "")).await;

        notebook.back().await;

        assert_eq!(notebook.visible_notes("").len(), 1);
        assert_eq!(store.inner.dump().await.len(), 1);
    }
}

mod add {
    use super::*;

    #[tokio::test]
    async fn yields_a_vacant_note_that_is_immediately_active() {
        let (mut notebook, _store) = setup().await;

        let note = notebook.add().await.unwrap();

        assert!(note.is_vacant());
        assert_eq!(notebook.active_id(), Some(note.id.as_str()));
        // Legitimately transient, not garbage: still listed.
        assert_eq!(notebook.visible_notes("").len(), 1);
    }

    #[tokio::test]
    async fn cleans_up_the_previous_vacant_note_first() {
        let (mut notebook, store) = setup().await;
        let first = notebook.add().await.unwrap();

        let second = notebook.add().await.unwrap();

        assert_ne!(first.id, second.id);
        assert!(notebook.note(&first.id).is_none());
        let remaining = store.inner.dump().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, second.id);
    }
}

mod update_policy {
    use super::*;

    #[tokio::test]
    async fn applies_optimistically_and_persists() {
        let (mut notebook, store) = setup().await;
        let note = notebook.add().await.unwrap();

        notebook.update(note.with_draft("Title", "Body")).await;

        assert_eq!(notebook.note(&note.id).unwrap().title, "Title");
        let stored = store.inner.dump().await;
        assert_eq!(stored[0].content, "Body");
    }

    #[tokio::test]
    async fn store_failure_never_rolls_back_the_local_edit() {
        let (mut notebook, store) = setup().await;
        let note = notebook.add().await.unwrap();
        store.fail_updates(true);

        notebook.update(note.with_draft("Kept locally", "still here")).await;

        let local = notebook.note(&note.id).unwrap();
        assert_eq!(local.title, "Kept locally");
        assert_eq!(local.content, "still here");
        // The store still has the old (vacant) record.
        assert!(store.inner.dump().await[0].is_vacant());
    }
}

mod delete_rollback {
    use super::*;

    #[tokio::test]
    async fn removes_optimistically_and_clears_selection() {
        let (mut notebook, store) = setup().await;
        let note = notebook.add().await.unwrap();
        notebook.update(note.with_draft("Doomed", "x")).await;

        notebook.delete(&note.id).await.unwrap();

        assert!(notebook.visible_notes("").is_empty());
        assert_eq!(notebook.active_id(), None);
        assert!(store.inner.dump().await.is_empty());
    }

    #[tokio::test]
    async fn failure_restores_the_list_and_the_selection() {
        let (mut notebook, store) = setup().await;
        let keep = notebook.add().await.unwrap();
        notebook.update(keep.with_draft("Keep", "a")).await;
        let doomed = notebook.add().await.unwrap();
        notebook.update(doomed.with_draft("Doomed", "b")).await;
        let before: Vec<String> = notebook
            .visible_notes("")
            .iter()
            .map(|n| n.id.clone())
            .collect();
        store.fail_deletes(true);

        let result = notebook.delete(&doomed.id).await;

        assert!(result.is_err());
        let after: Vec<String> = notebook
            .visible_notes("")
            .iter()
            .map(|n| n.id.clone())
            .collect();
        assert_eq!(after, before);
        // The deleted note had been active, so it is active again.
        assert_eq!(notebook.active_id(), Some(doomed.id.as_str()));
    }

    #[tokio::test]
    async fn failure_for_an_inactive_note_leaves_selection_alone() {
        let (mut notebook, store) = setup().await;
        let other = notebook.add().await.unwrap();
        notebook.update(other.with_draft("Other", "x")).await;
        let active = notebook.add().await.unwrap();
        notebook.update(active.with_draft("Active", "y")).await;
        store.fail_deletes(true);

        let result = notebook.delete(&other.id).await;

        assert!(result.is_err());
        assert_eq!(notebook.active_id(), Some(active.id.as_str()));
        assert_eq!(notebook.visible_notes("").len(), 2);
    }
}

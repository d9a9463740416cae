//! Integration tests for the document session store.
//!
//! Exercises: history bounds and ordering, document deletion rules, the three
//! stream insertion modes, cross-document isolation, and observer events.

use quill_core::history::HISTORY_LIMIT;
use quill_core::{
    AbortPolicy, ContentOrigin, DocumentSeed, InsertionMode, Message, SessionStore, StoreError,
    StoreEvent, TextRange,
};

fn seeded(content: &str) -> (SessionStore, quill_core::DocumentId) {
    let store = SessionStore::from_seeds([DocumentSeed::new("Essay", content)]);
    let id = store.active_id().clone();
    (store, id)
}

#[test]
fn n_undos_walk_back_n_edits() {
    let (mut store, id) = seeded("v0");
    for i in 1..=5 {
        store.update_content(&id, format!("v{i}"), true).unwrap();
    }
    for i in (0..5).rev() {
        assert!(store.undo(&id).unwrap());
        assert_eq!(store.content(&id).unwrap(), format!("v{i}"));
    }
    // Floor reached: further undo is a silent no-op.
    assert!(!store.undo(&id).unwrap());
    assert_eq!(store.content(&id).unwrap(), "v0");
}

#[test]
fn redo_restores_until_a_new_edit() {
    let (mut store, id) = seeded("a");
    store.update_content(&id, "b", true).unwrap();
    store.update_content(&id, "c", true).unwrap();
    store.undo(&id).unwrap();
    store.undo(&id).unwrap();
    assert!(store.redo(&id).unwrap());
    assert_eq!(store.content(&id).unwrap(), "b");

    store.update_content(&id, "b2", true).unwrap();
    assert!(!store.redo(&id).unwrap(), "recorded edit must invalidate redo");
    assert_eq!(store.content(&id).unwrap(), "b2");
}

#[test]
fn undo_stack_is_capped() {
    let (mut store, id) = seeded("0");
    for i in 1..=30 {
        store.update_content(&id, i.to_string(), true).unwrap();
    }
    assert_eq!(store.history(&id).unwrap().undo_depth(), HISTORY_LIMIT);

    let mut restored = 0;
    for _ in 0..=HISTORY_LIMIT {
        if store.undo(&id).unwrap() {
            restored += 1;
        }
    }
    assert_eq!(restored, HISTORY_LIMIT);
    // 30 edits, 20 kept: the oldest reachable state is "10".
    assert_eq!(store.content(&id).unwrap(), "10");
}

#[test]
fn last_document_cannot_be_deleted() {
    let mut store = SessionStore::new();
    let id = store.active_id().clone();
    assert_eq!(store.delete_document(&id), Err(StoreError::LastDocument(id.clone())));
    assert_eq!(store.len(), 1);
    assert_eq!(store.active_id(), &id);
}

#[test]
fn deleting_active_document_selects_a_survivor() {
    let mut store = SessionStore::new();
    let older = store.active_id().clone();
    let newer = store.create_document();
    store.update_content(&newer, "text", true).unwrap();
    store.append_chat_message(&newer, Message::user("hello")).unwrap();

    let active = store.delete_document(&newer).unwrap();
    assert_eq!(active, older);
    assert_eq!(store.active_id(), &older);
    assert_eq!(store.history(&newer).err(), Some(StoreError::NotFound(newer.clone())));
    assert_eq!(store.chat_transcript(&newer).err(), Some(StoreError::NotFound(newer.clone())));
}

#[test]
fn deleting_inactive_document_keeps_selection() {
    let mut store = SessionStore::new();
    let older = store.active_id().clone();
    let newer = store.create_document();
    store.delete_document(&older).unwrap();
    assert_eq!(store.active_id(), &newer);
}

#[test]
fn append_stream_is_one_undo_entry() {
    let (mut store, id) = seeded("X");
    store.begin_stream_insertion(&id, InsertionMode::Append).unwrap();
    for chunk in ["A", "B", "C"] {
        store.apply_stream_chunk(&id, chunk).unwrap();
    }
    let summary = store.end_stream_insertion(&id).unwrap();
    assert_eq!(summary.chunks_applied, 3);
    assert_eq!(summary.chars_inserted, 3);
    assert_eq!(store.content(&id).unwrap(), "XABC");

    assert_eq!(store.history(&id).unwrap().undo_depth(), 1);
    store.undo(&id).unwrap();
    assert_eq!(store.content(&id).unwrap(), "X");
}

#[test]
fn replace_selection_stream() {
    let (mut store, id) = seeded("Hello World");
    store
        .begin_stream_insertion(&id, InsertionMode::ReplaceSelection(TextRange::new(6, 11)))
        .unwrap();
    store.apply_stream_chunk(&id, "Wo").unwrap();
    store.apply_stream_chunk(&id, "rld2").unwrap();
    store.end_stream_insertion(&id).unwrap();
    assert_eq!(store.content(&id).unwrap(), "Hello World2");

    store.undo(&id).unwrap();
    assert_eq!(store.content(&id).unwrap(), "Hello World");
}

#[test]
fn insert_at_cursor_stream_continues_after_inserted_text() {
    let (mut store, id) = seeded("Start. End.");
    store.begin_stream_insertion(&id, InsertionMode::InsertAtCursor(7)).unwrap();
    for chunk in ["Middle", " bit", ". "] {
        store.apply_stream_chunk(&id, chunk).unwrap();
    }
    store.end_stream_insertion(&id).unwrap();
    assert_eq!(store.content(&id).unwrap(), "Start. Middle bit. End.");
}

#[test]
fn undo_is_isolated_per_document() {
    let (mut store, first) = seeded("one");
    let second = store.create_document();
    store.update_content(&first, "one+", true).unwrap();
    store.update_content(&second, "two", true).unwrap();

    store.undo(&second).unwrap();
    assert_eq!(store.content(&second).unwrap(), "");
    assert_eq!(store.content(&first).unwrap(), "one+");
    assert_eq!(store.history(&first).unwrap().undo_depth(), 1);
}

#[test]
fn streaming_one_document_leaves_others_editable() {
    let (mut store, first) = seeded("one");
    let second = store.create_document();
    store.begin_stream_insertion(&first, InsertionMode::Append).unwrap();
    assert!(store.update_content(&second, "free", true).unwrap());
    assert!(store.undo(&second).unwrap());
    assert!(store.is_streaming(&first));
    assert!(!store.is_streaming(&second));
}

#[test]
fn second_stream_on_same_document_is_rejected() {
    let (mut store, id) = seeded("");
    store.begin_stream_insertion(&id, InsertionMode::Append).unwrap();
    assert_eq!(
        store.begin_stream_insertion(&id, InsertionMode::Append),
        Err(StoreError::StreamAlreadyActive(id.clone()))
    );
}

#[test]
fn deleting_a_streaming_document_drops_late_chunks() {
    let (mut store, streaming) = seeded("draft");
    let other = store.create_document();
    store.begin_stream_insertion(&streaming, InsertionMode::Append).unwrap();
    store.apply_stream_chunk(&streaming, " more").unwrap();

    store.delete_document(&streaming).unwrap();
    assert_eq!(
        store.apply_stream_chunk(&streaming, " late"),
        Err(StoreError::NotFound(streaming.clone()))
    );
    assert_eq!(store.content(&other).unwrap(), "");
    assert_eq!(store.active_id(), &other);
}

#[test]
fn rollback_leaves_no_trace_in_history() {
    let (mut store, id) = seeded("base");
    store.update_content(&id, "base2", true).unwrap();
    store.begin_stream_insertion(&id, InsertionMode::Append).unwrap();
    store.apply_stream_chunk(&id, "!!!").unwrap();
    store.abort_stream_insertion(&id, AbortPolicy::Rollback).unwrap();

    assert_eq!(store.content(&id).unwrap(), "base2");
    store.undo(&id).unwrap();
    assert_eq!(store.content(&id).unwrap(), "base");
}

#[test]
fn chat_transcripts_are_per_document() {
    let (mut store, first) = seeded("");
    let second = store.create_document();
    store.append_chat_message(&first, Message::user("for first")).unwrap();
    store
        .replace_chat_transcript(&second, vec![Message::assistant("a"), Message::assistant("b")])
        .unwrap();
    assert_eq!(store.chat_transcript(&first).unwrap().len(), 1);
    assert_eq!(store.chat_transcript(&second).unwrap().len(), 2);
}

#[test]
fn selecting_does_not_touch_history() {
    let (mut store, first) = seeded("a");
    store.update_content(&first, "b", true).unwrap();
    let second = store.create_document();
    store.select_document(&first).unwrap();
    store.select_document(&second).unwrap();
    assert_eq!(store.history(&first).unwrap().undo_depth(), 1);
    assert_eq!(store.history(&second).unwrap().undo_depth(), 0);
}

#[test]
fn observers_see_lifecycle_events() {
    let mut store = SessionStore::new();
    let rx = store.subscribe();
    let first = store.active_id().clone();
    let second = store.create_document();
    store.rename_document(&second, "Notes").unwrap();
    store.select_document(&first).unwrap();
    store.delete_document(&second).unwrap();
    store.update_content(&first, "quiet", false).unwrap();

    let events: Vec<StoreEvent> = rx.try_iter().collect();
    assert_eq!(
        events,
        vec![
            StoreEvent::DocumentCreated(second.clone()),
            StoreEvent::DocumentRenamed(second.clone()),
            StoreEvent::DocumentSelected(first.clone()),
            StoreEvent::DocumentDeleted { id: second.clone(), active: first.clone() },
            StoreEvent::ContentChanged { id: first.clone(), origin: ContentOrigin::Silent },
        ]
    );
}

#[test]
fn stream_finish_event_carries_summary() {
    let (mut store, id) = seeded("");
    let rx = store.subscribe();
    store.begin_stream_insertion(&id, InsertionMode::Append).unwrap();
    store.apply_stream_chunk(&id, "hi").unwrap();
    let summary = store.end_stream_insertion(&id).unwrap();
    let last = rx.try_iter().last();
    assert_eq!(last, Some(StoreEvent::StreamFinished { id: id.clone(), summary }));
}

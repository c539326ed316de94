#![cfg(not(feature = "hydrate"))]

use any_spawner::Executor;
use serde::Deserialize;
use serde_json::json;

use super::*;
use crate::options::FailurePolicy;
use crate::storage::MemoryStore;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Draft {
    title: String,
    body: String,
}

fn empty_draft() -> Draft {
    Draft { title: String::new(), body: String::new() }
}

fn mount() -> Owner {
    let _ = Executor::init_futures_executor();
    let owner = Owner::new();
    owner.set();
    owner
}

fn bind(store: &MemoryStore) -> (Owner, Signal<Draft>, StoredStateSetter<Draft>) {
    let owner = mount();
    let (draft, setter) = use_stored_state_with_options(
        Signal::stored("draft".to_owned()),
        empty_draft(),
        StoredStateOptions::new().store(store.clone()),
    );
    (owner, draft, setter)
}

fn draft(title: &str) -> Draft {
    Draft { title: title.to_owned(), body: String::new() }
}

// =============================================================
// Initialization effect
// =============================================================

#[test]
fn signal_starts_at_default() {
    let store = MemoryStore::new();
    let (_owner, draft, _) = bind(&store);
    assert_eq!(draft.get_untracked(), empty_draft());
}

#[test]
fn effect_adopts_persisted_entry_after_mount() {
    let store = MemoryStore::new();
    store.insert_raw("draft", r#"{"title":"Saved","body":"text"}"#);
    let (_owner, draft, _) = bind(&store);
    assert_eq!(draft.get_untracked(), empty_draft());

    Executor::poll_local();
    assert_eq!(draft.get_untracked(), Draft { title: "Saved".to_owned(), body: "text".to_owned() });
}

#[test]
fn key_change_resets_then_reads_new_entry() {
    let store = MemoryStore::new();
    store.insert_raw("a", r#"{"title":"A","body":""}"#);
    store.insert_raw("b", "{corrupt");
    store.insert_raw("c", r#"{"title":"C","body":""}"#);
    let _owner = mount();
    let key = RwSignal::new("a".to_owned());
    let (value, _) =
        use_stored_state_with_options(key, empty_draft(), StoredStateOptions::new().store(store.clone()));

    Executor::poll_local();
    assert_eq!(value.get_untracked(), draft("A"));

    key.set("b".to_owned());
    Executor::poll_local();
    assert_eq!(value.get_untracked(), empty_draft());
    assert_eq!(store.raw("b").as_deref(), Some("{corrupt"));

    key.set("c".to_owned());
    Executor::poll_local();
    assert_eq!(value.get_untracked(), draft("C"));
}

#[test]
fn same_key_rerun_keeps_current_state() {
    let store = MemoryStore::new();
    store.insert_raw("draft", r#"{"title":"A","body":""}"#);
    let _owner = mount();
    let key = RwSignal::new("draft".to_owned());
    let (value, setter) =
        use_stored_state_with_options(key, empty_draft(), StoredStateOptions::new().store(store.clone()));
    Executor::poll_local();

    // Storage now lags the signal, so a reset-and-reread would show "A".
    store.reject_writes(true);
    setter.set(draft("edited")).expect("fail-soft");
    key.set("draft".to_owned());
    Executor::poll_local();

    assert_eq!(value.get_untracked(), draft("edited"));
}

// =============================================================
// Setter
// =============================================================

#[test]
fn setter_updates_signal_and_storage() {
    let store = MemoryStore::new();
    let (_owner, draft, setter) = bind(&store);
    let next = Draft { title: "Plan".to_owned(), body: "Ship it".to_owned() };

    assert_eq!(setter.set(next.clone()).expect("set"), UpdateOutcome::Applied);
    assert_eq!(draft.get_untracked(), next);
    assert_eq!(store.raw("draft").as_deref(), Some(r#"{"title":"Plan","body":"Ship it"}"#));
}

#[test]
fn setter_merge_keeps_other_fields() {
    let store = MemoryStore::new();
    let (_owner, draft, setter) = bind(&store);
    setter.set(Draft { title: "Plan".to_owned(), body: "old".to_owned() }).expect("set");
    setter.merge(json!({"body": "new"})).expect("merge");
    assert_eq!(draft.get_untracked(), Draft { title: "Plan".to_owned(), body: "new".to_owned() });
}

#[test]
fn setter_rejects_invalid_candidate() {
    let store = MemoryStore::new();
    let _owner = mount();
    let options = StoredStateOptions::new()
        .store(store.clone())
        .validator(Validator::check(|d: &Draft| {
            if d.title.len() <= 8 { Ok(()) } else { Err("title too long".to_owned()) }
        }))
        .failure_policy(FailurePolicy::Propagate);
    let (draft, setter) = use_stored_state_with_options(Signal::stored("draft".to_owned()), empty_draft(), options);

    let err = setter
        .update(|prev| Draft { title: "far too long a title".to_owned(), body: prev.body.clone() })
        .expect_err("rejected");
    assert!(matches!(err, BindingError::Validation { .. }));
    assert_eq!(draft.get_untracked(), empty_draft());
    assert!(store.is_empty());
}

#[test]
fn setter_reset_clears_entry() {
    let store = MemoryStore::new();
    let (_owner, draft, setter) = bind(&store);
    setter.set(Draft { title: "a".to_owned(), body: "b".to_owned() }).expect("set");

    assert_eq!(setter.reset().expect("reset"), UpdateOutcome::Applied);
    assert_eq!(draft.get_untracked(), empty_draft());
    assert_eq!(store.raw("draft"), None);
}

#[test]
fn browser_store_outside_hydrate_makes_updates_noop() {
    let _owner = mount();
    let (draft, setter) = use_stored_state(Signal::stored("draft".to_owned()), empty_draft());
    let outcome = setter.set(Draft { title: "x".to_owned(), body: "y".to_owned() }).expect("noop");
    assert_eq!(outcome, UpdateOutcome::Unavailable);
    assert_eq!(draft.get_untracked(), empty_draft());
}

#[test]
fn cloned_setter_writes_to_same_signal() {
    let store = MemoryStore::new();
    let (_owner, draft, setter) = bind(&store);
    let other = setter.clone();
    other.set(Draft { title: "t".to_owned(), body: String::new() }).expect("set");
    assert_eq!(draft.get_untracked().title, "t");
}

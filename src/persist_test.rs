#![allow(clippy::float_cmp)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use super::*;
use crate::config::Pacing;
use crate::input::BoardCommand;

/// Collects snapshots in memory.
#[derive(Clone, Default)]
struct MemorySink(Rc<RefCell<Vec<Snapshot>>>);

impl SnapshotSink for MemorySink {
    fn write(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        self.0.borrow_mut().push(snapshot.clone());
        Ok(())
    }
}

struct FailingSink;

impl SnapshotSink for FailingSink {
    fn write(&mut self, _: &Snapshot) -> Result<(), SnapshotError> {
        Err(SnapshotError::NonFinite)
    }
}

fn filtered_state() -> BoardState {
    let mut state = BoardState { transform: Transform::new(-20.0, 35.0, 1.25), ..BoardState::default() };
    state.filters.kinds.remove(&CardKind::Hobby);
    state.filters.tags = HashSet::from(["web".to_owned(), "cli".to_owned()]);
    state.filters.only_connected = true;
    state.pinned_cards.insert("a".into());
    state
}

// --- Encoding ---

#[test]
fn capture_sorts_sets() {
    let snapshot = Snapshot::capture(&filtered_state());
    let filters = snapshot.filters.unwrap();
    assert_eq!(filters.kinds, [CardKind::Profile, CardKind::Goal, CardKind::Skill, CardKind::Project]);
    assert_eq!(filters.tags, ["cli", "web"]);
}

#[test]
fn encoded_snapshot_uses_plain_json() {
    let json: serde_json::Value = serde_json::from_str(&Snapshot::capture(&filtered_state()).encode().unwrap()).unwrap();
    assert_eq!(json["transform"]["scale"], 1.25);
    assert_eq!(json["filters"]["onlyConnected"], true);
    assert_eq!(json["filters"]["tags"][0], "cli");
    assert!(json.get("pinnedCards").is_none());
}

#[test]
fn restore_keeps_only_view_settings() {
    let state = filtered_state();
    let raw = Snapshot::capture(&state).encode().unwrap();
    let restored = restore_state(Some(&raw));
    assert_eq!(restored.transform, state.transform);
    assert_eq!(restored.filters, state.filters);
    assert!(restored.pinned_cards.is_empty());
}

// --- Tolerant restore ---

#[test]
fn missing_snapshot_gives_default() {
    assert_eq!(restore_state(None), BoardState::default());
}

#[test]
fn corrupt_snapshot_gives_default() {
    assert_eq!(restore_state(Some("{not json")), BoardState::default());
    assert_eq!(restore_state(Some(r#"{"transform": {"x": 1}}"#)), BoardState::default());
    assert_eq!(
        restore_state(Some(r#"{"transform": {"x": 0, "y": 0, "scale": 1}, "filters": {"kinds": ["planet"]}}"#)),
        BoardState::default()
    );
}

#[test]
fn transform_only_snapshot_keeps_default_filters() {
    let restored = restore_state(Some(r#"{"transform": {"x": 5, "y": 6, "scale": 40}}"#));
    assert_eq!(restored.transform, Transform::new(5.0, 6.0, 3.0));
    assert_eq!(restored.filters, Filters::default());
}

#[test]
fn decode_rejects_bad_input() {
    assert!(matches!(decode_snapshot("[]"), Err(SnapshotError::Json(_))));
}

// --- Sinks ---

#[test]
fn attached_sink_sees_view_changes_only() {
    let mut engine = Engine::new(Vec::new(), Vec::new(), Pacing::default());
    let sink = MemorySink::default();
    attach_sink(&mut engine, sink.clone());

    engine.dispatch(BoardCommand::SetTransform(Transform::new(10.0, 0.0, 1.0)));
    engine.dispatch(BoardCommand::ClearSelection);
    engine.dispatch(BoardCommand::SetOnlyConnected(true));
    engine.dispatch(BoardCommand::SetOnlyConnected(true));

    let written = sink.0.borrow();
    assert_eq!(written.len(), 2);
    assert_eq!(written[0].transform.x, 10.0);
    assert!(written[1].filters.as_ref().is_some_and(|f| f.only_connected));
}

#[test]
fn failing_sink_does_not_disturb_the_store() {
    let mut engine = Engine::new(Vec::new(), Vec::new(), Pacing::default());
    attach_sink(&mut engine, FailingSink);
    engine.dispatch(BoardCommand::SetTransform(Transform::new(1.0, 2.0, 1.0)));
    assert_eq!(engine.state().transform, Transform::new(1.0, 2.0, 1.0));
}

#[test]
fn file_sink_round_trip() {
    let path = std::env::temp_dir().join(format!("trailboard-snapshot-{}.json", std::process::id()));
    let mut sink = FileSnapshotSink::new(&path);
    assert!(sink.load().is_none());

    sink.write(&Snapshot::capture(&filtered_state())).unwrap();
    let restored = restore_state(sink.load().as_deref());
    assert_eq!(restored.filters, filtered_state().filters);
    std::fs::remove_file(&path).unwrap();
}

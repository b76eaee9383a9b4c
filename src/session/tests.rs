use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde_json::json;

use super::*;
use crate::selection::SplitPercentages;

fn cone_registry() -> LineCountRegistry {
    let mut types = BTreeMap::new();
    types.insert(
        "Cone".to_string(),
        BTreeMap::from([("A".to_string(), 100u64), ("B".to_string(), 50u64)]),
    );
    LineCountRegistry::new(types)
}

fn enable(name: &str) -> SessionEvent {
    SessionEvent::SetTypeEnabled {
        type_name: name.to_string(),
        enabled: true,
    }
}

#[test]
fn events_recompute_summary() {
    let mut session = SessionContext::new(SplitGroups::default(), PerLineDefaults::with_global(30));
    session.activate(cone_registry());
    assert_eq!(session.summary().total_negatives, 0);

    let summary = session.apply(enable("Cone")).unwrap();
    assert_eq!(summary.total_negatives, 60);

    session
        .apply(SessionEvent::SetGlobalDefault("10".into()))
        .unwrap();
    assert_eq!(session.summary().total_negatives, 20);

    session
        .apply(SessionEvent::SetTypeDefault {
            type_name: "Cone".into(),
            raw: "70".into(),
        })
        .unwrap();
    assert_eq!(session.summary().total_negatives, 120);
}

#[test]
fn select_flow_through_events() {
    let mut session = SessionContext::new(SplitGroups::default(), PerLineDefaults::with_global(30));
    session.activate(cone_registry());
    session.apply(enable("Cone")).unwrap();
    session
        .apply(SessionEvent::SetTypeMode {
            type_name: "Cone".into(),
            mode: SelectionMode::Select,
        })
        .unwrap();
    session
        .apply(SessionEvent::SetLineCount {
            type_name: "Cone".into(),
            line: "A".into(),
            count: 10,
        })
        .unwrap();
    let summary = session
        .apply(SessionEvent::SetLineEnabled {
            type_name: "Cone".into(),
            line: "B".into(),
            enabled: false,
        })
        .unwrap();
    let cone = summary.type_summary("Cone").unwrap();
    assert_eq!((cone.lines_count, cone.total), (1, 10));
}

#[test]
fn unknown_line_is_reported_and_state_kept() {
    let mut session = SessionContext::new(SplitGroups::default(), PerLineDefaults::default());
    session.activate(cone_registry());
    let before = session.selection().clone();
    let err = session
        .apply(SessionEvent::SetLineCount {
            type_name: "Cone".into(),
            line: "Z".into(),
            count: 3,
        })
        .unwrap_err();
    assert!(matches!(err, SelectionError::UnknownLine { .. }));
    assert_eq!(session.selection(), &before);
}

#[test]
fn split_edits_are_clamped_per_group() {
    let mut session = SessionContext::new(SplitGroups::default(), PerLineDefaults::default());
    session
        .apply(SessionEvent::EditSplit {
            group: SplitGroup::Negative,
            field: SplitField::Val,
            value: 50.0,
        })
        .unwrap();
    assert_eq!(session.splits().negative, SplitPercentages::new(70.0, 20.0, 10.0));
    assert_eq!(session.splits().positive, SplitPercentages::default());
}

#[test]
fn listeners_see_every_recompute() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut session = SessionContext::new(SplitGroups::default(), PerLineDefaults::with_global(30));
    let sink = Arc::clone(&seen);
    session.listeners_mut().subscribe("totals", move |summary: &Summary| {
        sink.lock().unwrap().push(summary.total_negatives);
    });
    let duplicate = Arc::clone(&seen);
    let added = session
        .listeners_mut()
        .subscribe("totals", move |summary: &Summary| {
            duplicate.lock().unwrap().push(summary.total_negatives);
        });
    assert!(!added);

    session.activate(cone_registry());
    session.apply(enable("Cone")).unwrap();
    session.recompute();
    assert_eq!(*seen.lock().unwrap(), vec![0, 60, 60]);
}

#[test]
fn snapshot_round_trips_selection() {
    let mut session = SessionContext::new(SplitGroups::default(), PerLineDefaults::with_global(30));
    session.activate(cone_registry());
    session.apply(enable("Cone")).unwrap();
    session
        .apply(SessionEvent::SetPositiveTotal(1000))
        .unwrap();

    let restored = SessionContext::from_snapshot(session.snapshot());
    assert_eq!(restored.summary(), session.summary());
}

#[test]
fn snapshot_parses_from_sparse_json() {
    let snapshot: SessionSnapshot = serde_json::from_value(json!({
        "registry": {"Cone": {"A": 100, "B": 50}},
        "selection": {"Cone": {"enabled": true}},
        "defaults": {"global": 30},
        "positive_total": 1000
    }))
    .unwrap();
    let session = SessionContext::from_snapshot(snapshot);
    let summary = session.summary();
    assert_eq!(summary.total_negatives, 60);
    assert_eq!(summary.total_all, 1060);
    assert_eq!(summary.positive_split.to_string(), "700 / 200 / 100");
}

#[test]
fn payload_uses_open_editor_buffer() {
    let store = ConfigStore::in_memory();
    let mut session = SessionContext::new(SplitGroups::default(), PerLineDefaults::with_global(30));
    session.activate(cone_registry());
    session.apply(enable("Cone")).unwrap();
    session
        .apply(SessionEvent::SetDataset("ds-7".into()))
        .unwrap();

    let stored = store.load();
    session
        .open_editor(&stored)
        .set_text(r#"{"name": "edited-run"}"#);
    let payload = session.build_payload(&store);
    assert_eq!(payload.dataset, "ds-7");
    assert_eq!(payload.exp_name, "edited-run");
    assert_eq!(
        serde_json::to_value(&payload.dataset_config.types_to_include).unwrap(),
        json!({"Cone": {"default_line": 30}})
    );

    session.close_editor();
    let payload = session.build_payload(&store);
    assert_eq!(payload.exp_name, "treinamento_classificacao");
}

#[test]
fn restored_rows_and_splits_are_brought_back_in_range() {
    let snapshot: SessionSnapshot = serde_json::from_value(json!({
        "registry": {"Cone": {"A": 10}},
        "selection": {"Cone": {
            "enabled": true,
            "mode": "select",
            "lines": [
                {"name": "A", "available": 500, "enabled": true, "requested": 400},
                {"name": "Gone", "available": 80, "enabled": true, "requested": 80}
            ]
        }},
        "splits": {"positive": {"train": 90.0, "val": 90.0, "test": 90.0}},
        "positive_total": 1000
    }))
    .unwrap();
    let session = SessionContext::from_snapshot(snapshot);

    let rows = &session.selection().get("Cone").unwrap().lines;
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].available, rows[0].requested), (10, 10));
    let summary = session.summary();
    assert_eq!(summary.type_summary("Cone").unwrap().total, 10);
    assert_eq!(session.splits().positive, SplitPercentages::default());
    assert_eq!(summary.positive_split.to_string(), "700 / 200 / 100");
    assert!(summary.combined_split.test >= 0);
}

#[test]
fn reactivation_follows_the_new_registry() {
    let mut session = SessionContext::new(SplitGroups::default(), PerLineDefaults::with_global(30));
    session.activate(cone_registry());
    session.apply(enable("Cone")).unwrap();
    session
        .apply(SessionEvent::SetTypeMode {
            type_name: "Cone".into(),
            mode: SelectionMode::Select,
        })
        .unwrap();
    assert_eq!(session.summary().total_negatives, 60);

    let mut types = BTreeMap::new();
    types.insert("Cone".to_string(), BTreeMap::from([("B".to_string(), 12u64)]));
    session.activate(LineCountRegistry::new(types));

    let cone = session.summary().type_summary("Cone").cloned().unwrap();
    assert_eq!((cone.lines_count, cone.total), (1, 12));
}

#[test]
fn select_on_unchecked_type_includes_it() {
    let store = ConfigStore::in_memory();
    let mut session = SessionContext::new(SplitGroups::default(), PerLineDefaults::with_global(30));
    session.activate(cone_registry());
    session
        .apply(SessionEvent::SetTypeMode {
            type_name: "Cone".into(),
            mode: SelectionMode::Select,
        })
        .unwrap();

    assert!(session.selection().is_enabled("Cone"));
    let payload = session.build_payload(&store);
    assert_eq!(
        serde_json::to_value(&payload.dataset_config.types_to_include).unwrap(),
        json!({"Cone": {"default_line": 30}})
    );
}

use super::*;
use rustc_hash::FxHashSet;

#[test]
fn request_more_rows_emits_paginated_load() {
    let mut store = TestStore::new();
    let view_id = store.open_with_rows(&["c5", "c4", "c3"], Some("c3"), true);

    let reduction = store.reduce(Msg::RequestMoreRows {
        view_id,
        target: None,
    });

    assert!(store.view(view_id).rows_loading);
    assert!(matches!(
        reduction.effects.as_slice(),
        [Effect::LoadGraphRows {
            limit,
            target: None,
            cursor: Some(cursor),
            ..
        }] if *limit > 0 && cursor.last_seen.as_ref() == "c3"
    ));
}

#[test]
fn request_more_rows_coalesces_while_loading() {
    let mut store = TestStore::new();
    let view_id = store.open_with_rows(&["c5", "c4", "c3"], Some("c3"), true);

    store.reduce(Msg::RequestMoreRows {
        view_id,
        target: None,
    });
    let second = store.reduce(Msg::RequestMoreRows {
        view_id,
        target: None,
    });

    assert!(second.effects.is_empty());
}

#[test]
fn request_more_rows_noops_when_exhausted() {
    let mut store = TestStore::new();
    let view_id = store.open_with_rows(&["c2", "c1"], None, false);

    let reduction = store.reduce(Msg::RequestMoreRows {
        view_id,
        target: None,
    });
    assert!(reduction.effects.is_empty());
}

#[test]
fn request_more_rows_noops_when_target_already_visible() {
    let mut store = TestStore::new();
    let view_id = store.open_with_rows(&["c5", "c4", "c3"], Some("c3"), true);

    let reduction = store.reduce(Msg::RequestMoreRows {
        view_id,
        target: Some(commit_id("c4")),
    });
    assert!(reduction.effects.is_empty());
}

#[test]
fn graph_rows_loaded_appends_and_notifies() {
    let mut store = TestStore::new();
    let view_id = store.open_with_rows(&["c5", "c4", "c3"], Some("c3"), true);

    store.reduce(Msg::RequestMoreRows {
        view_id,
        target: None,
    });
    let reduction = store.reduce(Msg::GraphRowsLoaded {
        view_id,
        target: None,
        result: Ok(page(&["c2", "c1"], None, false)),
    });

    let view = store.view(view_id);
    assert_eq!(view.graph.len(), 5);
    assert!(!view.graph.has_more);
    assert!(view.graph.cursor.is_none());
    assert!(!view.rows_loading);
    assert!(
        reduction
            .events
            .contains(&StoreEvent::RowsChanged { view_id })
    );
}

#[test]
fn id_set_matches_rows_after_every_append() {
    let mut store = TestStore::new();
    let view_id = store.open_with_rows(&["c5", "c4"], Some("c4"), true);

    // Overlapping page: c4 arrives again alongside new rows.
    store.reduce(Msg::RequestMoreRows {
        view_id,
        target: None,
    });
    store.reduce(Msg::GraphRowsLoaded {
        view_id,
        target: None,
        result: Ok(page(&["c4", "c3", "c2"], Some("c2"), true)),
    });

    let view = store.view(view_id);
    assert_eq!(view.graph.len(), 4);
    let ids: FxHashSet<CommitId> = view.graph.rows().iter().map(|r| r.id.clone()).collect();
    assert_eq!(&ids, view.graph.id_set());
}

#[test]
fn row_load_failure_is_not_exhaustion() {
    let mut store = TestStore::new();
    let view_id = store.open_with_rows(&["c5", "c4", "c3"], Some("c3"), true);

    store.reduce(Msg::RequestMoreRows {
        view_id,
        target: None,
    });
    store.reduce(Msg::GraphRowsLoaded {
        view_id,
        target: None,
        result: Err(Error::provider_unavailable("network down")),
    });

    let view = store.view(view_id);
    // The window still reports more history and the same resume point;
    // only the error surfaces.
    assert!(view.graph.has_more);
    assert_eq!(
        view.graph.cursor.as_ref().map(|c| c.last_seen.as_ref()),
        Some("c3")
    );
    assert!(view.last_error.as_deref().is_some_and(|e| e.contains("network down")));
    assert!(!view.rows_loading);

    // And the next request retries from the untouched cursor.
    let retry = store.reduce(Msg::RequestMoreRows {
        view_id,
        target: None,
    });
    assert!(matches!(
        retry.effects.as_slice(),
        [Effect::LoadGraphRows {
            cursor: Some(cursor),
            ..
        }] if cursor.last_seen.as_ref() == "c3"
    ));
}

#[test]
fn loading_never_reorders_materialized_rows() {
    let mut store = TestStore::new();
    let view_id = store.open_with_rows(&["c5", "c4", "c3"], Some("c3"), true);

    store.reduce(Msg::RequestMoreRows {
        view_id,
        target: None,
    });
    store.reduce(Msg::GraphRowsLoaded {
        view_id,
        target: None,
        result: Ok(page(&["c2", "c1"], None, false)),
    });

    let order: Vec<&str> = store
        .view(view_id)
        .graph
        .rows()
        .iter()
        .map(|r| r.id.as_ref())
        .collect();
    assert_eq!(order, vec!["c5", "c4", "c3", "c2", "c1"]);
}

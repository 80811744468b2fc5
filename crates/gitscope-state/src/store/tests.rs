use super::*;
use super::reducer::Reduction;
use crate::model::{Loadable, SearchPhase, ViewState};
use crate::msg::{Effect, SearchNotice};
use gitscope_core::cancel::CancelToken;
use gitscope_core::domain::*;
use gitscope_core::error::{Error, ErrorKind};
use gitscope_core::query::SearchQuery;
use gitscope_core::services::Result;
use std::path::PathBuf;
use std::time::SystemTime;

mod rows;

struct DummyProvider {
    spec: RepoSpec,
}

impl DummyProvider {
    fn new(path: &str) -> Self {
        Self {
            spec: RepoSpec {
                workdir: PathBuf::from(path),
            },
        }
    }
}

impl HistoryProvider for DummyProvider {
    fn spec(&self) -> &RepoSpec {
        &self.spec
    }

    fn head(&self) -> Result<HeadInfo> {
        unimplemented!()
    }

    fn graph_page(
        &self,
        _limit: usize,
        _cursor: Option<&GraphCursor>,
        _cancel: &CancelToken,
    ) -> Result<GraphPage> {
        unimplemented!()
    }

    fn search_page(
        &self,
        _query: &SearchQuery,
        _ordering: SearchOrdering,
        _limit: usize,
        _cursor: Option<&SearchCursor>,
        _cancel: &CancelToken,
    ) -> Result<SearchChunk> {
        unimplemented!()
    }

    fn commit_details(&self, _id: &CommitId) -> Result<CommitDetails> {
        unimplemented!()
    }
}

fn graph_row(id: &str) -> GraphRow {
    GraphRow {
        id: CommitId(id.to_string()),
        parent_ids: Vec::new(),
        summary: format!("summary {id}"),
        author: "alice".to_string(),
        author_time: SystemTime::UNIX_EPOCH,
        commit_time: SystemTime::UNIX_EPOCH,
        refs: Vec::new(),
        kind: RowKind::Commit,
    }
}

fn page(ids: &[&str], cursor: Option<&str>, has_more: bool) -> GraphPage {
    GraphPage {
        rows: ids.iter().map(|id| graph_row(id)).collect(),
        next_cursor: cursor.map(|id| GraphCursor {
            last_seen: CommitId(id.to_string()),
        }),
        has_more,
    }
}

fn chunk(ids: &[&str], cursor: Option<&str>, has_more: bool) -> SearchChunk {
    SearchChunk {
        matches: ids
            .iter()
            .map(|id| (CommitId(id.to_string()), SearchResultEntry::default()))
            .collect(),
        next_cursor: cursor.map(|id| SearchCursor {
            last_seen: CommitId(id.to_string()),
        }),
        has_more,
    }
}

fn commit_id(id: &str) -> CommitId {
    CommitId(id.to_string())
}

struct TestStore {
    providers: HashMap<ViewId, Arc<dyn HistoryProvider>>,
    id_alloc: AtomicU64,
    state: AppState,
}

impl TestStore {
    fn new() -> Self {
        Self {
            providers: HashMap::new(),
            id_alloc: AtomicU64::new(1),
            state: AppState::default(),
        }
    }

    fn reduce(&mut self, msg: Msg) -> Reduction {
        reduce(&mut self.providers, &self.id_alloc, &mut self.state, msg)
    }

    /// Opens a view and completes the initial row load, leaving the
    /// window at `ids` with the given paging state.
    fn open_with_rows(&mut self, ids: &[&str], cursor: Option<&str>, has_more: bool) -> ViewId {
        self.reduce(Msg::OpenView(PathBuf::from("/tmp/history")));
        let view_id = self.state.active_view.expect("view allocated");

        self.reduce(Msg::ViewOpenedOk {
            view_id,
            spec: RepoSpec {
                workdir: PathBuf::from("/tmp/history"),
            },
            provider: Arc::new(DummyProvider::new("/tmp/history")),
        });
        self.reduce(Msg::GraphRowsLoaded {
            view_id,
            target: None,
            result: Ok(page(ids, cursor, has_more)),
        });
        view_id
    }

    fn view(&self, view_id: ViewId) -> &ViewState {
        self.state.view(view_id).expect("view exists")
    }
}

#[test]
fn open_view_sets_opening_and_emits_effect() {
    let mut store = TestStore::new();
    let reduction = store.reduce(Msg::OpenView(PathBuf::from("/tmp/history")));

    assert_eq!(store.state.active_view, Some(ViewId(1)));
    let view = store.state.views.first().expect("view state to be set");
    assert!(view.open.is_loading());
    assert!(matches!(
        reduction.effects.as_slice(),
        [Effect::OpenView { .. }]
    ));
}

#[test]
fn reopening_the_same_root_reuses_the_view() {
    let mut store = TestStore::new();
    store.reduce(Msg::OpenView(PathBuf::from("/tmp/history")));
    let reduction = store.reduce(Msg::OpenView(PathBuf::from("/tmp/history")));

    assert_eq!(store.state.views.len(), 1);
    assert!(reduction.effects.is_empty());
}

#[test]
fn view_opened_ok_resets_window_and_loads() {
    let mut store = TestStore::new();
    store.reduce(Msg::OpenView(PathBuf::from("/tmp/history")));

    let reduction = store.reduce(Msg::ViewOpenedOk {
        view_id: ViewId(1),
        spec: RepoSpec {
            workdir: PathBuf::from("/tmp/history"),
        },
        provider: Arc::new(DummyProvider::new("/tmp/history")),
    });

    let view = store.view(ViewId(1));
    assert!(matches!(view.open, Loadable::Ready(())));
    assert!(view.head.is_loading());
    assert!(view.graph.is_empty());
    assert!(view.graph.has_more);
    assert!(view.rows_loading);
    assert!(matches!(
        reduction.effects.as_slice(),
        [
            Effect::LoadBranchState { .. },
            Effect::LoadGraphRows {
                cursor: None,
                target: None,
                ..
            }
        ]
    ));
}

#[test]
fn view_opened_err_records_diagnostic() {
    let mut store = TestStore::new();
    store.reduce(Msg::OpenView(PathBuf::from("/tmp/history")));

    store.reduce(Msg::ViewOpenedErr {
        view_id: ViewId(1),
        spec: RepoSpec {
            workdir: PathBuf::from("/tmp/history"),
        },
        error: Error::new(ErrorKind::NotARepository),
    });

    let view = store.view(ViewId(1));
    assert!(matches!(view.open, Loadable::Error(_)));
    assert!(view.last_error.is_some());
    assert!(!view.diagnostics.is_empty());
}

#[test]
fn close_view_removes_state_and_cancels_domains() {
    let mut store = TestStore::new();
    let view_id = store.open_with_rows(&["c2", "c1"], None, false);

    let reduction = store.reduce(Msg::CloseView { view_id });

    assert!(store.state.views.is_empty());
    assert!(store.state.active_view.is_none());
    assert!(!store.providers.contains_key(&view_id));
    assert!(matches!(
        reduction.effects.as_slice(),
        [Effect::CancelView { .. }]
    ));
}

#[test]
fn hover_commit_loads_details_once() {
    let mut store = TestStore::new();
    let view_id = store.open_with_rows(&["c2", "c1"], None, false);

    let first = store.reduce(Msg::HoverCommit {
        view_id,
        id: commit_id("c2"),
    });
    assert!(matches!(
        first.effects.as_slice(),
        [Effect::LoadCommitDetails { .. }]
    ));

    store.reduce(Msg::CommitDetailsLoaded {
        view_id,
        id: commit_id("c2"),
        result: Ok(CommitDetails {
            id: commit_id("c2"),
            message: "summary c2".to_string(),
            author: "alice".to_string(),
            committed_at: "2026-01-01".to_string(),
            parent_ids: vec![commit_id("c1")],
            files: Vec::new(),
        }),
        enrichment: None,
    });

    let again = store.reduce(Msg::HoverCommit {
        view_id,
        id: commit_id("c2"),
    });
    assert!(again.effects.is_empty());

    let view = store.view(view_id);
    assert!(view.hover_cache.contains_key(&commit_id("c2")));
    assert!(view.badge_cache.contains_key(&commit_id("c2")));
}

#[test]
fn deferred_enrichment_patches_the_hover_cache() {
    let mut store = TestStore::new();
    let view_id = store.open_with_rows(&["c1"], None, false);

    store.reduce(Msg::CommitDetailsLoaded {
        view_id,
        id: commit_id("c1"),
        result: Ok(CommitDetails {
            id: commit_id("c1"),
            message: "m".to_string(),
            author: "alice".to_string(),
            committed_at: "2026-01-01".to_string(),
            parent_ids: Vec::new(),
            files: Vec::new(),
        }),
        enrichment: None,
    });
    store.reduce(Msg::CommitEnrichmentLoaded {
        view_id,
        id: commit_id("c1"),
        result: Ok(CommitEnrichment {
            associated_changes: vec![AssociatedChange {
                reference: "#42".to_string(),
                title: "fix parser".to_string(),
                url: None,
            }],
        }),
    });

    let hover = store
        .view(view_id)
        .hover_cache
        .get(&commit_id("c1"))
        .expect("hover cached");
    assert!(hover.enrichment.is_some());
}

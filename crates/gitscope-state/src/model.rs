use crate::caches::{AuthorBadge, BoundedCache};
use crate::search_history::SearchHistoryStore;
use gitscope_core::domain::*;
use gitscope_core::query::SearchQuery;
use rustc_hash::{FxHashMap, FxHashSet};
use std::time::SystemTime;

pub const INITIAL_ROW_LIMIT: usize = 200;
pub const ROW_PAGE_LIMIT: usize = 200;
pub const SEARCH_LIMIT: usize = 200;
pub const HOVER_CACHE_CAPACITY: usize = 512;

#[derive(Clone, Debug, Default)]
pub struct AppState {
    pub views: Vec<ViewState>,
    pub active_view: Option<ViewId>,
    pub search_history: SearchHistoryStore,
}

impl AppState {
    pub fn view(&self, id: ViewId) -> Option<&ViewState> {
        self.views.iter().find(|v| v.id == id)
    }

    pub fn view_mut(&mut self, id: ViewId) -> Option<&mut ViewState> {
        self.views.iter_mut().find(|v| v.id == id)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ViewId(pub u64);

#[derive(Clone, Debug)]
pub struct ViewState {
    pub id: ViewId,
    pub spec: RepoSpec,

    pub open: Loadable<()>,
    pub head: Loadable<HeadInfo>,

    pub graph: GraphWindow,
    /// A row load is in flight; further load-more requests coalesce.
    pub rows_loading: bool,

    pub search: Option<SearchSession>,
    /// Monotonic across sessions; stale batches identify themselves by a
    /// generation that no longer matches.
    pub search_generation: u64,

    pub selection: SelectionState,

    pub hover_cache: BoundedCache<CommitId, CommitHover>,
    pub badge_cache: BoundedCache<CommitId, AuthorBadge>,

    pub last_error: Option<String>,
    pub diagnostics: Vec<DiagnosticEntry>,
}

impl ViewState {
    pub fn new_opening(id: ViewId, spec: RepoSpec) -> Self {
        Self {
            id,
            spec,
            open: Loadable::Loading,
            head: Loadable::NotLoaded,
            graph: GraphWindow::default(),
            rows_loading: false,
            search: None,
            search_generation: 0,
            selection: SelectionState::default(),
            hover_cache: BoundedCache::new(HOVER_CACHE_CAPACITY),
            badge_cache: BoundedCache::new(HOVER_CACHE_CAPACITY),
            last_error: None,
            diagnostics: Vec::new(),
        }
    }

    /// Row indices visible under the active filter-mode search, or `None`
    /// when no filter applies. The working-changes pseudo-row is always
    /// kept visible.
    pub fn filtered_row_indices(&self) -> Option<Vec<usize>> {
        let session = self.search.as_ref()?;
        if !session.query.filter_mode {
            return None;
        }

        Some(
            self.graph
                .rows()
                .iter()
                .enumerate()
                .filter(|(_, row)| {
                    row.kind == RowKind::WorkingChanges
                        || session.results.contains(&row.id.canonical())
                })
                .map(|(ix, _)| ix)
                .collect(),
        )
    }
}

/// The materialized prefix of history. Rows are append-only except for
/// [`GraphWindow::reset`]; the id set tracks the rows exactly.
#[derive(Clone, Debug, Default)]
pub struct GraphWindow {
    rows: Vec<GraphRow>,
    id_set: FxHashSet<CommitId>,
    pub cursor: Option<GraphCursor>,
    pub has_more: bool,
}

impl GraphWindow {
    pub fn rows(&self) -> &[GraphRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, id: &CommitId) -> bool {
        self.id_set.contains(id)
    }

    pub fn id_set(&self) -> &FxHashSet<CommitId> {
        &self.id_set
    }

    /// The materialized frontier: the id of the last (oldest) row.
    pub fn last_id(&self) -> Option<&CommitId> {
        self.rows.last().map(|row| &row.id)
    }

    /// Appends new rows, skipping ids already materialized (a commit
    /// reachable via several parent paths arrives at most once). Returns
    /// the number of rows actually added.
    pub fn append(&mut self, rows: Vec<GraphRow>) -> usize {
        let mut added = 0;
        for row in rows {
            if !self.id_set.insert(row.id.clone()) {
                continue;
            }
            self.rows.push(row);
            added += 1;
        }
        added
    }

    pub fn reset(&mut self) {
        self.rows.clear();
        self.id_set.clear();
        self.cursor = None;
        self.has_more = false;
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SearchPhase {
    /// A chunk is in flight or about to be scheduled.
    Searching,
    /// The invocation hit its cutoff (match budget or the window
    /// frontier) with more history remaining; window growth or an
    /// explicit resume continues it.
    Capped,
    /// Stopped by the user with results preserved; only an explicit
    /// resume continues it.
    Paused,
    Completed,
    Failed,
}

#[derive(Clone, Debug)]
pub struct SearchSession {
    pub query: SearchQuery,
    pub comparison_key: String,
    pub generation: u64,
    pub results: SearchResults,
    pub has_more: bool,
    pub resume_cursor: Option<SearchCursor>,
    pub phase: SearchPhase,
    /// Match budget of the current run; grows with each resume.
    pub requested: usize,
    /// The first visible match is selected once per session, so a later
    /// continuation never yanks a selection the user moved elsewhere.
    pub auto_selected: bool,
}

impl SearchSession {
    pub fn new(query: SearchQuery, generation: u64) -> Self {
        let comparison_key = query.comparison_key();
        Self {
            query,
            comparison_key,
            generation,
            results: SearchResults::default(),
            has_more: true,
            resume_cursor: None,
            phase: SearchPhase::Searching,
            requested: SEARCH_LIMIT,
            auto_selected: false,
        }
    }
}

/// Accumulated matches of one search session: an ordered id sequence
/// (history order, nearest to head first) plus the per-commit detail.
/// Merging is a pure idempotent union; re-applying an id is a no-op.
#[derive(Clone, Debug, Default)]
pub struct SearchResults {
    order: Vec<CommitId>,
    entries: FxHashMap<CommitId, SearchResultEntry>,
}

impl SearchResults {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &CommitId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn entry(&self, id: &CommitId) -> Option<&SearchResultEntry> {
        self.entries.get(id)
    }

    pub fn ids(&self) -> &[CommitId] {
        &self.order
    }

    pub fn first(&self) -> Option<&CommitId> {
        self.order.first()
    }

    /// Merges one provider chunk. Chunks arrive in history order and the
    /// union preserves it; ids already present are skipped. Returns the
    /// number of new matches.
    pub fn merge_chunk(&mut self, chunk: &SearchChunk) -> usize {
        let mut added = 0;
        for (id, entry) in &chunk.matches {
            if self.entries.contains_key(id) {
                continue;
            }
            self.entries.insert(id.clone(), entry.clone());
            self.order.push(id.clone());
            added += 1;
        }
        added
    }

    /// The nearest-to-head match that is not yet materialized in the
    /// window, if any.
    pub fn first_not_in(&self, window: &GraphWindow) -> Option<&CommitId> {
        self.order.iter().find(|id| !window.contains(id))
    }
}

#[derive(Clone, Debug, Default)]
pub struct SelectionState {
    /// Stable internal identity used for comparisons.
    pub canonical: Option<CommitId>,
    /// The display-facing id as selected (possibly a sentinel spelling).
    pub raw: Option<CommitId>,
    pub multi: Vec<MultiSelection>,
    /// Head commit the selection was computed against; when it moves the
    /// selection is reset.
    pub head_anchor: Option<CommitId>,
    /// A reveal is in flight for this id; resolves definitively to found
    /// or not-found.
    pub reveal_pending: Option<CommitId>,
}

impl SelectionState {
    pub fn set(&mut self, id: CommitId, multi: Option<Vec<MultiSelection>>) {
        self.canonical = Some(id.canonical());
        self.raw = Some(id);
        if let Some(multi) = multi {
            self.multi = multi;
        }
    }

    pub fn clear(&mut self) {
        self.canonical = None;
        self.raw = None;
        self.multi.clear();
        self.reveal_pending = None;
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MultiSelection {
    pub id: CommitId,
    pub active: bool,
    pub hidden: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommitHover {
    pub details: CommitDetails,
    pub enrichment: Option<CommitEnrichment>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DiagnosticEntry {
    pub time: SystemTime,
    pub kind: DiagnosticKind,
    pub message: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DiagnosticKind {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Loadable<T> {
    NotLoaded,
    Loading,
    Ready(T),
    Error(String),
}

impl<T> Loadable<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }
}

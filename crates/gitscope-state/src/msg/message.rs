use crate::model::{MultiSelection, ViewId};
use gitscope_core::domain::*;
use gitscope_core::error::Error;
use gitscope_core::query::SearchQuery;
use gitscope_core::services::HistoryProvider;
use std::path::PathBuf;
use std::sync::Arc;

pub enum Msg {
    OpenView(PathBuf),
    CloseView {
        view_id: ViewId,
    },
    SetActiveView {
        view_id: ViewId,
    },

    RequestSearch {
        view_id: ViewId,
        query: SearchQuery,
        /// Continue the live session instead of starting over. Only
        /// meaningful while the comparison key is unchanged.
        resume: bool,
    },
    CancelSearch {
        view_id: ViewId,
        preserve_results: bool,
    },
    RequestMoreRows {
        view_id: ViewId,
        target: Option<CommitId>,
    },
    SetSelection {
        view_id: ViewId,
        id: CommitId,
        multi: Option<Vec<MultiSelection>>,
    },
    ClearSelection {
        view_id: ViewId,
    },
    /// Ensure a commit is materialized in the window, growing it if
    /// needed, then select it. Terminates definitively: found or
    /// not-found, never ambiguous.
    RevealCommit {
        view_id: ViewId,
        id: CommitId,
    },
    HoverCommit {
        view_id: ViewId,
        id: CommitId,
    },

    ViewOpenedOk {
        view_id: ViewId,
        spec: RepoSpec,
        provider: Arc<dyn HistoryProvider>,
    },
    ViewOpenedErr {
        view_id: ViewId,
        spec: RepoSpec,
        error: Error,
    },
    BranchStateLoaded {
        view_id: ViewId,
        result: Result<HeadInfo, Error>,
    },
    GraphRowsLoaded {
        view_id: ViewId,
        target: Option<CommitId>,
        result: Result<GraphPage, Error>,
    },
    /// One progressive chunk of an in-flight search. The generation pins
    /// the chunk to the session that requested it; stale generations are
    /// dropped before any merge.
    SearchBatchLoaded {
        view_id: ViewId,
        generation: u64,
        result: Result<SearchChunk, Error>,
    },
    CommitDetailsLoaded {
        view_id: ViewId,
        id: CommitId,
        result: Result<CommitDetails, Error>,
        /// Enrichment that resolved within the inline deadline, if any.
        enrichment: Option<CommitEnrichment>,
    },
    CommitEnrichmentLoaded {
        view_id: ViewId,
        id: CommitId,
        result: Result<CommitEnrichment, Error>,
    },
}

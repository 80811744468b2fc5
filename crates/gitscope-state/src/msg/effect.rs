use crate::model::ViewId;
use gitscope_core::domain::{CommitId, GraphCursor, SearchCursor};
use gitscope_core::query::SearchQuery;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub enum Effect {
    OpenView {
        view_id: ViewId,
        path: PathBuf,
    },
    LoadBranchState {
        view_id: ViewId,
    },
    /// Drive the row loader: page the provider forward from `cursor`
    /// until `limit` rows were added (`0` = no cap), `target` was
    /// appended, or the history is exhausted.
    LoadGraphRows {
        view_id: ViewId,
        limit: usize,
        target: Option<CommitId>,
        cursor: Option<GraphCursor>,
    },
    /// Fetch the next chunk of one search invocation. The coordinator
    /// paces the stream chunk by chunk, so cancellation and continuation
    /// timing stay deterministic; a populated `cursor` continues past
    /// work already reported.
    RunSearch {
        view_id: ViewId,
        generation: u64,
        query: SearchQuery,
        limit: usize,
        cursor: Option<SearchCursor>,
    },
    /// Cancel the search domain's in-flight work without replacing it.
    CancelSearch {
        view_id: ViewId,
    },
    /// Cancel every domain of a closed view.
    CancelView {
        view_id: ViewId,
    },
    LoadCommitDetails {
        view_id: ViewId,
        id: CommitId,
    },
}

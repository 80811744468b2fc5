use crate::cancel::CancelToken;
use crate::domain::*;
use crate::error::{Error, ErrorKind};
use crate::query::SearchQuery;
use std::path::Path;
use std::sync::Arc;

pub type Result<T> = std::result::Result<T, Error>;

/// A paged, cancellable view of one commit history.
///
/// All calls are synchronous and run on the store's worker pool; they must
/// observe `cancel` between units of work and may return early with a
/// partial page (`has_more` still true) when it fires. A clean exhaustion
/// is the only thing allowed to report `has_more == false`; transient
/// failures must surface as errors instead.
pub trait HistoryProvider: Send + Sync {
    fn spec(&self) -> &RepoSpec;

    fn head(&self) -> Result<HeadInfo>;

    /// The next page of history rows after `cursor` (from the head when
    /// `cursor` is `None`). `limit == 0` means no cap.
    fn graph_page(
        &self,
        limit: usize,
        cursor: Option<&GraphCursor>,
        cancel: &CancelToken,
    ) -> Result<GraphPage>;

    /// The next chunk of matches for `query` after `cursor`, in history
    /// order under `ordering` (nearest to head first). Chunks from
    /// successive calls with the returned cursor never repeat or reorder
    /// matches.
    fn search_page(
        &self,
        query: &SearchQuery,
        ordering: SearchOrdering,
        limit: usize,
        cursor: Option<&SearchCursor>,
        cancel: &CancelToken,
    ) -> Result<SearchChunk>;

    fn commit_details(&self, id: &CommitId) -> Result<CommitDetails>;

    fn commit_enrichment(&self, _id: &CommitId) -> Result<CommitEnrichment> {
        Err(Error::new(ErrorKind::Unsupported(
            "commit enrichment is not implemented for this backend",
        )))
    }
}

pub trait HistoryBackend: Send + Sync {
    fn open(&self, workdir: &Path) -> Result<Arc<dyn HistoryProvider>>;
}

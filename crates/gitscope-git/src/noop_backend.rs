use gitscope_core::cancel::CancelToken;
use gitscope_core::domain::*;
use gitscope_core::error::{Error, ErrorKind};
use gitscope_core::query::SearchQuery;
use gitscope_core::services::{HistoryBackend, HistoryProvider, Result};
use std::path::Path;
use std::sync::Arc;

#[derive(Default)]
pub struct NoopBackend;

impl HistoryBackend for NoopBackend {
    fn open(&self, workdir: &Path) -> Result<Arc<dyn HistoryProvider>> {
        let _ = workdir;
        Err(Error::new(ErrorKind::Unsupported(
            "No history backend enabled for this build.",
        )))
    }
}

#[allow(dead_code)]
pub(crate) struct NoopProvider {
    spec: RepoSpec,
}

impl NoopProvider {
    #[allow(dead_code)]
    pub fn new(spec: RepoSpec) -> Self {
        Self { spec }
    }
}

impl HistoryProvider for NoopProvider {
    fn spec(&self) -> &RepoSpec {
        &self.spec
    }

    fn head(&self) -> Result<HeadInfo> {
        Err(Error::new(ErrorKind::Unsupported("No history backend enabled")))
    }

    fn graph_page(
        &self,
        _limit: usize,
        _cursor: Option<&GraphCursor>,
        _cancel: &CancelToken,
    ) -> Result<GraphPage> {
        Err(Error::new(ErrorKind::Unsupported("No history backend enabled")))
    }

    fn search_page(
        &self,
        _query: &SearchQuery,
        _ordering: SearchOrdering,
        _limit: usize,
        _cursor: Option<&SearchCursor>,
        _cancel: &CancelToken,
    ) -> Result<SearchChunk> {
        Err(Error::new(ErrorKind::Unsupported("No history backend enabled")))
    }

    fn commit_details(&self, _id: &CommitId) -> Result<CommitDetails> {
        Err(Error::new(ErrorKind::Unsupported("No history backend enabled")))
    }
}

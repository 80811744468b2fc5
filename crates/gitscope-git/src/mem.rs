use gitscope_core::cancel::CancelToken;
use gitscope_core::domain::*;
use gitscope_core::error::Error;
use gitscope_core::query::{QueryMatcher, SearchQuery};
use gitscope_core::services::{HistoryBackend, HistoryProvider, Result};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

/// Skips rows up to and including a cursor's `last_seen`, so a resumed
/// enumeration never repeats work already reported.
struct CursorGate<'a> {
    last_seen: Option<&'a CommitId>,
    started: bool,
}

impl<'a> CursorGate<'a> {
    fn new(last_seen: Option<&'a CommitId>) -> Self {
        Self {
            last_seen,
            started: last_seen.is_none(),
        }
    }

    fn should_skip(&mut self, id: &CommitId) -> bool {
        if self.started {
            return false;
        }

        let Some(last_seen) = self.last_seen else {
            self.started = true;
            return false;
        };

        if last_seen == id {
            self.started = true;
        }

        true
    }
}

struct MemoryCommit {
    row: GraphRow,
    files: Vec<PathBuf>,
    change_text: Option<String>,
    enrichment: Option<CommitEnrichment>,
}

/// A deterministic in-memory history, for integration tests and demos.
/// Commits are held newest-first (head first). Transient failures can be
/// scripted per call site to exercise the error paths.
pub struct MemoryHistory {
    commits: Vec<MemoryCommit>,
    by_id: FxHashMap<CommitId, usize>,
    head_branch: String,
    /// Max rows examined per `search_page` call; `None` scans freely.
    /// Small values make the incremental scan observable in tests.
    search_scan_limit: Option<usize>,
    fail_graph_pages: AtomicUsize,
    fail_search_pages: AtomicUsize,
}

impl MemoryHistory {
    pub fn builder() -> MemoryHistoryBuilder {
        MemoryHistoryBuilder {
            commits: Vec::new(),
            head_branch: "main".to_string(),
            search_scan_limit: None,
        }
    }

    /// Fail the next `n` row-page fetches with `ProviderUnavailable`.
    pub fn fail_next_graph_pages(&self, n: usize) {
        self.fail_graph_pages.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` search-page fetches with `ProviderUnavailable`.
    pub fn fail_next_search_pages(&self, n: usize) {
        self.fail_search_pages.store(n, Ordering::SeqCst);
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn commit(&self, id: &CommitId) -> Option<&MemoryCommit> {
        self.by_id.get(id).map(|&ix| &self.commits[ix])
    }

    /// Row positions in history order under `ordering`, nearest to head
    /// first. Ties keep the authored (head-first) order.
    fn ordered_positions(&self, ordering: SearchOrdering) -> Vec<usize> {
        let mut positions: Vec<usize> = (0..self.commits.len()).collect();
        positions.sort_by(|a, b| {
            let key = |ix: usize| match ordering {
                SearchOrdering::AuthorDate => self.commits[ix].row.author_time,
                SearchOrdering::CommitDate => self.commits[ix].row.commit_time,
            };
            key(*b).cmp(&key(*a)).then(a.cmp(b))
        });
        positions
    }
}

pub struct MemoryHistoryBuilder {
    commits: Vec<MemoryCommit>,
    head_branch: String,
    search_scan_limit: Option<usize>,
}

impl MemoryHistoryBuilder {
    /// Appends a commit; call newest first (the first commit is the head).
    pub fn commit(
        self,
        id: &str,
        parents: &[&str],
        author: &str,
        summary: &str,
        at_secs: u64,
    ) -> Self {
        self.commit_with_files(id, parents, author, summary, at_secs, &[])
    }

    pub fn commit_with_files(
        mut self,
        id: &str,
        parents: &[&str],
        author: &str,
        summary: &str,
        at_secs: u64,
        files: &[&str],
    ) -> Self {
        let time = SystemTime::UNIX_EPOCH + Duration::from_secs(at_secs);
        let kind = if parents.len() > 1 {
            RowKind::Merge
        } else {
            RowKind::Commit
        };
        self.commits.push(MemoryCommit {
            row: GraphRow {
                id: CommitId(id.to_string()),
                parent_ids: parents.iter().map(|p| CommitId(p.to_string())).collect(),
                summary: summary.to_string(),
                author: author.to_string(),
                author_time: time,
                commit_time: time,
                refs: Vec::new(),
                kind,
            },
            files: files.iter().map(PathBuf::from).collect(),
            change_text: None,
            enrichment: None,
        });
        self
    }

    pub fn change_text(mut self, id: &str, text: &str) -> Self {
        if let Some(commit) = self.commits.iter_mut().find(|c| c.row.id.as_ref() == id) {
            commit.change_text = Some(text.to_string());
        }
        self
    }

    /// Overrides a commit's author time (commits otherwise author and
    /// commit at the same instant).
    pub fn author_time(mut self, id: &str, at_secs: u64) -> Self {
        if let Some(commit) = self.commits.iter_mut().find(|c| c.row.id.as_ref() == id) {
            commit.row.author_time = SystemTime::UNIX_EPOCH + Duration::from_secs(at_secs);
        }
        self
    }

    pub fn enrichment(mut self, id: &str, enrichment: CommitEnrichment) -> Self {
        if let Some(commit) = self.commits.iter_mut().find(|c| c.row.id.as_ref() == id) {
            commit.enrichment = Some(enrichment);
        }
        self
    }

    pub fn head_branch(mut self, name: &str) -> Self {
        self.head_branch = name.to_string();
        self
    }

    pub fn search_scan_limit(mut self, limit: usize) -> Self {
        self.search_scan_limit = Some(limit);
        self
    }

    pub fn build(mut self) -> Arc<MemoryHistory> {
        if let Some(head) = self.commits.first_mut() {
            head.row.refs.push(RefAssociation {
                name: self.head_branch.clone(),
                kind: RefKind::Head,
            });
        }
        let by_id = self
            .commits
            .iter()
            .enumerate()
            .map(|(ix, c)| (c.row.id.clone(), ix))
            .collect();
        Arc::new(MemoryHistory {
            commits: self.commits,
            by_id,
            head_branch: self.head_branch,
            search_scan_limit: self.search_scan_limit,
            fail_graph_pages: AtomicUsize::new(0),
            fail_search_pages: AtomicUsize::new(0),
        })
    }
}

pub struct MemoryBackend {
    history: Arc<MemoryHistory>,
}

impl MemoryBackend {
    pub fn new(history: Arc<MemoryHistory>) -> Self {
        Self { history }
    }
}

impl HistoryBackend for MemoryBackend {
    fn open(&self, workdir: &Path) -> Result<Arc<dyn HistoryProvider>> {
        Ok(Arc::new(MemoryProvider {
            spec: RepoSpec {
                workdir: workdir.to_path_buf(),
            },
            history: Arc::clone(&self.history),
        }))
    }
}

struct MemoryProvider {
    spec: RepoSpec,
    history: Arc<MemoryHistory>,
}

impl HistoryProvider for MemoryProvider {
    fn spec(&self) -> &RepoSpec {
        &self.spec
    }

    fn head(&self) -> Result<HeadInfo> {
        let head = self
            .history
            .commits
            .first()
            .ok_or_else(|| Error::provider_unavailable("history is empty"))?;
        Ok(HeadInfo {
            branch: Some(self.history.head_branch.clone()),
            target: head.row.id.clone(),
        })
    }

    fn graph_page(
        &self,
        limit: usize,
        cursor: Option<&GraphCursor>,
        cancel: &CancelToken,
    ) -> Result<GraphPage> {
        if MemoryHistory::take_failure(&self.history.fail_graph_pages) {
            return Err(Error::provider_unavailable("scripted graph-page failure"));
        }

        let mut gate = CursorGate::new(cursor.map(|c| &c.last_seen));
        let mut rows = Vec::new();
        let mut remaining = false;

        for commit in &self.history.commits {
            if gate.should_skip(&commit.row.id) {
                continue;
            }
            if cancel.is_cancelled() || (limit > 0 && rows.len() >= limit) {
                remaining = true;
                break;
            }
            rows.push(commit.row.clone());
        }

        let next_cursor = if remaining {
            rows.last()
                .map(|row: &GraphRow| GraphCursor {
                    last_seen: row.id.clone(),
                })
                .or_else(|| cursor.cloned())
        } else {
            None
        };

        Ok(GraphPage {
            rows,
            next_cursor,
            has_more: remaining,
        })
    }

    fn search_page(
        &self,
        query: &SearchQuery,
        ordering: SearchOrdering,
        limit: usize,
        cursor: Option<&SearchCursor>,
        cancel: &CancelToken,
    ) -> Result<SearchChunk> {
        if MemoryHistory::take_failure(&self.history.fail_search_pages) {
            return Err(Error::provider_unavailable("scripted search-page failure"));
        }

        let matcher = QueryMatcher::compile(query)?;
        let positions = self.history.ordered_positions(ordering);

        let mut gate = CursorGate::new(cursor.map(|c| &c.last_seen));
        let mut matches: Vec<(CommitId, SearchResultEntry)> = Vec::new();
        let mut scanned = 0usize;
        let mut last_scanned: Option<CommitId> = None;
        let mut remaining = false;

        for (seq, &ix) in positions.iter().enumerate() {
            let commit = &self.history.commits[ix];
            if gate.should_skip(&commit.row.id) {
                continue;
            }

            let scan_exhausted = self
                .history
                .search_scan_limit
                .is_some_and(|budget| scanned >= budget);
            if cancel.is_cancelled() || scan_exhausted || (limit > 0 && matches.len() >= limit) {
                remaining = true;
                break;
            }

            scanned += 1;
            last_scanned = Some(commit.row.id.clone());
            if let Some(entry) = matcher.matches_row(
                &commit.row,
                &commit.files,
                commit.change_text.as_deref(),
            ) {
                matches.push((commit.row.id.clone(), entry));
            }

            if seq + 1 == positions.len() {
                // Scanned through the oldest commit: nothing remains.
                last_scanned = None;
            }
        }

        let next_cursor = if remaining {
            // Resume after the last row actually examined, not after the
            // last match, so unexamined rows are never skipped.
            last_scanned
                .or_else(|| cursor.map(|c| c.last_seen.clone()))
                .map(|last_seen| SearchCursor { last_seen })
        } else {
            last_scanned.map(|last_seen| SearchCursor { last_seen })
        };

        let has_more = next_cursor.is_some();
        Ok(SearchChunk {
            matches,
            next_cursor,
            has_more,
        })
    }

    fn commit_details(&self, id: &CommitId) -> Result<CommitDetails> {
        let commit = self
            .history
            .commit(id)
            .ok_or_else(|| Error::provider_unavailable(format!("unknown commit {}", id.as_ref())))?;

        let committed_at = commit
            .row
            .commit_time
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            .to_string();

        Ok(CommitDetails {
            id: commit.row.id.clone(),
            message: commit.row.summary.clone(),
            author: commit.row.author.clone(),
            committed_at,
            parent_ids: commit.row.parent_ids.clone(),
            files: commit
                .files
                .iter()
                .map(|path| CommitFileChange {
                    path: path.clone(),
                    kind: FileChangeKind::Modified,
                })
                .collect(),
        })
    }

    fn commit_enrichment(&self, id: &CommitId) -> Result<CommitEnrichment> {
        let commit = self
            .history
            .commit(id)
            .ok_or_else(|| Error::provider_unavailable(format!("unknown commit {}", id.as_ref())))?;
        Ok(commit.enrichment.clone().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn five_commits() -> Arc<MemoryHistory> {
        MemoryHistory::builder()
            .commit("c5", &["c4"], "alice", "polish ui", 50)
            .commit_with_files("c4", &["c3"], "bob", "fix parser", 40, &["src/parser.rs"])
            .commit("c3", &["c2"], "alice", "add docs", 30)
            .commit_with_files("c2", &["c1"], "bob", "fix lexer", 20, &["src/lexer.rs"])
            .commit("c1", &[], "alice", "initial import", 10)
            .build()
    }

    fn provider(history: Arc<MemoryHistory>) -> Arc<dyn HistoryProvider> {
        MemoryBackend::new(history)
            .open(Path::new("/tmp/mem"))
            .expect("memory backend opens")
    }

    #[test]
    fn cursor_gate_skips_until_after_last_seen() {
        let last = CommitId("c2".to_string());
        let mut gate = CursorGate::new(Some(&last));

        assert!(gate.should_skip(&CommitId("c1".to_string())));
        assert!(gate.should_skip(&CommitId("c2".to_string())));
        assert!(!gate.should_skip(&CommitId("c3".to_string())));
        assert!(!gate.should_skip(&CommitId("c4".to_string())));
    }

    #[test]
    fn graph_pages_are_resumable_and_terminate() {
        let provider = provider(five_commits());
        let cancel = CancelToken::new();

        let first = provider.graph_page(2, None, &cancel).unwrap();
        assert_eq!(first.rows.len(), 2);
        assert!(first.has_more);
        let cursor = first.next_cursor.expect("cursor");
        assert_eq!(cursor.last_seen.as_ref(), "c4");

        let second = provider.graph_page(10, Some(&cursor), &cancel).unwrap();
        let ids: Vec<&str> = second.rows.iter().map(|r| r.id.as_ref()).collect();
        assert_eq!(ids, vec!["c3", "c2", "c1"]);
        assert!(!second.has_more);
        assert!(second.next_cursor.is_none());
    }

    #[test]
    fn graph_page_limit_zero_loads_everything() {
        let provider = provider(five_commits());
        let page = provider.graph_page(0, None, &CancelToken::new()).unwrap();
        assert_eq!(page.rows.len(), 5);
        assert!(!page.has_more);
    }

    #[test]
    fn cancelled_graph_page_truncates_without_error() {
        let provider = provider(five_commits());
        let cancel = CancelToken::new();
        cancel.cancel();

        let page = provider.graph_page(3, None, &cancel).unwrap();
        assert!(page.rows.is_empty());
        assert!(page.has_more);
    }

    #[test]
    fn search_finds_matches_in_history_order() {
        let provider = provider(five_commits());
        let chunk = provider
            .search_page(
                &SearchQuery::parse("fix"),
                SearchOrdering::CommitDate,
                10,
                None,
                &CancelToken::new(),
            )
            .unwrap();

        let ids: Vec<&str> = chunk.matches.iter().map(|(id, _)| id.as_ref()).collect();
        assert_eq!(ids, vec!["c4", "c2"]);
        assert!(!chunk.has_more);
    }

    #[test]
    fn search_scan_limit_paces_the_scan() {
        let history = MemoryHistory::builder()
            .commit("c5", &["c4"], "alice", "polish ui", 50)
            .commit("c4", &["c3"], "bob", "fix parser", 40)
            .commit("c3", &["c2"], "alice", "add docs", 30)
            .commit("c2", &["c1"], "bob", "fix lexer", 20)
            .commit("c1", &[], "alice", "initial import", 10)
            .search_scan_limit(3)
            .build();
        let provider = provider(history);

        let first = provider
            .search_page(
                &SearchQuery::parse("fix"),
                SearchOrdering::CommitDate,
                10,
                None,
                &CancelToken::new(),
            )
            .unwrap();
        let ids: Vec<&str> = first.matches.iter().map(|(id, _)| id.as_ref()).collect();
        assert_eq!(ids, vec!["c4"]);
        assert!(first.has_more);
        let cursor = first.next_cursor.expect("cursor");
        assert_eq!(cursor.last_seen.as_ref(), "c3");

        let second = provider
            .search_page(
                &SearchQuery::parse("fix"),
                SearchOrdering::CommitDate,
                10,
                Some(&cursor),
                &CancelToken::new(),
            )
            .unwrap();
        let ids: Vec<&str> = second.matches.iter().map(|(id, _)| id.as_ref()).collect();
        assert_eq!(ids, vec!["c2"]);
        assert!(!second.has_more);
    }

    #[test]
    fn search_reports_matched_files() {
        let provider = provider(five_commits());
        let chunk = provider
            .search_page(
                &SearchQuery::parse("file:src/*.rs"),
                SearchOrdering::CommitDate,
                10,
                None,
                &CancelToken::new(),
            )
            .unwrap();

        assert_eq!(chunk.matches.len(), 2);
        let (id, entry) = &chunk.matches[0];
        assert_eq!(id.as_ref(), "c4");
        assert_eq!(entry.matched_files, vec![PathBuf::from("src/parser.rs")]);
    }

    #[test]
    fn author_date_ordering_resorts_matches() {
        // c3 was committed last but authored first (a rebased commit).
        let history = MemoryHistory::builder()
            .commit("c3", &["c2"], "alice", "fix late authored early", 30)
            .commit("c2", &["c1"], "bob", "fix committed second", 20)
            .commit("c1", &[], "alice", "base", 10)
            .author_time("c3", 5)
            .build();
        let provider = provider(history);

        let query = SearchQuery::parse("fix");
        let by_commit = provider
            .search_page(
                &query,
                SearchOrdering::CommitDate,
                10,
                None,
                &CancelToken::new(),
            )
            .unwrap();
        let ids: Vec<&str> = by_commit.matches.iter().map(|(id, _)| id.as_ref()).collect();
        assert_eq!(ids, vec!["c3", "c2"]);

        let by_author = provider
            .search_page(
                &query,
                SearchOrdering::AuthorDate,
                10,
                None,
                &CancelToken::new(),
            )
            .unwrap();
        let ids: Vec<&str> = by_author.matches.iter().map(|(id, _)| id.as_ref()).collect();
        assert_eq!(ids, vec!["c2", "c3"]);
    }

    #[test]
    fn scripted_failures_surface_and_clear() {
        let history = five_commits();
        let provider = provider(Arc::clone(&history));
        history.fail_next_graph_pages(1);

        assert!(provider.graph_page(2, None, &CancelToken::new()).is_err());
        assert!(provider.graph_page(2, None, &CancelToken::new()).is_ok());
    }

    #[test]
    fn invalid_query_fails_before_scanning() {
        let provider = provider(five_commits());
        let mut query = SearchQuery::parse("fix(");
        query.use_regex = true;

        let result = provider.search_page(
            &query,
            SearchOrdering::CommitDate,
            10,
            None,
            &CancelToken::new(),
        );
        assert!(matches!(
            result.unwrap_err().kind(),
            gitscope_core::error::ErrorKind::InvalidQuery(_)
        ));
    }

    #[test]
    fn details_and_enrichment_come_from_the_fixture() {
        let history = MemoryHistory::builder()
            .commit_with_files("c2", &["c1"], "bob", "fix lexer", 20, &["src/lexer.rs"])
            .commit("c1", &[], "alice", "base", 10)
            .enrichment(
                "c2",
                CommitEnrichment {
                    associated_changes: vec![AssociatedChange {
                        reference: "#7".to_string(),
                        title: "lexer fix".to_string(),
                        url: None,
                    }],
                },
            )
            .build();
        let provider = provider(history);

        let details = provider.commit_details(&CommitId("c2".to_string())).unwrap();
        assert_eq!(details.author, "bob");
        assert_eq!(details.files.len(), 1);

        let enrichment = provider
            .commit_enrichment(&CommitId("c2".to_string()))
            .unwrap();
        assert_eq!(enrichment.associated_changes.len(), 1);
    }
}

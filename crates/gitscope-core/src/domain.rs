use std::path::PathBuf;
use std::time::SystemTime;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RepoSpec {
    pub workdir: PathBuf,
}

/// Sentinel id of the uncommitted working-tree pseudo-row. Display-facing
/// ids may suffix the base commit (`@working:<sha>`); comparisons go
/// through [`CommitId::canonical`].
const WORKING_TREE_ID: &str = "@working";

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CommitId(pub String);

impl CommitId {
    pub fn working() -> Self {
        Self(WORKING_TREE_ID.to_string())
    }

    pub fn working_on(base: &CommitId) -> Self {
        Self(format!("{WORKING_TREE_ID}:{}", base.0))
    }

    pub fn is_working(&self) -> bool {
        self.0 == WORKING_TREE_ID || self.0.starts_with("@working:")
    }

    /// The stable internal identity: all working-tree spellings collapse
    /// onto the bare sentinel, everything else is itself.
    pub fn canonical(&self) -> CommitId {
        if self.is_working() {
            CommitId::working()
        } else {
            self.clone()
        }
    }
}

impl AsRef<str> for CommitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RowKind {
    Commit,
    Merge,
    WorkingChanges,
    Stash,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RefKind {
    Head,
    LocalBranch,
    RemoteBranch,
    Tag,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RefAssociation {
    pub name: String,
    pub kind: RefKind,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GraphRow {
    pub id: CommitId,
    pub parent_ids: Vec<CommitId>,
    pub summary: String,
    pub author: String,
    pub author_time: SystemTime,
    pub commit_time: SystemTime,
    pub refs: Vec<RefAssociation>,
    pub kind: RowKind,
}

/// One page of materialized history rows. `has_more == false` means the
/// provider cleanly reported exhaustion; a failed fetch never produces a
/// page at all.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GraphPage {
    pub rows: Vec<GraphRow>,
    pub next_cursor: Option<GraphCursor>,
    pub has_more: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GraphCursor {
    pub last_seen: CommitId,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HeadInfo {
    pub branch: Option<String>,
    pub target: CommitId,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum SearchOrdering {
    AuthorDate,
    #[default]
    CommitDate,
}

impl SearchOrdering {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthorDate => "author-date",
            Self::CommitDate => "commit-date",
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SearchResultEntry {
    pub matched_files: Vec<PathBuf>,
}

/// One chunk of search matches, in history order (nearest to head first).
/// Continuable via `next_cursor`; `has_more == false` is the terminal
/// chunk of the stream.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchChunk {
    pub matches: Vec<(CommitId, SearchResultEntry)>,
    pub next_cursor: Option<SearchCursor>,
    pub has_more: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchCursor {
    pub last_seen: CommitId,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommitDetails {
    pub id: CommitId,
    pub message: String,
    pub author: String,
    pub committed_at: String,
    pub parent_ids: Vec<CommitId>,
    pub files: Vec<CommitFileChange>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommitFileChange {
    pub path: PathBuf,
    pub kind: FileChangeKind,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FileChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
}

/// Secondary metadata attached to a commit after the fact (associated
/// reviews, issues). Fetching this may be slow; the hover path never
/// blocks on it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommitEnrichment {
    pub associated_changes: Vec<AssociatedChange>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssociatedChange {
    pub reference: String,
    pub title: String,
    pub url: Option<String>,
}

use gitscope_core::query::SearchQuery;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs, io};

pub const MAX_ENTRIES: usize = 50;

/// Most-recently-used store of prior search queries.
///
/// Entries are de-duplicated by the query's canonical comparison key, so a
/// free-text query and its equivalent structured spelling occupy one slot.
/// Re-storing promotes to the front; the store is capped at
/// [`MAX_ENTRIES`] with the oldest entry evicted.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SearchHistoryStore {
    entries: Vec<HistoryEntry>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct HistoryEntry {
    text: String,
    key: String,
}

impl SearchHistoryStore {
    /// Prior queries, most recent first.
    pub fn get(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.text.as_str()).collect()
    }

    pub fn store(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let key = canonical_key(text);
        self.entries.retain(|e| e.key != key);
        self.entries.insert(
            0,
            HistoryEntry {
                text: text.to_string(),
                key,
            },
        );
        self.entries.truncate(MAX_ENTRIES);
    }

    pub fn delete(&mut self, text: &str) {
        let key = canonical_key(text);
        self.entries.retain(|e| e.key != key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn canonical_key(text: &str) -> String {
    SearchQuery::parse(text).comparison_key()
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
struct SearchHistoryFileV1 {
    version: u32,
    queries: Vec<String>,
}

const HISTORY_FILE_VERSION_V1: u32 = 1;

pub fn load() -> SearchHistoryStore {
    let Some(path) = default_history_file_path() else {
        return SearchHistoryStore::default();
    };
    load_from_path(&path)
}

pub fn load_from_path(path: &Path) -> SearchHistoryStore {
    let Ok(contents) = fs::read_to_string(path) else {
        return SearchHistoryStore::default();
    };
    let Ok(file) = serde_json::from_str::<SearchHistoryFileV1>(&contents) else {
        return SearchHistoryStore::default();
    };
    if file.version != HISTORY_FILE_VERSION_V1 {
        return SearchHistoryStore::default();
    }

    // Oldest first on disk; re-storing in order rebuilds the MRU order
    // and re-applies dedup + cap.
    let mut store = SearchHistoryStore::default();
    for query in file.queries.iter().rev() {
        store.store(query);
    }
    store
}

pub fn persist(store: &SearchHistoryStore) -> io::Result<()> {
    let Some(path) = default_history_file_path() else {
        return Ok(());
    };
    persist_to_path(store, &path)
}

pub fn persist_to_path(store: &SearchHistoryStore, path: &Path) -> io::Result<()> {
    let file = SearchHistoryFileV1 {
        version: HISTORY_FILE_VERSION_V1,
        queries: store.entries.iter().map(|e| e.text.clone()).collect(),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    let contents =
        serde_json::to_vec(&file).expect("serializing search history file should succeed");
    fs::write(&tmp_path, contents)?;

    match fs::rename(&tmp_path, path) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            // Windows can't overwrite an existing file via rename.
            let copy_res = fs::copy(&tmp_path, path);
            let _ = fs::remove_file(&tmp_path);
            match copy_res {
                Ok(_) => Ok(()),
                Err(copy_err) => Err(io::Error::new(
                    copy_err.kind(),
                    format!("rename failed: {rename_err}; copy failed: {copy_err}"),
                )),
            }
        }
    }
}

fn default_history_file_path() -> Option<PathBuf> {
    // Avoid writing to the user state dir during unit tests unless a path
    // is passed explicitly.
    if cfg!(test) {
        return None;
    }

    Some(app_state_dir()?.join("search-history.json"))
}

fn app_state_dir() -> Option<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        if let Some(state_home) = env::var_os("XDG_STATE_HOME") {
            return Some(PathBuf::from(state_home).join("gitscope"));
        }
        let home = env::var_os("HOME")?;
        Some(PathBuf::from(home).join(".local/state/gitscope"))
    }

    #[cfg(target_os = "macos")]
    {
        let home = env::var_os("HOME")?;
        return Some(PathBuf::from(home).join("Library/Application Support/gitscope"));
    }

    #[cfg(target_os = "windows")]
    {
        let appdata = env::var_os("LOCALAPPDATA").or_else(|| env::var_os("APPDATA"))?;
        return Some(PathBuf::from(appdata).join("gitscope"));
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".gitscope"))
    }
}

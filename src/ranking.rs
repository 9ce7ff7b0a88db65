//! Shared ranking document
//!
//! Every player's latest result lives in one document keyed by user id:
//!
//! ```json
//! { "entries": { "<uid>": { "key": "<uid>", "score": 7, "name": "Mina" } } }
//! ```
//!
//! Writes merge a single entry into the document. Reads list every entry in
//! document order. Failures on either path are logged and never reach the
//! game.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Signed-in player as reported by the identity provider. Both fields are
/// opaque and never validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub display_name: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }
}

/// One player's entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// User id, same as the map key
    pub key: String,
    /// Stage reached
    pub score: u32,
    #[serde(default)]
    pub name: String,
}

impl RankingEntry {
    pub fn new(identity: &Identity, score: u32) -> Self {
        Self {
            key: identity.user_id.clone(),
            score,
            name: identity.display_name.clone(),
        }
    }

    /// `"<name> : <score>"`
    pub fn display_line(&self) -> String {
        format!("{} : {}", self.name, self.score)
    }
}

/// The whole ranking document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RankingDocument {
    #[serde(default)]
    pub entries: BTreeMap<String, RankingEntry>,
}

impl RankingDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `entry` under its key, replacing whatever was there
    pub fn merge(&mut self, entry: RankingEntry) {
        self.entries.insert(entry.key.clone(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&RankingEntry> {
        self.entries.get(key)
    }

    /// Display lines in document order (no sorting)
    pub fn lines(&self) -> Vec<String> {
        self.entries.values().map(RankingEntry::display_line).collect()
    }

    /// Entries by descending score, ties by key
    pub fn sorted_by_score(&self) -> Vec<&RankingEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.key.cmp(&b.key)));
        entries
    }

    pub fn top_score(&self) -> Option<u32> {
        self.entries.values().map(|e| e.score).max()
    }
}

/// Where the ranking document lives
pub trait RankingStore {
    fn load(&self) -> Result<RankingDocument, StoreError>;

    /// Merge one entry into the stored document
    fn merge(&mut self, entry: RankingEntry) -> Result<(), StoreError>;
}

/// Best-effort write. The outcome is logged and otherwise dropped.
pub fn submit_best_effort<S: RankingStore + ?Sized>(store: &mut S, entry: RankingEntry) {
    let key = entry.key.clone();
    match store.merge(entry) {
        Ok(()) => log::info!("Ranking for {} successfully written", key),
        Err(e) => log::warn!("Error writing ranking for {}: {}", key, e),
    }
}

/// Run `submit_best_effort` as a detached task. Callers may drop the handle.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_submission<S>(mut store: S, entry: RankingEntry) -> std::thread::JoinHandle<()>
where
    S: RankingStore + Send + 'static,
{
    std::thread::spawn(move || submit_best_effort(&mut store, entry))
}

/// Read path for the ranking screen; failures show an empty list
pub fn load_lines<S: RankingStore + ?Sized>(store: &S) -> Vec<String> {
    match store.load() {
        Ok(document) => {
            log::info!("Loaded {} ranking entries", document.len());
            document.lines()
        }
        Err(e) => {
            log::warn!("Error reading ranking: {}", e);
            Vec::new()
        }
    }
}

/// In-process store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    document: RankingDocument,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self) -> &RankingDocument {
        &self.document
    }
}

impl RankingStore for MemoryStore {
    fn load(&self) -> Result<RankingDocument, StoreError> {
        Ok(self.document.clone())
    }

    fn merge(&mut self, entry: RankingEntry) -> Result<(), StoreError> {
        self.document.merge(entry);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::fs;
    use std::path::{Path, PathBuf};

    use super::*;

    /// JSON document on disk. A missing file is an empty ranking.
    ///
    /// `merge` is an unlocked read-modify-write, so two merges running at
    /// once can lose one of the entries, and a write still in flight when the
    /// process exits is dropped. Both fit the best-effort contract.
    #[derive(Debug, Clone)]
    pub struct FileStore {
        path: PathBuf,
    }

    impl FileStore {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl RankingStore for FileStore {
        fn load(&self) -> Result<RankingDocument, StoreError> {
            if !self.path.exists() {
                return Ok(RankingDocument::new());
            }
            let json = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&json)?)
        }

        fn merge(&mut self, entry: RankingEntry) -> Result<(), StoreError> {
            let mut document = self.load()?;
            document.merge(entry);

            if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)?;
            }
            // Write then rename so readers never see a half-written document
            let tmp = self.path.with_extension("json.tmp");
            fs::write(&tmp, serde_json::to_string_pretty(&document)?)?;
            fs::rename(&tmp, &self.path)?;
            Ok(())
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorageStore;

#[cfg(target_arch = "wasm32")]
mod local_storage {
    use super::*;

    /// Ranking document in the browser's LocalStorage
    #[derive(Debug, Clone, Default)]
    pub struct LocalStorageStore;

    impl LocalStorageStore {
        const STORAGE_KEY: &'static str = "find_color_ranking";

        fn storage() -> Result<web_sys::Storage, StoreError> {
            web_sys::window()
                .and_then(|w| w.local_storage().ok())
                .flatten()
                .ok_or_else(|| StoreError::Unavailable("no LocalStorage".to_string()))
        }
    }

    impl RankingStore for LocalStorageStore {
        fn load(&self) -> Result<RankingDocument, StoreError> {
            let json = Self::storage()?
                .get_item(Self::STORAGE_KEY)
                .map_err(|e| StoreError::Unavailable(format!("{:?}", e)))?;
            match json {
                Some(json) => Ok(serde_json::from_str(&json)?),
                None => Ok(RankingDocument::new()),
            }
        }

        fn merge(&mut self, entry: RankingEntry) -> Result<(), StoreError> {
            let mut document = self.load()?;
            document.merge(entry);
            let json = serde_json::to_string(&document)?;
            Self::storage()?
                .set_item(Self::STORAGE_KEY, &json)
                .map_err(|e| StoreError::Unavailable(format!("{:?}", e)))
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    fn entry(key: &str, name: &str, score: u32) -> RankingEntry {
        RankingEntry::new(&Identity::new(key, name), score)
    }

    struct FailingStore;

    impl RankingStore for FailingStore {
        fn load(&self) -> Result<RankingDocument, StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }

        fn merge(&mut self, _entry: RankingEntry) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("find-color-{}-{}", std::process::id(), name))
            .join("ranking.json")
    }

    #[test]
    fn test_merge_replaces_same_key() {
        let mut doc = RankingDocument::new();
        doc.merge(entry("u1", "Mina", 9));
        doc.merge(entry("u2", "Joon", 4));
        doc.merge(entry("u1", "Mina", 3));

        assert_eq!(doc.len(), 2);
        assert_eq!(doc.get("u1").map(|e| e.score), Some(3));
        assert_eq!(doc.top_score(), Some(4));
    }

    #[test]
    fn test_lines_keep_document_order() {
        let mut doc = RankingDocument::new();
        doc.merge(entry("b", "Low", 2));
        doc.merge(entry("a", "High", 10));
        doc.merge(entry("c", "Mid", 5));

        assert_eq!(doc.lines(), vec!["High : 10", "Low : 2", "Mid : 5"]);
        let sorted: Vec<_> = doc.sorted_by_score().iter().map(|e| e.score).collect();
        assert_eq!(sorted, vec![10, 5, 2]);
    }

    #[test]
    fn test_document_json_shape() {
        let mut doc = RankingDocument::new();
        doc.merge(entry("uid", "Mina", 7));
        let value = serde_json::to_value(&doc).unwrap();
        let expected = serde_json::json!({
            "entries": { "uid": { "key": "uid", "score": 7, "name": "Mina" } }
        });
        assert_eq!(value, expected);

        let parsed: RankingDocument =
            serde_json::from_str(r#"{ "entries": { "x": { "key": "x", "score": 1 } } }"#).unwrap();
        assert_eq!(parsed.lines(), vec![" : 1"]);
    }

    #[test]
    fn test_failures_are_swallowed() {
        let mut store = FailingStore;
        submit_best_effort(&mut store, entry("u1", "Mina", 3));
        assert!(load_lines(&store).is_empty());
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        submit_best_effort(&mut store, entry("u1", "Mina", 3));
        assert_eq!(load_lines(&store), vec!["Mina : 3"]);
        assert_eq!(store.document().len(), 1);
    }

    #[test]
    fn test_file_store_merges() {
        let path = temp_path("merge");
        let _ = std::fs::remove_file(&path);
        let mut store = FileStore::new(&path);

        assert!(store.load().unwrap().is_empty());
        store.merge(entry("u1", "Mina", 3)).unwrap();
        store.merge(entry("u2", "Joon", 8)).unwrap();
        store.merge(entry("u1", "Mina", 5)).unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(load_lines(&reopened), vec!["Mina : 5", "Joon : 8"]);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_file_store_malformed() {
        let path = temp_path("malformed");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let mut store = FileStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Format(_))));
        assert!(store.merge(entry("u1", "Mina", 1)).is_err());
        assert!(load_lines(&store).is_empty());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_spawned_submission_writes() {
        let path = temp_path("spawn");
        let _ = std::fs::remove_file(&path);

        spawn_submission(FileStore::new(&path), entry("u9", "Solo", 12))
            .join()
            .unwrap();
        assert_eq!(load_lines(&FileStore::new(&path)), vec!["Solo : 12"]);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}

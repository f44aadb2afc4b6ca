//! Durable resume state for the enrichment pipeline.
//!
//! The [`CheckpointStore`] records which candidates (by URL and by name) and
//! which categories have been fully processed. Every mutation rewrites the
//! whole document atomically: the JSON is written to `<file>.tmp` and renamed
//! over the target, so a crash leaves either the old or the new document.
//!
//! A document that cannot be read or parsed is treated as "no checkpoint".

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use heritagekb_shared::{Category, HeritageError, Result};

/// Current on-disk document version.
pub const CHECKPOINT_VERSION: u32 = 1;

/// The persisted checkpoint document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointDocument {
    #[serde(default = "current_version")]
    pub version: u32,
    /// In completion order.
    #[serde(default)]
    pub processed_urls: Vec<String>,
    #[serde(default)]
    pub processed_names: Vec<String>,
    #[serde(default)]
    pub completed_categories: Vec<String>,
    #[serde(default)]
    pub total_processed: u64,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

fn current_version() -> u32 {
    CHECKPOINT_VERSION
}

/// Summary counters for display.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointStats {
    pub processed_urls: usize,
    pub processed_names: usize,
    pub completed_categories: Vec<String>,
    pub total_processed: u64,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Single-writer checkpoint bound to one file.
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    doc: CheckpointDocument,
    urls: HashSet<String>,
    names: HashSet<String>,
}

impl CheckpointStore {
    /// An empty store bound to `path`. Nothing is read or written.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            doc: empty_document(),
            urls: HashSet::new(),
            names: HashSet::new(),
        }
    }

    /// Bind to `path` and load whatever is there.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut store = Self::new(path);
        store.load();
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace in-memory state with the file's contents.
    ///
    /// Returns `false` (and leaves the store empty) when the file is missing,
    /// unreadable, unparsable or written by a newer version.
    pub fn load(&mut self) -> bool {
        self.reset();

        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no checkpoint file");
                return false;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "checkpoint unreadable, starting fresh");
                return false;
            }
        };

        let doc: CheckpointDocument = match serde_json::from_str(&content) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "checkpoint corrupt, starting fresh");
                return false;
            }
        };

        if doc.version > CHECKPOINT_VERSION {
            warn!(
                path = %self.path.display(),
                version = doc.version,
                supported = CHECKPOINT_VERSION,
                "checkpoint written by a newer version, ignoring"
            );
            return false;
        }

        self.urls = doc.processed_urls.iter().cloned().collect();
        self.names = doc.processed_names.iter().cloned().collect();
        self.doc = doc;
        self.doc.version = CHECKPOINT_VERSION;

        info!(
            path = %self.path.display(),
            processed = self.doc.total_processed,
            categories = self.doc.completed_categories.len(),
            "checkpoint loaded"
        );
        true
    }

    /// Atomically rewrite the checkpoint file.
    pub fn save(&mut self) -> Result<()> {
        self.doc.last_updated = Some(Utc::now());
        let json = serde_json::to_string_pretty(&self.doc)
            .map_err(|e| HeritageError::Checkpoint(format!("serialize: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| HeritageError::io(parent, e))?;
        }

        let temp = temp_path(&self.path);
        if let Err(e) = std::fs::write(&temp, json) {
            let _ = std::fs::remove_file(&temp);
            return Err(HeritageError::io(&temp, e));
        }
        if let Err(e) = std::fs::rename(&temp, &self.path) {
            let _ = std::fs::remove_file(&temp);
            return Err(HeritageError::io(&self.path, e));
        }

        debug!(path = %self.path.display(), processed = self.doc.total_processed, "checkpoint saved");
        Ok(())
    }

    /// Forget everything and delete the file.
    pub fn clear(&mut self) -> Result<()> {
        self.reset();
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "checkpoint cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(HeritageError::io(&self.path, e)),
        }
    }

    /// True when either the URL or the name was recorded before.
    ///
    /// Two distinct sites sharing a listing title therefore collide; the
    /// second one is skipped.
    pub fn is_processed(&self, url: &str, name: &str) -> bool {
        let url = url.trim();
        let name = name.trim();
        (!url.is_empty() && self.urls.contains(url)) || (!name.is_empty() && self.names.contains(name))
    }

    /// Record a committed candidate and save.
    pub fn mark_processed(&mut self, url: &str, name: &str) -> Result<()> {
        let url = url.trim();
        let name = name.trim();
        let mut added = false;
        if !url.is_empty() && self.urls.insert(url.to_string()) {
            self.doc.processed_urls.push(url.to_string());
            added = true;
        }
        if !name.is_empty() && self.names.insert(name.to_string()) {
            self.doc.processed_names.push(name.to_string());
            added = true;
        }
        if added {
            self.doc.total_processed += 1;
        }
        self.save()
    }

    pub fn is_category_complete(&self, category: Category) -> bool {
        self.doc
            .completed_categories
            .iter()
            .any(|c| c == category.slug())
    }

    /// Record a fully processed category and save.
    pub fn mark_category_complete(&mut self, category: Category) -> Result<()> {
        if !self.is_category_complete(category) {
            self.doc.completed_categories.push(category.slug().to_string());
        }
        self.save()
    }

    pub fn stats(&self) -> CheckpointStats {
        CheckpointStats {
            processed_urls: self.doc.processed_urls.len(),
            processed_names: self.doc.processed_names.len(),
            completed_categories: self.doc.completed_categories.clone(),
            total_processed: self.doc.total_processed,
            last_updated: self.doc.last_updated,
        }
    }

    pub fn document(&self) -> &CheckpointDocument {
        &self.doc
    }

    fn reset(&mut self) {
        self.doc = empty_document();
        self.urls.clear();
        self.names.clear();
    }
}

fn empty_document() -> CheckpointDocument {
    CheckpointDocument {
        version: CHECKPOINT_VERSION,
        ..Default::default()
    }
}

/// `<file>.tmp` next to the target.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("hkb-checkpoint-test-{}", Uuid::now_v7()))
            .join("checkpoint.json")
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn missing_file_is_empty_store() {
        let path = test_path();
        let mut store = CheckpointStore::new(&path);
        assert!(!store.load());
        assert_eq!(store.stats().total_processed, 0);
        assert!(!store.is_processed("https://x/en/monuments/a", "A"));
    }

    #[test]
    fn mark_save_and_reload() {
        let path = test_path();
        let mut store = CheckpointStore::open(&path);
        store
            .mark_processed("https://x/en/monuments/obelisk", "Obelisk")
            .expect("mark");
        store
            .mark_category_complete(Category::Monuments)
            .expect("mark category");

        assert!(path.exists());
        assert!(!temp_path(&path).exists());

        let mut reloaded = CheckpointStore::new(&path);
        assert!(reloaded.load());
        assert!(reloaded.is_processed("https://x/en/monuments/obelisk", ""));
        assert!(reloaded.is_category_complete(Category::Monuments));
        assert!(!reloaded.is_category_complete(Category::Museums));
        let stats = reloaded.stats();
        assert_eq!(stats.total_processed, 1);
        assert_eq!(stats.completed_categories, vec!["monuments".to_string()]);
        assert!(stats.last_updated.is_some());

        cleanup(&path);
    }

    #[test]
    fn processed_matches_url_or_name() {
        let path = test_path();
        let mut store = CheckpointStore::new(&path);
        store
            .mark_processed("https://x/en/museums/museum", "Museum")
            .expect("mark");

        assert!(store.is_processed("https://x/en/museums/museum", "Other"));
        assert!(store.is_processed("https://x/en/monuments/museum", "Museum"));
        assert!(!store.is_processed("https://x/en/monuments/other", "Other"));
        assert!(!store.is_processed("", ""));

        cleanup(&path);
    }

    #[test]
    fn marking_twice_counts_once() {
        let path = test_path();
        let mut store = CheckpointStore::new(&path);
        store.mark_processed("u", "n").expect("mark");
        store.mark_processed("u", "n").expect("mark again");
        store.mark_category_complete(Category::Museums).expect("cat");
        store.mark_category_complete(Category::Museums).expect("cat again");
        assert_eq!(store.stats().total_processed, 1);
        assert_eq!(store.document().processed_urls, vec!["u".to_string()]);
        assert_eq!(store.stats().completed_categories.len(), 1);
        cleanup(&path);
    }

    #[test]
    fn corrupt_file_is_no_checkpoint() {
        let path = test_path();
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, "{ not json").expect("write");

        let mut store = CheckpointStore::new(&path);
        assert!(!store.load());
        assert_eq!(store.stats().processed_urls, 0);

        cleanup(&path);
    }

    #[test]
    fn newer_version_is_ignored() {
        let path = test_path();
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(
            &path,
            r#"{"version": 99, "processedUrls": ["u"], "processedNames": [], "completedCategories": [], "totalProcessed": 1}"#,
        )
        .expect("write");

        let store = CheckpointStore::open(&path);
        assert!(!store.is_processed("u", ""));

        cleanup(&path);
    }

    #[test]
    fn wire_format_is_camel_case() {
        let path = test_path();
        let mut store = CheckpointStore::new(&path);
        store.mark_processed("u", "n").expect("mark");

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(raw["version"], 1);
        assert_eq!(raw["processedUrls"][0], "u");
        assert_eq!(raw["processedNames"][0], "n");
        assert_eq!(raw["totalProcessed"], 1);
        assert!(raw["completedCategories"].as_array().expect("array").is_empty());
        assert!(raw["lastUpdated"].is_string());

        cleanup(&path);
    }

    #[test]
    fn failed_save_leaves_no_temp_file() {
        let path = test_path();
        std::fs::create_dir_all(&path).expect("directory in the way");
        let mut store = CheckpointStore::new(&path);

        let err = store.save().expect_err("rename onto a directory");
        assert!(matches!(err, HeritageError::Io { .. }));
        assert!(!temp_path(&path).exists());
        assert!(path.is_dir());

        cleanup(&path);
    }

    #[test]
    fn clear_deletes_file_and_state() {
        let path = test_path();
        let mut store = CheckpointStore::new(&path);
        store.mark_processed("u", "n").expect("mark");
        assert!(path.exists());

        store.clear().expect("clear");
        assert!(!path.exists());
        assert!(!store.is_processed("u", "n"));
        store.clear().expect("clearing twice is fine");

        cleanup(&path);
    }
}

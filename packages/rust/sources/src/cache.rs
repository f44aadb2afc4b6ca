//! In-process memo caches owned by the pipeline and lent to adapters.

use std::collections::HashMap;
use std::sync::Mutex;

/// A string-keyed memo table. Cloned values are handed out.
#[derive(Debug)]
pub struct MemoCache<V> {
    entries: Mutex<HashMap<String, V>>,
}

impl<V> Default for MemoCache<V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<V: Clone> MemoCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.lock().get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.lock().insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, V>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Lowercased English term to its translation.
pub type TranslationCache = MemoCache<String>;

/// Normalise a term into its translation-cache key.
pub fn translation_key(term: &str) -> String {
    term.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memo_roundtrip_and_clear() {
        let cache: TranslationCache = MemoCache::new();
        assert!(cache.is_empty());
        cache.insert(translation_key(" Obelisk "), "مسلة".to_string());
        assert_eq!(cache.get("obelisk").as_deref(), Some("مسلة"));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.get("obelisk").is_none());
    }
}

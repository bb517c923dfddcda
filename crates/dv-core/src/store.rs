//! Key-value store for editor UI state
//!
//! Collapsed/expanded categories and similar per-user UI state survive between
//! editing sessions. The store is injected wherever that state is read so the
//! composition code never touches process-wide storage directly.

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::value::ConfigValue;

/// Persistent key-value storage for UI state
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Option<ConfigValue>;

    /// Write a value
    fn set(&self, key: &str, value: ConfigValue);

    /// Remove a value
    fn remove(&self, key: &str);

    /// Read a boolean value
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }
}

/// In-memory store, used by tests and sessions without persistent storage
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<AHashMap<String, ConfigValue>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: ConfigValue) {
        self.entries.write().insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.entries.write().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.set("panel-edit.category-Axis", true.into());
        assert_eq!(store.get_bool("panel-edit.category-Axis"), Some(true));
        assert_eq!(store.get_bool("missing"), None);

        store.set("text", "abc".into());
        assert_eq!(store.get_bool("text"), None);
        assert_eq!(store.len(), 2);

        store.remove("text");
        assert_eq!(store.len(), 1);
    }
}

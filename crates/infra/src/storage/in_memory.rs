use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{KeyValueStore, StorageError, StorageResult};

/// In-memory key-value store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    inner: RwLock<HashMap<String, String>>,
    writes: AtomicU64,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `put`/`put_many` calls so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn bump_writes(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

fn poisoned() -> StorageError {
    StorageError::Unavailable("lock poisoned".to_string())
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.insert(key.to_string(), value.to_string());
        drop(map);
        self.bump_writes();
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.remove(key);
        Ok(())
    }

    // One lock for the whole batch, so readers never see half of it.
    fn put_many(&self, entries: &[(&str, String)]) -> StorageResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        drop(map);
        self.bump_writes();
        Ok(())
    }
}

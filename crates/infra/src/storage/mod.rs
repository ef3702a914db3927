//! Local key-value storage abstractions.
//!
//! Values are whole JSON documents; a `put` replaces the previous value
//! (last write wins). There is no cross-key transaction.

pub mod file;
pub mod in_memory;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use file::FileKeyValueStore;
pub use in_memory::InMemoryKeyValueStore;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Single local store keyed by short names (`customers`, `transactions`).
pub trait KeyValueStore: Send + Sync {
    /// `Ok(None)` when the key has never been written.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    fn put(&self, key: &str, value: &str) -> StorageResult<()>;

    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Write several keys. Implementations should stage every value before
    /// making any of them visible.
    fn put_many(&self, entries: &[(&str, String)]) -> StorageResult<()> {
        for (key, value) in entries {
            self.put(key, value)?;
        }
        Ok(())
    }
}

impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).put(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }

    fn put_many(&self, entries: &[(&str, String)]) -> StorageResult<()> {
        (**self).put_many(entries)
    }
}

/// Typed JSON helpers over any [`KeyValueStore`].
pub trait JsonStore: KeyValueStore {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let raw = serde_json::to_string(value)?;
        self.put(key, &raw)
    }
}

impl<S: KeyValueStore + ?Sized> JsonStore for S {}

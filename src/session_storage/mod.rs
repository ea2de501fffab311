//! Key/value storage backing the persisted session fields.
//!
//! The store plays the role of the browser's local storage: plain string
//! values under string keys, surviving restarts when a durable backend is
//! used.

use std::fmt::Debug;
use std::ops::Deref;
use std::path::PathBuf;

pub mod file;
pub mod in_memory;

/// Errors raised by durable session stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing file could not be read or written
    #[error("session file {path} is not accessible: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The backing file exists but does not hold a JSON object of strings
    #[error("session file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub trait SessionStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<T, V> SessionStore for T
where
    T: Deref<Target = V> + Send + Sync + Debug,
    V: SessionStore + ?Sized,
{
    fn get(&self, key: &str) -> Option<String> {
        self.deref().get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.deref().set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.deref().remove(key)
    }
}

//! File-backed key-value storage for taskdeck.
//!
//! [`FileStore`] keeps the whole namespace in memory and write-through persists
//! it as a single JSON object file, the desktop analog of browser local
//! storage. [`MemoryStore`] is the ephemeral counterpart used by tests and
//! short-lived sessions.

mod error;

pub use error::StoreError;

use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Location of the store file.
    pub path: PathBuf,
    /// Optional cap on the serialized payload size, in bytes.
    pub quota_bytes: Option<u64>,
    /// Whether to start empty when the store file does not exist yet.
    pub create_if_missing: bool,
}

impl StoreConfig {
    /// Configuration with defaults for the given store file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            quota_bytes: None,
            create_if_missing: true,
        }
    }
}

/// Persistent key-value store backed by one JSON object file.
///
/// Every operation takes the single entry lock, so mutations are serialized;
/// writers persist the full namespace before releasing it. `remove` on an
/// absent key is a no-op.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    quota: Option<u64>,
    entries: Mutex<BTreeMap<String, Value>>,
}

impl FileStore {
    /// Open the store at `config.path`, loading existing entries if the file
    /// is present.
    ///
    /// # Errors
    /// Returns an error when the file exists but cannot be read or parsed, or
    /// when it is absent and `create_if_missing` is off.
    pub async fn open(config: StoreConfig) -> Result<Self, StoreError> {
        let StoreConfig {
            path,
            quota_bytes,
            create_if_missing,
        } = config;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                if !create_if_missing {
                    return Err(StoreError::Unavailable(format!(
                        "store file {} does not exist",
                        path.display()
                    )));
                }
                BTreeMap::new()
            }
            Err(err) => return Err(err.into()),
        };

        info!(path = %path.display(), entries = entries.len(), "opened store");
        Ok(Self {
            path,
            quota: quota_bytes,
            entries: Mutex::new(entries),
        })
    }

    /// Fetch the value stored under `key`, or `None` when absent.
    ///
    /// Reads come from the in-memory mirror and cannot fail once the store is
    /// open; backends with fallible reads are expected to log the failure and
    /// report the key as absent instead of surfacing an error.
    pub async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    /// Store `value` under `key`, echoing back the stored value.
    ///
    /// # Errors
    /// Fails with [`StoreError::QuotaExceeded`] when the write would exceed
    /// the configured quota (the previous value is restored), or with an I/O
    /// error when persisting fails.
    pub async fn set(&self, key: &str, value: Value) -> Result<Value, StoreError> {
        let mut entries = self.entries.lock().await;
        let previous = entries.insert(key.to_owned(), value.clone());

        let payload = match self.encode(&entries) {
            Ok(payload) => payload,
            Err(err) => {
                Self::restore(&mut entries, key, previous);
                return Err(err);
            }
        };
        if let Err(err) = self.persist(&payload).await {
            Self::restore(&mut entries, key, previous);
            return Err(err);
        }

        debug!(key, bytes = payload.len(), "stored entry");
        Ok(value)
    }

    /// Remove the entry under `key`. Removing an absent key is a no-op.
    ///
    /// # Errors
    /// Returns an error when persisting the updated namespace fails.
    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        let payload = self.encode(&entries)?;
        self.persist(&payload).await?;
        debug!(key, "removed entry");
        Ok(())
    }

    /// Remove every entry.
    ///
    /// # Errors
    /// Returns an error when persisting the empty namespace fails.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        entries.clear();
        let payload = self.encode(&entries)?;
        self.persist(&payload).await?;
        info!("cleared store");
        Ok(())
    }

    /// All stored keys.
    pub async fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.lock().await.keys().cloned().collect())
    }

    /// Visit every `(value, key)` pair, stopping early when `visit` breaks.
    pub async fn iterate<F>(&self, mut visit: F) -> Result<(), StoreError>
    where
        F: FnMut(&Value, &str) -> ControlFlow<()>,
    {
        let entries = self.entries.lock().await;
        for (key, value) in entries.iter() {
            if visit(value, key).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn encode(&self, entries: &BTreeMap<String, Value>) -> Result<Vec<u8>, StoreError> {
        let payload = serde_json::to_vec_pretty(entries)?;
        if let Some(limit) = self.quota {
            let used = payload.len() as u64;
            if used > limit {
                return Err(StoreError::QuotaExceeded { used, limit });
            }
        }
        Ok(payload)
    }

    async fn persist(&self, payload: &[u8]) -> Result<(), StoreError> {
        // Write to a sibling temp file first so a crash mid-write cannot
        // truncate the store.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, payload).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn restore(entries: &mut BTreeMap<String, Value>, key: &str, previous: Option<Value>) {
        match previous {
            Some(value) => entries.insert(key.to_owned(), value),
            None => entries.remove(key),
        };
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Ephemeral in-memory key-value store with the same surface as [`FileStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the value stored under `key`, or `None` when absent.
    pub async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    /// Store `value` under `key`, echoing back the stored value.
    pub async fn set(&self, key: &str, value: Value) -> Result<Value, StoreError> {
        self.entries.lock().await.insert(key.to_owned(), value.clone());
        Ok(value)
    }

    /// Remove the entry under `key`. Removing an absent key is a no-op.
    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    /// Remove every entry.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.entries.lock().await.clear();
        Ok(())
    }

    /// All stored keys.
    pub async fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.lock().await.keys().cloned().collect())
    }

    /// Visit every `(value, key)` pair, stopping early when `visit` breaks.
    pub async fn iterate<F>(&self, mut visit: F) -> Result<(), StoreError>
    where
        F: FnMut(&Value, &str) -> ControlFlow<()>,
    {
        let entries = self.entries.lock().await;
        for (key, value) in entries.iter() {
            if visit(value, key).is_break() {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_path(dir: &TempDir) -> PathBuf {
        dir.path().join("store.json")
    }

    #[tokio::test]
    async fn set_get_roundtrip_survives_reopen() {
        let dir = TempDir::new().expect("create temp dir");
        let config = StoreConfig::new(store_path(&dir));

        let store = FileStore::open(config.clone()).await.expect("open store");
        store
            .set("folder:fldr1", json!({"id": "fldr1", "name": "Work"}))
            .await
            .expect("set folder");
        drop(store);

        let reopened = FileStore::open(config).await.expect("reopen store");
        let value = reopened.get("folder:fldr1").await.expect("get folder");
        assert_eq!(value, Some(json!({"id": "fldr1", "name": "Work"})));
        assert_eq!(reopened.get("folder:fldr2").await.expect("get absent"), None);
    }

    #[tokio::test]
    async fn quota_exceeded_rolls_back_the_write() {
        let dir = TempDir::new().expect("create temp dir");
        let mut config = StoreConfig::new(store_path(&dir));
        config.quota_bytes = Some(64);

        let store = FileStore::open(config).await.expect("open store");
        store
            .set("small", json!("x"))
            .await
            .expect("write under quota");

        let big = json!("y".repeat(256));
        let err = store.set("big", big).await.expect_err("quota must trip");
        assert!(matches!(err, StoreError::QuotaExceeded { .. }));
        assert_eq!(store.get("big").await.expect("get big"), None);
        // Overwrites that trip the quota restore the previous value.
        let err = store
            .set("small", json!("z".repeat(256)))
            .await
            .expect_err("quota must trip");
        assert!(matches!(err, StoreError::QuotaExceeded { .. }));
        assert_eq!(store.get("small").await.expect("get small"), Some(json!("x")));
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let dir = TempDir::new().expect("create temp dir");
        let store = FileStore::open(StoreConfig::new(store_path(&dir)))
            .await
            .expect("open store");

        store.set("k", json!(1)).await.expect("set");
        store.remove("k").await.expect("first remove");
        store.remove("k").await.expect("second remove is a no-op");
        assert_eq!(store.get("k").await.expect("get"), None);
    }

    #[tokio::test]
    async fn iterate_stops_on_break() {
        let store = MemoryStore::new();
        for n in 0..5 {
            store
                .set(&format!("task:task{n}"), json!(n))
                .await
                .expect("set");
        }

        let mut seen = 0;
        store
            .iterate(|_, _| {
                seen += 1;
                if seen == 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .await
            .expect("iterate");
        assert_eq!(seen, 2);
    }

    #[tokio::test]
    async fn clear_and_keys() {
        let dir = TempDir::new().expect("create temp dir");
        let store = FileStore::open(StoreConfig::new(store_path(&dir)))
            .await
            .expect("open store");

        store.set("a", json!(1)).await.expect("set a");
        store.set("b", json!(2)).await.expect("set b");
        assert_eq!(store.keys().await.expect("keys"), vec!["a", "b"]);

        store.clear().await.expect("clear");
        assert!(store.keys().await.expect("keys").is_empty());
    }

    #[tokio::test]
    async fn open_without_create_if_missing_fails() {
        let dir = TempDir::new().expect("create temp dir");
        let mut config = StoreConfig::new(store_path(&dir));
        config.create_if_missing = false;

        let err = FileStore::open(config).await.expect_err("must fail");
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}

//! The key-value store contract consumed by the repository.

use serde_json::Value;
use std::ops::ControlFlow;
use std::sync::Arc;

use taskdeck_store_kv::{FileStore, MemoryStore, StoreError};

/// Asynchronous string-keyed storage with JSON values.
///
/// The flat namespace holds entity records under `"<type>:<id>"` keys and the
/// per-type id counters under `"<type>_id_counter"`. All operations may
/// suspend and may fail with a [`StoreError`]; `remove` on an absent key is a
/// no-op. Implementations whose reads can fail are expected to log the
/// failure and report the key as absent from `get` (and an empty set from
/// `keys`) instead of surfacing an error; writes always propagate.
#[allow(async_fn_in_trait)]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`, or `None` when absent.
    ///
    /// # Errors
    /// Returns a store-specific error when the lookup fails.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Store `value` under `key`, echoing back the stored value.
    ///
    /// # Errors
    /// Returns a store-specific error when persisting fails.
    async fn set(&self, key: &str, value: Value) -> Result<Value, StoreError>;

    /// Remove the entry under `key`.
    ///
    /// # Errors
    /// Returns a store-specific error when persisting the removal fails.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Remove every entry.
    ///
    /// # Errors
    /// Returns a store-specific error when persisting fails.
    async fn clear(&self) -> Result<(), StoreError>;

    /// All stored keys.
    ///
    /// # Errors
    /// Returns a store-specific error when listing fails.
    async fn keys(&self) -> Result<Vec<String>, StoreError>;

    /// Visit every `(value, key)` pair, stopping early when `visit` breaks.
    ///
    /// # Errors
    /// Returns a store-specific error when iteration fails.
    async fn iterate<F>(&self, visit: F) -> Result<(), StoreError>
    where
        F: FnMut(&Value, &str) -> ControlFlow<()> + Send;
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Self::get(self, key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<Value, StoreError> {
        Self::set(self, key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        Self::remove(self, key).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        Self::clear(self).await
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        Self::keys(self).await
    }

    async fn iterate<F>(&self, visit: F) -> Result<(), StoreError>
    where
        F: FnMut(&Value, &str) -> ControlFlow<()> + Send,
    {
        Self::iterate(self, visit).await
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Self::get(self, key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<Value, StoreError> {
        Self::set(self, key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        Self::remove(self, key).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        Self::clear(self).await
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        Self::keys(self).await
    }

    async fn iterate<F>(&self, visit: F) -> Result<(), StoreError>
    where
        F: FnMut(&Value, &str) -> ControlFlow<()> + Send,
    {
        Self::iterate(self, visit).await
    }
}

impl<S> KeyValueStore for &S
where
    S: KeyValueStore + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (*self).get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<Value, StoreError> {
        (*self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        (*self).remove(key).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        (*self).clear().await
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        (*self).keys().await
    }

    async fn iterate<F>(&self, visit: F) -> Result<(), StoreError>
    where
        F: FnMut(&Value, &str) -> ControlFlow<()> + Send,
    {
        (*self).iterate(visit).await
    }
}

impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore,
{
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<Value, StoreError> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        (**self).clear().await
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).keys().await
    }

    async fn iterate<F>(&self, visit: F) -> Result<(), StoreError>
    where
        F: FnMut(&Value, &str) -> ControlFlow<()> + Send,
    {
        (**self).iterate(visit).await
    }
}

//! In-memory token store for testing.

use larder_core::environment::{TokenFuture, TokenStore, TokenStoreError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// In-memory [`TokenStore`] with switchable read and write failures.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    values: Arc<Mutex<HashMap<String, String>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `value` under `key`.
    #[must_use]
    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.lock().insert(key.to_string(), value.to_string());
        store
    }

    /// Current value under `key` (for assertions).
    #[must_use]
    pub fn value(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// Make every subsequent read fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write (set and delete) fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_write(&self) -> Result<(), TokenStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(TokenStoreError::WriteFailed("injected write failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get<'a>(&'a self, key: &'a str) -> TokenFuture<'a, Option<String>> {
        Box::pin(async move {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(TokenStoreError::ReadFailed("injected read failure".to_string()));
            }
            Ok(self.value(key))
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> TokenFuture<'a, ()> {
        Box::pin(async move {
            self.check_write()?;
            self.lock().insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> TokenFuture<'a, ()> {
        Box::pin(async move {
            self.check_write()?;
            self.lock().remove(key);
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete() {
        let store = MemoryTokenStore::new();

        store.set("secure_token", "abc").await.unwrap();
        assert_eq!(store.get("secure_token").await.unwrap().as_deref(), Some("abc"));

        store.delete("secure_token").await.unwrap();
        store.delete("secure_token").await.unwrap();
        assert_eq!(store.get("secure_token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn injected_write_failure_leaves_value() {
        let store = MemoryTokenStore::with_value("secure_token", "old");
        store.fail_writes(true);

        assert!(store.set("secure_token", "new").await.is_err());
        assert_eq!(store.value("secure_token").as_deref(), Some("old"));
    }
}

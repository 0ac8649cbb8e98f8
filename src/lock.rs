//! Per-key generation locking.
//!
//! Two concurrent resolutions of the same not-yet-cached key may both see
//! "absent" and both generate. The overwrite is idempotent (identical inputs
//! produce identical bytes) but wastes work. A [`KeyLock`] closes that
//! window; the default [`NoLock`] accepts it.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

/// Held for the duration of one resolution's check-then-generate section.
pub struct KeyGuard {
    _guard: Option<OwnedMutexGuard<()>>,
}

#[async_trait]
pub trait KeyLock: Send + Sync {
    async fn acquire(&self, key: &str) -> KeyGuard;
}

/// No mutual exclusion; concurrent duplicate generation is tolerated.
pub struct NoLock;

#[async_trait]
impl KeyLock for NoLock {
    async fn acquire(&self, _key: &str) -> KeyGuard {
        KeyGuard { _guard: None }
    }
}

/// At-most-once generation per key within this process.
///
/// Entries are never evicted; the map is bounded by the number of distinct
/// keys resolved by the process.
#[derive(Default)]
pub struct ProcessLock {
    keys: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ProcessLock {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyLock for ProcessLock {
    async fn acquire(&self, key: &str) -> KeyGuard {
        let mutex = {
            let mut keys = self.keys.lock().unwrap();
            keys.entry(key.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        KeyGuard {
            _guard: Some(mutex.lock_owned().await),
        }
    }
}

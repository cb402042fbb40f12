//! Per-user serialization of ledger mutations.
//!
//! A mutation reads state (the old transaction, the current aggregate) and writes it
//! back. Two such sequences for the same user must never interleave or one delta is
//! lost. Each user gets its own async mutex; different users never wait on each other.
//!
//! Entries live only while some task holds or waits for them. The last guard released
//! for a user removes that user's entry, so the registry stays bounded by the number of
//! users with a mutation in flight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

type LockMap = HashMap<i64, Arc<AsyncMutex<()>>>;

/// Registry of per-user locks
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: Arc<Mutex<LockMap>>,
}

/// Guard held for the duration of one user's mutation
#[derive(Debug)]
pub struct UserGuard {
    user_id: i64,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<Mutex<LockMap>>,
}

impl UserLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other mutation holds `user_id`'s lock, then takes it.
    pub async fn acquire(&self, user_id: i64) -> UserGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(user_id).or_default())
        };
        trace!(user_id, "waiting for user lock");
        let guard = lock.lock_owned().await;

        UserGuard {
            user_id,
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of users whose lock is currently held or awaited.
    #[must_use]
    pub fn tracked_users(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Drop for UserGuard {
    fn drop(&mut self) {
        // Registry lock first, so no acquirer can clone the entry between the release
        // and the reference count check
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        drop(self.guard.take());

        let unused = locks
            .get(&self.user_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if unused {
            locks.remove(&self.user_id);
        }
    }
}

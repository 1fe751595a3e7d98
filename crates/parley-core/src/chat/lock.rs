//! Per-session serialization.
//!
//! Requests for the same session id run one at a time so that the
//! lookup/create/append sequence cannot interleave. Different ids never
//! contend. Entries are removed once the last holder releases them.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lock table keyed by session id.
#[derive(Debug, Default)]
pub struct SessionLocks {
    inner: DashMap<String, Arc<Mutex<()>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `session_id`.
    ///
    /// The returned guard exists before the wait starts, so a cancelled
    /// acquire still prunes its entry.
    pub async fn acquire(&self, session_id: &str) -> SessionGuard<'_> {
        let lock = self
            .inner
            .entry(session_id.to_string())
            .or_default()
            .clone();

        let mut session_guard = SessionGuard {
            locks: self,
            session_id: session_id.to_string(),
            guard: None,
        };
        session_guard.guard = Some(lock.lock_owned().await);
        session_guard
    }

    /// Number of session ids currently locked or awaited.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Exclusive access to one session id; released on drop.
pub struct SessionGuard<'a> {
    locks: &'a SessionLocks,
    session_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        // Release the mutex first so our Arc no longer counts as a holder.
        self.guard.take();
        self.locks
            .inner
            .remove_if(&self.session_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

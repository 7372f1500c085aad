//! The process-wide lock that serializes local-machine test phases.

use std::sync::{Arc, OnceLock};

use tokio::sync::{Mutex, MutexGuard};

/// One coarse lock shared by every local-machine instance.
///
/// Waiters are admitted in FIFO order. The acquire future is cancel safe:
/// dropping it while waiting leaves the lock untouched. The guard releases on
/// drop, including during a panic unwind, and the lock never poisons.
#[derive(Debug, Default)]
pub struct LocalLock {
    inner: Mutex<()>,
}

pub type LocalLockGuard<'a> = MutexGuard<'a, ()>;

impl LocalLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock shared by the whole process.
    ///
    /// Created on first call and never dropped.
    #[must_use]
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<LocalLock>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::new())))
    }

    pub async fn acquire(&self) -> LocalLockGuard<'_> {
        self.inner.lock().await
    }

    /// Non-blocking acquire; `None` while another instance holds the lock.
    #[must_use]
    pub fn try_acquire(&self) -> Option<LocalLockGuard<'_>> {
        self.inner.try_lock().ok()
    }

    /// Snapshot of whether the lock is currently held.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.inner.try_lock().is_err()
    }
}

use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// In-process write locks keyed by member. Any mutation that could place a
/// member on a shift holds that member's lock across its conflict check and
/// its commit.
#[derive(Clone)]
pub struct UserLocks {
    locks: Cache<Uuid, Arc<Mutex<()>>>,
}

/// Held locks; released on drop.
pub struct UserLockGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::with_idle_timeout(Duration::from_secs(600))
    }

    pub fn with_idle_timeout(idle: Duration) -> Self {
        Self {
            locks: Cache::builder().time_to_idle(idle).build(),
        }
    }

    /// Lock every listed member, always in ascending id order so two writers
    /// touching the same pair cannot deadlock.
    pub async fn acquire(&self, users: &[Uuid]) -> UserLockGuard {
        let mut ordered = users.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for user_id in ordered {
            let lock = self
                .locks
                .get_with(user_id, async { Arc::new(Mutex::new(())) })
                .await;
            guards.push(lock.lock_owned().await);
        }

        log::debug!("Acquired {} member lock(s)", guards.len());
        UserLockGuard { _guards: guards }
    }
}

impl Default for UserLocks {
    fn default() -> Self {
        Self::new()
    }
}

use crate::domain::cart::SessionId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = Arc<Mutex<HashMap<SessionId, Arc<AsyncMutex<()>>>>>;

/// One async mutex per session so commands on the same process queue up
/// instead of interleaving. Sessions never contend with each other.
///
/// A session's entry lives only while a command holds or waits for it.
#[derive(Default)]
pub(crate) struct SessionLocks {
    locks: LockMap,
}

/// Holds a session's lock; dropping it releases the lock and removes the
/// session's entry when no other command is queued on it.
pub(crate) struct SessionGuard {
    guard: Option<OwnedMutexGuard<()>>,
    session: SessionId,
    locks: LockMap,
}

impl SessionLocks {
    /// Waits until no other command runs for `session`.
    pub(crate) async fn acquire(&self, session: &SessionId) -> SessionGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(session.clone()).or_default().clone()
        };
        SessionGuard {
            guard: Some(lock.lock_owned().await),
            session: session.clone(),
            locks: self.locks.clone(),
        }
    }

    /// Number of sessions currently holding or waiting for a lock.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        // clones are only taken under the map lock, so the count is stable here
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&self.session)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.session);
        }
    }
}

//! Per-event async locks
//!
//! Multi-step booking operations (claim + save, sell + record + complete)
//! for one event run one at a time in this process. Different events never
//! contend.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct EventLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl EventLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `event_id`. Released on drop.
    pub async fn lock(&self, event_id: &str) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(event_id.to_string())
            .or_default()
            .value()
            .clone();
        mutex.lock_owned().await
    }

    /// Forget locks nobody holds or waits on. Returns how many went.
    ///
    /// A mutex whose only reference is the map's own cannot have a holder
    /// or a waiter; the next `lock` for that event creates a fresh one.
    pub fn prune(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
        before.saturating_sub(self.locks.len())
    }

    /// Number of events with a live lock entry
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_event_is_exclusive() {
        let locks = Arc::new(EventLocks::new());
        let guard = locks.lock("EV-1").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.lock("EV-1").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn different_events_do_not_block() {
        let locks = EventLocks::new();
        let _a = locks.lock("EV-1").await;
        let _b = tokio::time::timeout(Duration::from_millis(100), locks.lock("EV-2"))
            .await
            .expect("EV-2 should not wait for EV-1");
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn prune_drops_only_idle_locks() {
        let locks = EventLocks::new();
        for i in 0..5 {
            drop(locks.lock(&format!("EV-{i}")).await);
        }
        let held = locks.lock("EV-held").await;
        assert_eq!(locks.len(), 6);

        assert_eq!(locks.prune(), 5);
        assert_eq!(locks.len(), 1);

        // The held lock is still exclusive after pruning
        let waiter = tokio::time::timeout(Duration::from_millis(20), locks.lock("EV-held")).await;
        assert!(waiter.is_err());
        drop(held);
        assert_eq!(locks.prune(), 1);
        assert!(locks.is_empty());
    }
}

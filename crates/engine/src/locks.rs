//! Per-deck reader/writer locks.
//!
//! Every operation on a deck holds that deck's lock for its whole duration,
//! transaction included: exclusive for mutations, shared for reads. Decks
//! never contend with each other. Entries are created on first use and
//! dropped again once no guard holds or awaits them, so the registry only
//! ever contains decks with work in flight.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

type Registry = DashMap<String, Arc<RwLock<()>>>;

/// Registry of deck locks keyed by deck token. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct DeckLocks {
    registry: Arc<Registry>,
}

/// A held deck lock. Releasing it prunes the registry entry when idle.
pub struct DeckGuard<G> {
    guard: Option<G>,
    token: String,
    registry: Arc<Registry>,
}

pub type DeckReadGuard = DeckGuard<OwnedRwLockReadGuard<()>>;
pub type DeckWriteGuard = DeckGuard<OwnedRwLockWriteGuard<()>>;

impl DeckLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `token`.
    pub async fn write(&self, token: &str) -> DeckWriteGuard {
        let guard = self.lock_for(token).write_owned().await;
        self.wrap(token, guard)
    }

    /// Wait for shared access to `token`.
    pub async fn read(&self, token: &str) -> DeckReadGuard {
        let guard = self.lock_for(token).read_owned().await;
        self.wrap(token, guard)
    }

    /// Number of decks that currently have a guard held or pending.
    pub fn tracked(&self) -> usize {
        self.registry.len()
    }

    fn lock_for(&self, token: &str) -> Arc<RwLock<()>> {
        self.registry
            .entry(token.to_string())
            .or_default()
            .value()
            .clone()
    }

    fn wrap<G>(&self, token: &str, guard: G) -> DeckGuard<G> {
        DeckGuard {
            guard: Some(guard),
            token: token.to_string(),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<G> Drop for DeckGuard<G> {
    fn drop(&mut self) {
        // The guard owns an Arc to the lock; release it before counting.
        drop(self.guard.take());
        self.registry
            .remove_if(&self.token, |_, lock| Arc::strong_count(lock) == 1);
    }
}

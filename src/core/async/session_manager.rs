//! Thread-safe session management for async settlement
//!
//! The `AsyncSessionManager` keeps one `Arc<AsyncLedgerStore>` per session in
//! a `DashMap`. Handing out an `Arc` lets a task keep using a ledger (and wait
//! on its wallet lock) without holding a DashMap shard lock.

use std::sync::Arc;

use dashmap::DashMap;

use super::AsyncLedgerStore;
use crate::config::SessionConfig;
use crate::types::SessionId;

/// Thread-safe registry of session ledgers
#[derive(Debug)]
pub struct AsyncSessionManager {
    /// Map of session IDs to shared ledgers
    sessions: DashMap<SessionId, Arc<AsyncLedgerStore>>,
    config: SessionConfig,
}

impl AsyncSessionManager {
    /// Create a new AsyncSessionManager with no sessions
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get or open the ledger for the specified session
    ///
    /// Concurrent callers for the same new session all receive the same
    /// ledger.
    pub fn get_or_create(&self, session: SessionId) -> Arc<AsyncLedgerStore> {
        let entry = self
            .sessions
            .entry(session)
            .or_insert_with(|| Arc::new(AsyncLedgerStore::from_config(session, &self.config)));
        Arc::clone(entry.value())
    }

    pub fn get(&self, session: SessionId) -> Option<Arc<AsyncLedgerStore>> {
        self.sessions
            .get(&session)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Get all ledgers sorted by session ID
    pub fn get_all_sessions(&self) -> Vec<Arc<AsyncLedgerStore>> {
        let mut sessions: Vec<Arc<AsyncLedgerStore>> = self
            .sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        sessions.sort_by_key(|ledger| ledger.session());
        sessions
    }
}

impl Default for AsyncSessionManager {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_get_returns_none_for_unknown_session() {
        let manager = AsyncSessionManager::default();
        assert!(manager.get(1).is_none());
    }

    #[test]
    fn test_get_or_create_returns_same_ledger() {
        let manager = AsyncSessionManager::default();

        let first = manager.get_or_create(1);
        let second = manager.get_or_create(1);

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_get_all_sessions_sorted() {
        let manager = AsyncSessionManager::default();

        manager.get_or_create(3);
        manager.get_or_create(1);
        manager.get_or_create(2);

        let ids: Vec<SessionId> = manager
            .get_all_sessions()
            .iter()
            .map(|ledger| ledger.session())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_concurrent_get_or_create_same_session() {
        let manager = Arc::new(AsyncSessionManager::default());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = Arc::clone(&manager);
                thread::spawn(move || manager.get_or_create(7))
            })
            .collect();

        let ledgers: Vec<Arc<AsyncLedgerStore>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(ledgers.iter().all(|l| Arc::ptr_eq(l, &ledgers[0])));
        assert_eq!(manager.get_all_sessions().len(), 1);
    }
}

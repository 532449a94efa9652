//! Session management module
//!
//! This module provides the `SessionManager` struct which maintains one
//! `LedgerStore` per session.
//!
//! The SessionManager is responsible for:
//! - Opening a new session (wallet + invoices from config) on first use
//! - Handing out the ledger of an existing session
//! - Providing sorted session listings for output

use crate::config::SessionConfig;
use crate::core::ledger::LedgerStore;
use crate::types::SessionId;
use std::collections::HashMap;

/// Manages all sessions and their ledgers
///
/// Sessions are isolated: no balance or invoice is ever shared between two
/// ledgers.
#[derive(Debug)]
pub struct SessionManager {
    /// Map of session IDs to ledgers
    sessions: HashMap<SessionId, LedgerStore>,
    config: SessionConfig,
}

impl SessionManager {
    /// Create a new SessionManager with no sessions
    pub fn new(config: SessionConfig) -> Self {
        SessionManager {
            sessions: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get or open the ledger for the specified session
    ///
    /// A new session starts from the configured wallet and invoice set.
    pub fn get_or_create(&mut self, session: SessionId) -> &mut LedgerStore {
        let config = &self.config;
        self.sessions
            .entry(session)
            .or_insert_with(|| LedgerStore::from_config(session, config))
    }

    pub fn get(&self, session: SessionId) -> Option<&LedgerStore> {
        self.sessions.get(&session)
    }

    /// Get all ledgers sorted by session ID
    pub fn get_all_sessions(&self) -> Vec<&LedgerStore> {
        let mut sessions: Vec<&LedgerStore> = self.sessions.values().collect();
        sessions.sort_by_key(|ledger| ledger.session());
        sessions
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

//! Point-in-time view of a session, used for reporting

use super::invoice::Invoice;
use super::wallet::{SessionId, Wallet};
use serde::Serialize;

/// A session's wallet and invoices as of one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session: SessionId,
    pub wallet: Wallet,
    /// Invoices sorted by id
    pub invoices: Vec<Invoice>,
}

//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `wallet`: Wallet balances and session identifiers
//! - `invoice`: Invoices and their settlement status
//! - `command`: Scripted user commands
//! - `snapshot`: Point-in-time session views for reporting
//! - `error`: Error types for the ledger

pub mod command;
pub mod error;
pub mod invoice;
pub mod snapshot;
pub mod wallet;

pub use command::{CommandRecord, CommandType};
pub use error::StableflowError;
pub use invoice::{default_invoices, Invoice, InvoiceId, InvoiceStatus};
pub use snapshot::SessionSnapshot;
pub use wallet::{SessionId, Wallet};

//! Asynchronous implementations of core components
//!
//! This module provides thread-safe, concurrent counterparts of the session
//! ledger and engine, with simulated settlement latency.
//!
//! # Architecture
//!
//! - **AsyncLedgerStore**: One session's wallet behind a tokio mutex, mutated through a `WalletGuard`
//! - **AsyncSessionManager**: Thread-safe registry of session ledgers
//! - **AsyncStablecoinEngine**: Validates, waits out confirmation, and commits settlements
//! - **BatchProcessor**: Runs script batches with one task per session
//! - **spawn_price_ticker**: Advances a shared price feed in the background
//!
//! # Thread Safety
//!
//! - Settlements on different sessions proceed in parallel
//! - Settlements on the same wallet are serialized by its lock
//! - Committed session states are published whole on a watch channel per session

pub mod batch_processor;
pub mod engine;
pub mod ledger;
pub mod price_ticker;
pub mod session_manager;

pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use engine::AsyncStablecoinEngine;
pub use ledger::{AsyncLedgerStore, WalletGuard};
pub use price_ticker::spawn_price_ticker;
pub use session_manager::AsyncSessionManager;

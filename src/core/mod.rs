//! Core business logic module
//!
//! This module contains the stablecoin ledger components:
//! - `traits` - Trait abstractions for interchangeable implementations
//! - `price_feed` - Fixed and random-walk reference prices
//! - `accounting` - Health factor evaluation and the minting rule
//! - `settlement` - Invoice payment validation and status transitions
//! - `ledger` - Per-session wallet and invoice state
//! - `session_manager` - Session registry
//! - `engine` - Synchronous mint/pay orchestration
//! - `async` - Concurrent implementations with simulated latency

pub mod accounting;
pub mod r#async;
pub mod engine;
pub mod ledger;
pub mod price_feed;
pub mod session_manager;
pub mod settlement;
pub mod traits;

pub use accounting::{evaluate_health, is_mint_allowed, HealthFactor, MIN_HEALTH_FACTOR_PERCENT};
pub use engine::StablecoinEngine;
pub use ledger::LedgerStore;
pub use price_feed::{FixedPriceFeed, RandomWalkFeed};
pub use r#async::{
    spawn_price_ticker, AsyncLedgerStore, AsyncSessionManager, AsyncStablecoinEngine,
};
pub use session_manager::SessionManager;
pub use traits::PriceFeed;

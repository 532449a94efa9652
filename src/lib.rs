//! StableFlow Library
//! # Overview
//!
//! A collateralized-debt-position (CDP) stablecoin ledger: lock collateral,
//! mint USDX against it at a reference price, and spend USDX on invoices.
//! Every session owns one isolated wallet and invoice set.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Wallet, Invoice, commands, errors)
//! - [`config`] - Session, price feed, and latency configuration
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::accounting`] - Health factor and the 150% minting rule
//!   - [`core::settlement`] - Invoice payment validation
//!   - [`core::ledger`] - Per-session wallet and invoice state
//!   - [`core::engine`] - Synchronous mint/pay orchestration
//!   - [`core::r#async`] - Concurrent engine with simulated confirmation latency
//! - [`io`] - Script reading and report writing
//! - [`strategy`] - Sync and async replay pipelines
//!
//! # Health Factor
//!
//! `health = collateral * price / debt * 100`, in percent. A mint is accepted
//! only when the projected position is at or above 150%. A position without
//! debt is neutral and cannot be minted against.
//!
//! # Wallet State
//!
//! Each wallet maintains:
//! - `connected` / `address`: set once by connect
//! - `collateral_balance`: unlocked collateral
//! - `stable_balance`: spendable USDX

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use config::{LatencyConfig, PriceConfig, PriceMode, SessionConfig};
pub use crate::core::{AsyncStablecoinEngine, HealthFactor, PriceFeed, StablecoinEngine};
pub use io::write_session_report;
pub use types::{
    CommandRecord, CommandType, Invoice, InvoiceId, InvoiceStatus, SessionId, SessionSnapshot,
    StableflowError, Wallet,
};

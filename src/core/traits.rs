//! Core traits shared by the synchronous and asynchronous engines
//!
//! The price feed is the one collaborator both engines consume without
//! knowing its implementation: a constant price for reproducible runs, or a
//! random walk standing in for an oracle.

use rust_decimal::Decimal;
use std::fmt::Debug;

/// Source of the collateral asset's reference price
///
/// Implementations must be shareable across tasks and must only ever
/// report a strictly positive price.
pub trait PriceFeed: Send + Sync + Debug {
    /// Current reference price
    fn price(&self) -> Decimal;

    /// Advance the feed by one step and return the new price
    ///
    /// Feeds that do not move simply report their current price.
    fn tick(&self) -> Decimal {
        self.price()
    }
}

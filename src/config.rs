//! Session configuration
//!
//! Starting balances, the price feed, and the simulated confirmation latency
//! for every session an engine creates. Values come from `Default` and are
//! overridden from CLI arguments; invalid overrides fall back to the default
//! with a warning.

use crate::core::price_feed::{FixedPriceFeed, RandomWalkFeed};
use crate::core::traits::PriceFeed;
use crate::types::{default_invoices, Invoice};
use clap::ValueEnum;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Address assigned to a wallet when it connects
pub const DEFAULT_WALLET_ADDRESS: &str = "0x71...9A2";

/// How the reference price evolves
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PriceMode {
    /// Constant price
    Fixed,
    /// Unbounded random walk, clamped to a floor
    RandomWalk,
}

/// Reference price feed configuration
#[derive(Clone, Debug, PartialEq)]
pub struct PriceConfig {
    pub mode: PriceMode,
    /// Starting price
    pub initial: Decimal,
    /// Width of one random-walk step; each step moves by at most half of it
    pub max_step: Decimal,
    /// Lowest price the random walk may reach
    pub floor: Decimal,
    /// How often the background ticker advances the walk
    pub tick_interval: Duration,
    /// Seed for a reproducible walk
    pub seed: Option<u64>,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            mode: PriceMode::RandomWalk,
            initial: Decimal::new(3000, 0),
            max_step: Decimal::new(10, 0),
            floor: Decimal::ONE,
            tick_interval: Duration::from_secs(3),
            seed: None,
        }
    }
}

impl PriceConfig {
    /// Create a PriceConfig with a custom mode, starting price and seed
    pub fn new(mode: PriceMode, initial: Decimal, seed: Option<u64>) -> Self {
        let default = Self::default();

        let initial = if initial <= Decimal::ZERO {
            warn!(
                initial = %initial,
                fallback = %default.initial,
                "invalid initial price, using default"
            );
            default.initial
        } else {
            initial
        };

        Self {
            mode,
            initial,
            seed,
            ..default
        }
    }

    /// A constant feed, mostly useful for reproducible runs
    pub fn fixed(price: Decimal) -> Self {
        Self::new(PriceMode::Fixed, price, None)
    }

    /// Build the price feed this configuration describes
    pub fn build_feed(&self) -> Arc<dyn PriceFeed> {
        match self.mode {
            PriceMode::Fixed => Arc::new(FixedPriceFeed::new(self.initial)),
            PriceMode::RandomWalk => Arc::new(RandomWalkFeed::new(
                self.initial,
                self.max_step,
                self.floor,
                self.seed,
            )),
        }
    }
}

/// Simulated confirmation latency for the async engine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LatencyConfig {
    pub mint: Duration,
    pub payment: Duration,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            mint: Duration::from_millis(2000),
            payment: Duration::from_millis(1500),
        }
    }
}

impl LatencyConfig {
    pub fn new(mint: Duration, payment: Duration) -> Self {
        Self { mint, payment }
    }

    /// Settle immediately
    pub fn instant() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }
}

/// Everything needed to open a new session
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub initial_collateral: Decimal,
    pub initial_stable: Decimal,
    pub wallet_address: String,
    pub invoices: Vec<Invoice>,
    pub price: PriceConfig,
    pub latency: LatencyConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_collateral: Decimal::new(25, 1),
            initial_stable: Decimal::ZERO,
            wallet_address: DEFAULT_WALLET_ADDRESS.to_string(),
            invoices: default_invoices(),
            price: PriceConfig::default(),
            latency: LatencyConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Override the starting collateral balance
    pub fn with_initial_collateral(mut self, collateral: Decimal) -> Self {
        if collateral < Decimal::ZERO {
            warn!(
                collateral = %collateral,
                fallback = %self.initial_collateral,
                "invalid initial collateral, using default"
            );
        } else {
            self.initial_collateral = collateral;
        }
        self
    }

    /// Override the starting stablecoin balance
    pub fn with_initial_stable(mut self, stable: Decimal) -> Self {
        if stable < Decimal::ZERO {
            warn!(
                stable = %stable,
                fallback = %self.initial_stable,
                "invalid initial stable balance, using default"
            );
        } else {
            self.initial_stable = stable;
        }
        self
    }

    pub fn with_price(mut self, price: PriceConfig) -> Self {
        self.price = price;
        self
    }

    pub fn with_latency(mut self, latency: LatencyConfig) -> Self {
        self.latency = latency;
        self
    }
}

use crate::config::{LatencyConfig, PriceConfig, PriceMode, SessionConfig};
use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for the session replay tool
#[derive(Parser, Debug)]
#[command(name = "stableflow")]
#[command(
    about = "Replay scripted stablecoin sessions: mint against collateral and pay invoices",
    long_about = None
)]
pub struct CliArgs {
    #[arg(value_name = "SCRIPT", help = "Path to the session script CSV")]
    pub script: PathBuf,

    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "sync",
        help = "Replay strategy: 'sync' applies rows immediately, 'async' settles sessions concurrently with latency"
    )]
    pub strategy: StrategyType,

    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of script rows per batch for async replay (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Worker threads for async replay (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    #[arg(
        long = "price-mode",
        value_name = "MODE",
        default_value = "random-walk",
        help = "Reference price behaviour: 'fixed' or 'random-walk'"
    )]
    pub price_mode: PriceMode,

    #[arg(
        long = "initial-price",
        value_name = "PRICE",
        help = "Starting reference price (default: 3000)"
    )]
    pub initial_price: Option<Decimal>,

    #[arg(
        long = "price-seed",
        value_name = "SEED",
        help = "Seed for a reproducible random walk"
    )]
    pub price_seed: Option<u64>,

    #[arg(
        long = "initial-collateral",
        value_name = "AMOUNT",
        help = "Collateral balance of every new wallet (default: 2.5)"
    )]
    pub initial_collateral: Option<Decimal>,

    #[arg(
        long = "mint-latency-ms",
        value_name = "MS",
        help = "Simulated mint confirmation delay for async replay (default: 2000)"
    )]
    pub mint_latency_ms: Option<u64>,

    #[arg(
        long = "payment-latency-ms",
        value_name = "MS",
        help = "Simulated payment confirmation delay for async replay (default: 1500)"
    )]
    pub payment_latency_ms: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Build the session config from defaults and the provided overrides
    pub fn to_session_config(&self) -> SessionConfig {
        let defaults = SessionConfig::default();

        let price = PriceConfig::new(
            self.price_mode,
            self.initial_price.unwrap_or(defaults.price.initial),
            self.price_seed,
        );

        let latency = LatencyConfig::new(
            self.mint_latency_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.latency.mint),
            self.payment_latency_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.latency.payment),
        );

        let config = defaults.with_price(price).with_latency(latency);
        match self.initial_collateral {
            Some(collateral) => config.with_initial_collateral(collateral),
            None => config,
        }
    }

    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }
}

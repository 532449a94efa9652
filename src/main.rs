//! StableFlow CLI
//!
//! Replays scripted stablecoin sessions from a CSV file.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- session.csv > report.csv
//! cargo run -- --price-mode fixed --initial-price 3000 session.csv
//! cargo run -- --strategy async --mint-latency-ms 0 --payment-latency-ms 0 session.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 session.csv
//! ```
//!
//! The report (wallet table, blank line, invoice table) goes to stdout; logs go
//! to stderr and are filtered with `RUST_LOG` (default `info`).
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, script not found or not readable, etc.)

use stableflow::cli;
use stableflow::strategy;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();

    let args = cli::parse_args();

    let strategy = {
        let batch = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy, args.to_session_config(), batch)
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.replay(&args.script, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

//! Asynchronous batch replay strategy
//!
//! This module provides a multi-threaded implementation of the ReplayStrategy
//! trait. Script rows are read in batches and each batch is partitioned by
//! session, so independent sessions settle concurrently with their simulated
//! confirmation latency overlapping.
//!
//! # Architecture
//!
//! ```text
//! AsyncReplayStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── BatchProcessor (session partitioning + tasks)
//!     ├── price ticker (random-walk feeds only)
//!     └── AsyncStablecoinEngine (thread-safe settlement)
//!         └── AsyncSessionManager (ledger per session)
//! ```
//!
//! # Ordering
//!
//! Batches are processed one after another, and within a batch each session's
//! rows run in file order. A session's commands are therefore applied in file
//! order even when they span several batches.

use crate::config::{PriceMode, SessionConfig};
use crate::core::r#async::{
    spawn_price_ticker, AsyncSessionManager, AsyncStablecoinEngine, BatchProcessor,
};
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::write_session_report;
use crate::io::sync_reader::open_script;
use crate::strategy::ReplayStrategy;
use crate::types::StableflowError;
use futures::io::AsyncRead;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio_util::compat::TokioAsyncReadCompatExt;
use tracing::{debug, warn};

/// Batch processing parameters for the async replay
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of script rows read per batch
    pub batch_size: usize,

    /// Number of runtime worker threads
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a BatchConfig, replacing zero values with the defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                fallback = default.batch_size,
                "invalid batch_size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                max_concurrent_batches,
                fallback = default.max_concurrent_batches,
                "invalid max_concurrent_batches, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch replay strategy
#[derive(Debug, Clone)]
pub struct AsyncReplayStrategy {
    config: SessionConfig,
    batch: BatchConfig,
}

impl AsyncReplayStrategy {
    pub fn new(config: SessionConfig, batch: BatchConfig) -> Self {
        Self { config, batch }
    }

    /// Feed batches to the processor until the script is exhausted
    async fn replay_batches<R>(
        &self,
        reader: &mut AsyncReader<R>,
        processor: &BatchProcessor,
    ) -> Result<(), StableflowError>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        loop {
            let batch = reader.read_batch(self.batch.batch_size).await?;
            if batch.is_empty() {
                return Ok(());
            }

            let results = processor.process_batch(batch).await;
            let rejected = results.iter().filter(|r| r.result.is_err()).count();
            debug!(processed = results.len(), rejected, "batch complete");
        }
    }
}

impl ReplayStrategy for AsyncReplayStrategy {
    fn replay(&self, script_path: &Path, output: &mut dyn Write) -> Result<(), StableflowError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.batch.max_concurrent_batches)
            .enable_time()
            .build()?;

        runtime.block_on(async {
            let sessions = Arc::new(AsyncSessionManager::new(self.config.clone()));
            let feed = self.config.price.build_feed();
            let engine = Arc::new(AsyncStablecoinEngine::new(sessions, Arc::clone(&feed)));
            let processor = BatchProcessor::new(Arc::clone(&engine));

            let file = tokio::fs::File::from_std(open_script(script_path)?);
            let mut reader = AsyncReader::new(file.compat());

            let ticker = match self.config.price.mode {
                PriceMode::RandomWalk => {
                    Some(spawn_price_ticker(feed, self.config.price.tick_interval))
                }
                PriceMode::Fixed => None,
            };

            let replayed = self.replay_batches(&mut reader, &processor).await;

            if let Some(ticker) = ticker {
                ticker.abort();
            }

            replayed?;
            write_session_report(&engine.snapshots(), output)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LatencyConfig, PriceConfig};
    use rstest::rstest;
    use rust_decimal::Decimal;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn instant_config() -> SessionConfig {
        SessionConfig::default()
            .with_price(PriceConfig::fixed(Decimal::new(3000, 0)))
            .with_latency(LatencyConfig::instant())
    }

    #[rstest]
    #[case::zero_batch_size(0, 4, 1000, 4)]
    #[case::valid(10, 2, 10, 2)]
    fn test_batch_config_new(
        #[case] batch_size: usize,
        #[case] workers: usize,
        #[case] expected_batch: usize,
        #[case] expected_workers: usize,
    ) {
        let config = BatchConfig::new(batch_size, workers);
        assert_eq!(config.batch_size, expected_batch);
        assert_eq!(config.max_concurrent_batches, expected_workers);
    }

    #[test]
    fn test_batch_config_zero_workers_uses_cpu_count() {
        let config = BatchConfig::new(10, 0);
        assert_eq!(config.max_concurrent_batches, num_cpus::get());
    }

    #[test]
    fn test_async_replay_sessions_across_batches() {
        let file = create_temp_csv(
            "op,session,collateral,debt,price,invoice\n\
             connect,1,,,,\n\
             connect,2,,,,\n\
             mint,1,0.1,100,,\n\
             mint,2,0.5,1000,3000,\n\
             pay,1,,,,101\n\
             pay,2,,,,102\n\
             pay,2,,,,102\n",
        );
        // Batches of two split every session across batches
        let strategy = AsyncReplayStrategy::new(instant_config(), BatchConfig::new(2, 2));
        let mut output = Vec::new();

        strategy.replay(file.path(), &mut output).unwrap();

        let report = String::from_utf8(output).unwrap();
        assert!(report.contains("1,true,0x71...9A2,2.4000,97.0000\n"));
        assert!(report.contains("2,true,0x71...9A2,2.0000,992.5000\n"));
        assert!(report.contains("2,102,Discord Nitro Gift,7.50,paid\n"));
    }

    #[test]
    fn test_async_replay_unreadable_script_is_fatal() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let strategy = AsyncReplayStrategy::new(instant_config(), BatchConfig::default());
        let mut output = Vec::new();

        let result = strategy.replay(dir.path(), &mut output);

        assert!(matches!(result, Err(StableflowError::IoError { .. })));
        assert!(output.is_empty());
    }

    #[test]
    fn test_async_replay_missing_file() {
        let strategy = AsyncReplayStrategy::new(instant_config(), BatchConfig::default());
        let mut output = Vec::new();

        let result = strategy.replay(Path::new("missing.csv"), &mut output);

        assert!(matches!(result, Err(StableflowError::FileNotFound { .. })));
    }
}

//! Replay strategy module for scripted sessions
//!
//! This module defines the Strategy pattern for complete replay pipelines,
//! encompassing script parsing, settlement through an engine, and the final
//! report. This allows the synchronous and asynchronous engines to be selected
//! at runtime.

use crate::cli::StrategyType;
use crate::config::SessionConfig;
use crate::types::StableflowError;
use std::io::Write;
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncReplayStrategy, BatchConfig};
pub use sync::SyncReplayStrategy;

/// Replay strategy trait for complete script pipelines
pub trait ReplayStrategy: Send + Sync {
    /// Replay a session script and write the session report to `output`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The script cannot be opened (file not found, permission denied)
    /// - The tokio runtime cannot be created (async only)
    /// - The report cannot be written
    ///
    /// Malformed rows and rejected commands are logged and skipped; they never
    /// cause this method to fail.
    fn replay(&self, script_path: &Path, output: &mut dyn Write) -> Result<(), StableflowError>;
}

/// Create a replay strategy based on the specified strategy type
///
/// `batch` configures the async replay and is ignored for sync.
pub fn create_strategy(
    strategy_type: StrategyType,
    config: SessionConfig,
    batch: Option<BatchConfig>,
) -> Box<dyn ReplayStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncReplayStrategy::new(config)),
        StrategyType::Async => {
            let batch = batch.unwrap_or_default();
            Box::new(AsyncReplayStrategy::new(config, batch))
        }
    }
}

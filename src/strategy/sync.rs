//! Synchronous replay strategy
//!
//! Single-threaded replay: rows are read one at a time by `SyncReader` and
//! applied in file order by `StablecoinEngine`. There is no confirmation
//! latency. A random-walk feed advances one step after every row, so the
//! price a script sees depends only on its seed and row count.

use crate::config::{PriceMode, SessionConfig};
use crate::core::StablecoinEngine;
use crate::io::csv_format::write_session_report;
use crate::io::sync_reader::SyncReader;
use crate::strategy::ReplayStrategy;
use crate::types::StableflowError;
use std::io::Write;
use std::path::Path;
use tracing::{error, warn};

/// Synchronous replay strategy
///
/// # Examples
///
/// ```no_run
/// use stableflow::config::SessionConfig;
/// use stableflow::strategy::{ReplayStrategy, SyncReplayStrategy};
/// use std::path::Path;
/// use std::io;
///
/// let strategy = SyncReplayStrategy::new(SessionConfig::default());
/// let mut output = io::stdout();
///
/// strategy.replay(Path::new("session.csv"), &mut output)
///     .expect("Replay failed");
/// ```
#[derive(Debug, Clone)]
pub struct SyncReplayStrategy {
    config: SessionConfig,
}

impl SyncReplayStrategy {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

impl ReplayStrategy for SyncReplayStrategy {
    fn replay(&self, script_path: &Path, output: &mut dyn Write) -> Result<(), StableflowError> {
        let reader = SyncReader::new(script_path)?;
        let mut engine = StablecoinEngine::new(self.config.clone());
        let walking = self.config.price.mode == PriceMode::RandomWalk;

        for row in reader {
            match row {
                Ok(command) => {
                    let (session, op) = (command.session, command.op);
                    match engine.process(command) {
                        Ok(()) => {}
                        Err(e) if e.is_rejection() => {
                            warn!(session, op = ?op, error = %e, "command rejected")
                        }
                        Err(e) => error!(session, op = ?op, error = %e, "command failed"),
                    }
                }
                Err(e @ StableflowError::IoError { .. }) => return Err(e),
                Err(e) => warn!(error = %e, "skipping script row"),
            }

            if walking {
                engine.tick_price();
            }
        }

        write_session_report(&engine.snapshots(), output)
    }
}

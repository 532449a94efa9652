//! Batch processing with session-based partitioning for async replay
//!
//! This module provides the `BatchProcessor` struct, which runs a batch of
//! script commands concurrently across sessions while keeping each session's
//! commands in their original order.
//!
//! # Design
//!
//! A batch is partitioned by session ID. Each partition runs in its own tokio
//! task and awaits its commands one after another, so a session's mint has
//! committed before its next payment is validated. Partitions for different
//! sessions overlap, including their confirmation delays.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     └── Arc<AsyncStablecoinEngine>  (shared settlement engine)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, warn};

use super::AsyncStablecoinEngine;
use crate::types::{CommandRecord, SessionId, StableflowError};

/// Result of processing a single command
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The command that was processed
    pub record: CommandRecord,

    /// The result of processing (success or rejection)
    pub result: Result<(), StableflowError>,
}

/// Batch processor with session-based partitioning
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    /// Settlement engine shared by all partition tasks
    engine: Arc<AsyncStablecoinEngine>,
}

impl BatchProcessor {
    pub fn new(engine: Arc<AsyncStablecoinEngine>) -> Self {
        Self { engine }
    }

    /// Partition a batch of commands by session ID
    ///
    /// # Guarantees
    ///
    /// - Each command appears in exactly one sub-batch
    /// - Commands for each session keep their original order
    pub fn partition_by_session(
        &self,
        batch: Vec<CommandRecord>,
    ) -> HashMap<SessionId, Vec<CommandRecord>> {
        let mut session_batches: HashMap<SessionId, Vec<CommandRecord>> = HashMap::new();

        for record in batch {
            session_batches
                .entry(record.session)
                .or_default()
                .push(record);
        }

        session_batches
    }

    /// Process all commands for a single session sequentially
    ///
    /// A failed command is logged (business rejections at warn, anything else
    /// at error) and does not stop the rest. Results are in input order.
    pub async fn process_session_commands(
        &self,
        commands: Vec<CommandRecord>,
    ) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(commands.len());

        for record in commands {
            let result = self.engine.process_command(record.clone()).await;
            match &result {
                Ok(()) => {}
                Err(e) if e.is_rejection() => {
                    warn!(session = record.session, op = ?record.op, error = %e, "command rejected")
                }
                Err(e) => {
                    error!(session = record.session, op = ?record.op, error = %e, "command failed")
                }
            }
            results.push(ProcessingResult { record, result });
        }

        results
    }

    /// Process a batch of commands with session-based partitioning
    ///
    /// Spawns one task per session and waits for all of them. Results are
    /// grouped by session; the order between sessions is unspecified.
    pub async fn process_batch(&self, batch: Vec<CommandRecord>) -> Vec<ProcessingResult> {
        let session_batches = self.partition_by_session(batch);

        let mut tasks = Vec::with_capacity(session_batches.len());
        for (_session, commands) in session_batches {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_session_commands(commands).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(session_results) => results.extend(session_results),
                Err(e) => {
                    error!(error = %e, "session task failed");
                }
            }
        }

        results
    }
}

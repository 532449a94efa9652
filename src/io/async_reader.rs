//! Asynchronous CSV reader with batch interface
//!
//! Provides batch reading of script commands for the async replay.
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of CommandRecords
//!                  ↓
//!           csv_format module
//!           (ScriptRecord, convert_script_record)
//! ```

use crate::io::csv_format::{convert_script_record, ScriptRecord};
use crate::types::{CommandRecord, StableflowError};
use csv_async::{AsyncReaderBuilder, ErrorKind};
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous CSV reader
///
/// Invalid rows are logged and skipped, so every batch contains only
/// well-formed commands. A failure of the underlying reader ends the replay.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: u64,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 0,
        }
    }

    /// Read up to `batch_size` well-formed commands
    ///
    /// Returns an empty vector once the end of the input is reached.
    ///
    /// # Errors
    ///
    /// `IoError` if reading the input fails.
    pub async fn read_batch(
        &mut self,
        batch_size: usize,
    ) -> Result<Vec<CommandRecord>, StableflowError> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<ScriptRecord>();

        while batch.len() < batch_size {
            let row = match records.next().await {
                Some(row) => row,
                None => break,
            };
            self.line_num += 1;
            let line = self.line_num + 1;

            match row {
                Ok(record) => match convert_script_record(record, Some(line)) {
                    Ok(command) => batch.push(command),
                    Err(e) => warn!(line, error = %e, "skipping script row"),
                },
                Err(e) if matches!(e.kind(), ErrorKind::Io(_)) => {
                    return Err(StableflowError::IoError {
                        message: format!("Failed to read script at line {}: {}", line, e),
                    });
                }
                Err(e) => warn!(line, error = %e, "skipping unreadable script row"),
            }
        }

        Ok(batch)
    }
}

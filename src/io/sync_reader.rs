//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over script commands from a CSV file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding
//! `Result<CommandRecord, StableflowError>` for each CSV row:
//!
//! ```no_run
//! use stableflow::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("session.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(command) => println!("Replaying: {:?}", command),
//!         Err(e) => eprintln!("Skipped row: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Failing to open or read the header is returned from `new()`
//! - A read failure mid-stream is yielded once as `IoError`; callers treat it as fatal
//! - Individual row errors are yielded as Err variants carrying the line number

use crate::io::csv_format::{convert_script_record, ScriptRecord};
use crate::types::{CommandRecord, StableflowError};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

/// Open a script file, mapping a missing file to `FileNotFound`
pub(crate) fn open_script(path: &Path) -> Result<File, StableflowError> {
    File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => StableflowError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => StableflowError::IoError {
            message: format!("Failed to open file '{}': {}", path.display(), e),
        },
    })
}

/// Synchronous CSV reader
///
/// Streams one row at a time; memory use does not grow with the file.
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: u64,
}

impl SyncReader {
    /// Create a new SyncReader from a file path
    ///
    /// The CSV reader trims whitespace from all fields, allows rows with
    /// trailing columns omitted, and uses an 8KB buffer.
    pub fn new(path: &Path) -> Result<Self, StableflowError> {
        let file = open_script(path)?;

        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        if let Err(e) = reader.headers() {
            if e.is_io_error() {
                return Err(StableflowError::IoError {
                    message: format!("Failed to read '{}': {}", path.display(), e),
                });
            }
        }

        Ok(Self {
            reader,
            line_num: 0,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<CommandRecord, StableflowError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<ScriptRecord>();
        let row = deserializer.next()?;

        self.line_num += 1;
        // Header occupies line 1
        let line = Some(self.line_num + 1);

        Some(match row {
            Ok(record) => convert_script_record(record, line),
            // csv ends the stream after an I/O error
            Err(e) if e.is_io_error() => Err(StableflowError::IoError {
                message: format!("Failed to read script at line {}: {}", self.line_num + 1, e),
            }),
            Err(e) => Err(StableflowError::ParseError {
                line,
                message: e.to_string(),
            }),
        })
    }
}

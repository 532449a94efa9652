//! I/O module
//!
//! Handles script parsing and report output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (script row conversion, report serialization)
//! - `sync_reader` - Synchronous script reader with iterator interface
//! - `async_reader` - Asynchronous script reader with batch reading interface

pub mod async_reader;
pub mod csv_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{convert_script_record, write_session_report, ScriptRecord};
pub use sync_reader::SyncReader;

//! Error types for the StableFlow ledger
//!
//! This module defines all error types that can occur while minting, settling
//! invoices, or replaying a session script.
//!
//! # Error Categories
//!
//! - **Business Rejections**: Not connected, undercollateralized, insufficient balances,
//!   unknown or already-paid invoices
//! - **Input Errors**: Negative amounts, non-positive prices
//! - **Arithmetic Errors**: Overflow, underflow in balance calculations
//! - **Script I/O Errors**: File not found, malformed rows, unknown commands
//!
//! Every business rejection is recoverable: the ledger is left untouched and the
//! caller may resubmit after correcting its inputs.

use crate::types::{InvoiceId, SessionId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the ledger core and the replay tooling
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StableflowError {
    /// The session's wallet has not been connected yet
    #[error("Wallet for session {session} is not connected")]
    NotConnected {
        /// Session whose wallet is disconnected
        session: SessionId,
    },

    /// Mint refused because the projected position is below the minimum health factor
    ///
    /// `health_factor` is `None` when no debt was requested (neutral position).
    #[error(
        "Undercollateralized request: health factor {} is below the minimum of {threshold}%",
        health_factor.map(|h| format!("{}%", h.round_dp(2))).unwrap_or_else(|| "n/a".to_string())
    )]
    UndercollateralizedRequest {
        /// Computed health factor in percent
        health_factor: Option<Decimal>,
        /// Minimum health factor in percent
        threshold: Decimal,
    },

    /// Requested collateral lock exceeds the wallet's collateral balance
    #[error("Insufficient collateral: available {available}, requested {requested}")]
    InsufficientCollateral {
        /// Collateral balance at the time of the request
        available: Decimal,
        /// Collateral the mint tried to lock
        requested: Decimal,
    },

    /// Requested payment exceeds the wallet's stablecoin balance
    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Stablecoin balance at the time of the request
        available: Decimal,
        /// Amount the payment needed
        requested: Decimal,
    },

    /// No invoice with this id exists in the session
    #[error("Invoice {invoice} not found")]
    InvoiceNotFound {
        /// Invoice id that was not found
        invoice: InvoiceId,
    },

    /// The invoice has already been settled
    #[error("Invoice {invoice} is already paid")]
    InvoiceAlreadyPaid {
        /// Invoice id that is already paid
        invoice: InvoiceId,
    },

    /// A negative (or otherwise unusable) amount was supplied
    #[error("Invalid {field} amount '{amount}'")]
    InvalidAmount {
        /// Which input carried the amount
        field: String,
        /// The rejected amount
        amount: Decimal,
    },

    /// A reference price that is zero or negative
    #[error("Invalid reference price '{price}': price must be positive")]
    InvalidPrice {
        /// The rejected price
        price: Decimal,
    },

    /// Arithmetic overflow would occur
    #[error("Arithmetic overflow in {operation}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
    },

    /// Arithmetic underflow would occur
    #[error("Arithmetic underflow in {operation}")]
    ArithmeticUnderflow {
        /// Operation that would underflow
        operation: String,
    },

    /// Script file not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading a script or writing the report
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// A command is missing a field it requires
    #[error("{command} command for session {session} requires {field}")]
    MissingField {
        /// Command that requires the field
        command: String,
        /// Name of the missing field
        field: String,
        /// Session the command targeted
        session: SessionId,
    },

    /// A script row that does not describe a valid command
    #[error("Invalid command '{command}'{}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    InvalidCommand {
        /// The rejected command text
        command: String,
        /// Line number (if available)
        line: Option<u64>,
    },
}

impl From<std::io::Error> for StableflowError {
    fn from(error: std::io::Error) -> Self {
        StableflowError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for StableflowError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        StableflowError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl StableflowError {
    /// Create a NotConnected error
    pub fn not_connected(session: SessionId) -> Self {
        StableflowError::NotConnected { session }
    }

    /// Create an UndercollateralizedRequest error
    pub fn undercollateralized(health_factor: Option<Decimal>, threshold: Decimal) -> Self {
        StableflowError::UndercollateralizedRequest {
            health_factor,
            threshold,
        }
    }

    /// Create an InsufficientCollateral error
    pub fn insufficient_collateral(available: Decimal, requested: Decimal) -> Self {
        StableflowError::InsufficientCollateral {
            available,
            requested,
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(available: Decimal, requested: Decimal) -> Self {
        StableflowError::InsufficientFunds {
            available,
            requested,
        }
    }

    /// Create an InvoiceNotFound error
    pub fn invoice_not_found(invoice: InvoiceId) -> Self {
        StableflowError::InvoiceNotFound { invoice }
    }

    /// Create an InvoiceAlreadyPaid error
    pub fn invoice_already_paid(invoice: InvoiceId) -> Self {
        StableflowError::InvoiceAlreadyPaid { invoice }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(field: &str, amount: Decimal) -> Self {
        StableflowError::InvalidAmount {
            field: field.to_string(),
            amount,
        }
    }

    /// Create an InvalidPrice error
    pub fn invalid_price(price: Decimal) -> Self {
        StableflowError::InvalidPrice { price }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str) -> Self {
        StableflowError::ArithmeticOverflow {
            operation: operation.to_string(),
        }
    }

    /// Create an ArithmeticUnderflow error
    pub fn arithmetic_underflow(operation: &str) -> Self {
        StableflowError::ArithmeticUnderflow {
            operation: operation.to_string(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(command: &str, field: &str, session: SessionId) -> Self {
        StableflowError::MissingField {
            command: command.to_string(),
            field: field.to_string(),
            session,
        }
    }

    /// Create an InvalidCommand error
    pub fn invalid_command(command: &str, line: Option<u64>) -> Self {
        StableflowError::InvalidCommand {
            command: command.to_string(),
            line,
        }
    }

    /// Whether this error is a business rejection the caller may correct and resubmit
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            StableflowError::NotConnected { .. }
                | StableflowError::UndercollateralizedRequest { .. }
                | StableflowError::InsufficientCollateral { .. }
                | StableflowError::InsufficientFunds { .. }
                | StableflowError::InvoiceNotFound { .. }
                | StableflowError::InvoiceAlreadyPaid { .. }
        )
    }
}

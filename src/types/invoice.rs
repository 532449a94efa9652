//! Invoice-related types for the StableFlow ledger
//!
//! This module defines invoices, their settlement status, and the
//! starter set every new session is seeded with.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Invoice identifier
pub type InvoiceId = u32;

/// Settlement status of an invoice
///
/// The only transition is `Pending -> Paid`; `Paid` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Awaiting payment
    Pending,

    /// Settled; can never be paid again or reopened
    Paid,
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvoiceStatus::Pending => write!(f, "pending"),
            InvoiceStatus::Paid => write!(f, "paid"),
        }
    }
}

/// A mock invoice payable in stablecoin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invoice {
    /// Unique invoice id within a session
    pub id: InvoiceId,

    /// Human-readable description
    pub title: String,

    /// Amount due in stablecoin (always positive)
    pub amount: Decimal,

    /// Current settlement status
    pub status: InvoiceStatus,
}

impl Invoice {
    /// Create a pending invoice
    pub fn new(id: InvoiceId, title: &str, amount: Decimal) -> Self {
        Invoice {
            id,
            title: title.to_string(),
            amount,
            status: InvoiceStatus::Pending,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }
}

/// Invoices every new session starts with
pub fn default_invoices() -> Vec<Invoice> {
    vec![
        Invoice::new(101, "Coffee Subscription", Decimal::new(300, 2)),
        Invoice::new(102, "Discord Nitro Gift", Decimal::new(750, 2)),
        Invoice::new(103, "Server Hosting (Hr)", Decimal::new(85, 2)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_invoices_are_pending_micro_payments() {
        let invoices = default_invoices();

        assert_eq!(invoices.len(), 3);
        assert!(invoices.iter().all(|inv| inv.status == InvoiceStatus::Pending));
        assert!(invoices.iter().all(|inv| inv.amount > Decimal::ZERO));
        assert_eq!(invoices[0].id, 101);
        assert_eq!(invoices[0].amount, Decimal::new(3, 0));
    }

    #[test]
    fn test_status_display_is_lowercase() {
        assert_eq!(InvoiceStatus::Pending.to_string(), "pending");
        assert_eq!(InvoiceStatus::Paid.to_string(), "paid");
    }
}

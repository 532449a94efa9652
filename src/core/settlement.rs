//! Invoice settlement state machine
//!
//! ```text
//!   pending ──pay──▶ paid (terminal)
//! ```
//!
//! Settlement validates its preconditions against a wallet snapshot and the
//! target invoice before anything is debited. The ledger then applies the
//! debit and the status transition together.

use crate::types::{Invoice, InvoiceId, InvoiceStatus, SessionId, StableflowError, Wallet};
use rust_decimal::Decimal;

/// Check whether `invoice_id` can be paid from `wallet`
///
/// Preconditions are checked in order: wallet connected, invoice exists,
/// invoice pending, enough stablecoin. Returns the amount to debit.
pub fn check_payment(
    wallet: &Wallet,
    session: SessionId,
    invoice_id: InvoiceId,
    invoice: Option<&Invoice>,
) -> Result<Decimal, StableflowError> {
    if !wallet.connected {
        return Err(StableflowError::not_connected(session));
    }

    let invoice = invoice.ok_or_else(|| StableflowError::invoice_not_found(invoice_id))?;

    if invoice.is_paid() {
        return Err(StableflowError::invoice_already_paid(invoice_id));
    }

    if wallet.stable_balance < invoice.amount {
        return Err(StableflowError::insufficient_funds(
            wallet.stable_balance,
            invoice.amount,
        ));
    }

    Ok(invoice.amount)
}

/// Transition an invoice from pending to paid
///
/// Paid is terminal: a second transition fails with `InvoiceAlreadyPaid`.
pub fn mark_paid(invoice: &mut Invoice) -> Result<(), StableflowError> {
    match invoice.status {
        InvoiceStatus::Pending => {
            invoice.status = InvoiceStatus::Paid;
            Ok(())
        }
        InvoiceStatus::Paid => Err(StableflowError::invoice_already_paid(invoice.id)),
    }
}

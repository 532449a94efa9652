//! Ledger store
//!
//! This module provides the `LedgerStore` struct which owns one session's
//! wallet and invoice collection and applies balance mutations.
//!
//! The LedgerStore is responsible for:
//! - Locking collateral and crediting minted stablecoin
//! - Debiting stablecoin and marking invoices paid
//! - Keeping every mutation all-or-nothing: new balances are computed with
//!   checked arithmetic first and only then written back
//! - Providing sorted invoice listings for output

use crate::config::SessionConfig;
use crate::core::settlement;
use crate::types::{Invoice, InvoiceId, SessionId, SessionSnapshot, StableflowError, Wallet};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Balances after locking `collateral` and minting `debt`
///
/// Does not mutate the wallet; callers write both values back together.
pub(crate) fn balances_after_mint(
    wallet: &Wallet,
    collateral: Decimal,
    debt: Decimal,
) -> Result<(Decimal, Decimal), StableflowError> {
    if collateral < Decimal::ZERO {
        return Err(StableflowError::invalid_amount("collateral", collateral));
    }
    if debt < Decimal::ZERO {
        return Err(StableflowError::invalid_amount("debt", debt));
    }

    // Check if sufficient collateral exists
    if wallet.collateral_balance < collateral {
        return Err(StableflowError::insufficient_collateral(
            wallet.collateral_balance,
            collateral,
        ));
    }

    let new_collateral = wallet
        .collateral_balance
        .checked_sub(collateral)
        .ok_or_else(|| StableflowError::arithmetic_underflow("mint"))?;

    let new_stable = wallet
        .stable_balance
        .checked_add(debt)
        .ok_or_else(|| StableflowError::arithmetic_overflow("mint"))?;

    Ok((new_collateral, new_stable))
}

/// Stablecoin balance after paying `amount`
pub(crate) fn balance_after_payment(
    wallet: &Wallet,
    amount: Decimal,
) -> Result<Decimal, StableflowError> {
    if amount <= Decimal::ZERO {
        return Err(StableflowError::invalid_amount("payment", amount));
    }

    if wallet.stable_balance < amount {
        return Err(StableflowError::insufficient_funds(
            wallet.stable_balance,
            amount,
        ));
    }

    wallet
        .stable_balance
        .checked_sub(amount)
        .ok_or_else(|| StableflowError::arithmetic_underflow("payment"))
}

/// Owns the wallet and invoices of a single session
#[derive(Debug, Clone)]
pub struct LedgerStore {
    session: SessionId,
    wallet: Wallet,
    /// Map of invoice IDs to invoices
    invoices: HashMap<InvoiceId, Invoice>,
}

impl LedgerStore {
    /// Create a ledger from a starting wallet and invoice set
    pub fn new(session: SessionId, wallet: Wallet, invoices: Vec<Invoice>) -> Self {
        LedgerStore {
            session,
            wallet,
            invoices: invoices.into_iter().map(|inv| (inv.id, inv)).collect(),
        }
    }

    /// Create a ledger with the configured starting balances and invoices
    pub fn from_config(session: SessionId, config: &SessionConfig) -> Self {
        Self::new(
            session,
            Wallet::new(config.initial_collateral, config.initial_stable),
            config.invoices.clone(),
        )
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn invoice(&self, invoice_id: InvoiceId) -> Option<&Invoice> {
        self.invoices.get(&invoice_id)
    }

    /// Get all invoices sorted by id
    pub fn invoices(&self) -> Vec<&Invoice> {
        let mut invoices: Vec<&Invoice> = self.invoices.values().collect();
        invoices.sort_by_key(|invoice| invoice.id);
        invoices
    }

    pub fn connect(&mut self, address: &str) {
        self.wallet.connect(address);
    }

    /// Copy of the wallet and sorted invoices
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session: self.session,
            wallet: self.wallet.clone(),
            invoices: self.invoices().into_iter().cloned().collect(),
        }
    }

    /// Lock collateral and credit minted stablecoin
    ///
    /// The caller is expected to have validated the health factor already.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Either delta is negative
    /// - `collateral_delta` exceeds the collateral balance
    /// - The stablecoin balance would overflow
    pub fn apply_mint(
        &mut self,
        collateral_delta: Decimal,
        debt_delta: Decimal,
    ) -> Result<(), StableflowError> {
        let (new_collateral, new_stable) =
            balances_after_mint(&self.wallet, collateral_delta, debt_delta)?;

        // Update wallet balances
        self.wallet.collateral_balance = new_collateral;
        self.wallet.stable_balance = new_stable;

        Ok(())
    }

    /// Debit stablecoin and mark an invoice paid
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The invoice is unknown
    /// - The invoice is already paid
    /// - The stablecoin balance is below `amount`
    ///
    /// Nothing is modified when an error is returned.
    pub fn apply_payment(
        &mut self,
        invoice_id: InvoiceId,
        amount: Decimal,
    ) -> Result<(), StableflowError> {
        let invoice = self
            .invoices
            .get(&invoice_id)
            .ok_or_else(|| StableflowError::invoice_not_found(invoice_id))?;

        if invoice.is_paid() {
            return Err(StableflowError::invoice_already_paid(invoice_id));
        }

        let new_stable = balance_after_payment(&self.wallet, amount)?;

        if let Some(invoice) = self.invoices.get_mut(&invoice_id) {
            settlement::mark_paid(invoice)?;
        }
        self.wallet.stable_balance = new_stable;

        Ok(())
    }
}

//! Thread-safe ledger store for async settlement
//!
//! This module provides the `AsyncLedgerStore` struct, the concurrent
//! counterpart of `LedgerStore`. It owns one session's wallet and invoices and
//! can be shared across tokio tasks behind an `Arc`.
//!
//! # Locking
//!
//! The working wallet lives behind a `tokio::sync::Mutex`. A settlement
//! acquires it through `lock_wallet` before validating and keeps the returned
//! `WalletGuard` across the simulated confirmation delay, so a second mint or
//! payment on the same wallet waits until the first one has committed. The
//! guard is the only way to mutate a ledger and it always publishes to the
//! ledger it was taken from.
//!
//! # Notification
//!
//! Every commit publishes a whole `SessionSnapshot` (wallet and invoices) on a
//! `watch` channel in one step. All reads (`latest`, `invoice`, `invoices`,
//! `snapshot`, `subscribe`) come from that channel, so a reader never waits on
//! an in-flight settlement and never sees a debit without its paid invoice.

use std::ops::Deref;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::{watch, Mutex, MutexGuard};

use crate::config::SessionConfig;
use crate::core::ledger::{balance_after_payment, balances_after_mint};
use crate::core::settlement;
use crate::types::{Invoice, InvoiceId, SessionId, SessionSnapshot, StableflowError, Wallet};

/// Owns the wallet and invoices of a single session, shareable across tasks
#[derive(Debug)]
pub struct AsyncLedgerStore {
    session: SessionId,

    /// Working wallet; the guard doubles as the per-wallet busy flag
    wallet: Mutex<Wallet>,

    /// Working invoice table
    invoices: DashMap<InvoiceId, Invoice>,

    /// Last committed state of the session
    committed: watch::Sender<SessionSnapshot>,
}

impl AsyncLedgerStore {
    /// Create a ledger from a starting wallet and invoice set
    pub fn new(session: SessionId, wallet: Wallet, mut invoices: Vec<Invoice>) -> Self {
        invoices.sort_by_key(|invoice| invoice.id);
        let (committed, _) = watch::channel(SessionSnapshot {
            session,
            wallet: wallet.clone(),
            invoices: invoices.clone(),
        });

        Self {
            session,
            wallet: Mutex::new(wallet),
            invoices: invoices.into_iter().map(|inv| (inv.id, inv)).collect(),
            committed,
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

    /// Acquire the wallet, waiting for any in-flight settlement to finish
    pub async fn lock_wallet(&self) -> WalletGuard<'_> {
        WalletGuard {
            ledger: self,
            wallet: self.wallet.lock().await,
        }
    }

    /// Whether a settlement currently holds the wallet
    pub fn is_busy(&self) -> bool {
        self.wallet.try_lock().is_err()
    }

    /// Last committed wallet state (never blocks)
    pub fn latest(&self) -> Wallet {
        self.committed.borrow().wallet.clone()
    }

    /// Receive every subsequently committed session state
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.committed.subscribe()
    }

    /// Last committed state of one invoice
    pub fn invoice(&self, invoice_id: InvoiceId) -> Option<Invoice> {
        self.committed
            .borrow()
            .invoices
            .iter()
            .find(|invoice| invoice.id == invoice_id)
            .cloned()
    }

    /// Get all committed invoices sorted by id
    pub fn invoices(&self) -> Vec<Invoice> {
        self.committed.borrow().invoices.clone()
    }

    /// Last committed wallet and invoices, read together
    pub fn snapshot(&self) -> SessionSnapshot {
        self.committed.borrow().clone()
    }

    fn publish(&self, wallet: &Wallet, settled: Option<Invoice>) {
        self.committed.send_modify(|state| {
            state.wallet = wallet.clone();
            if let Some(settled) = settled {
                if let Some(slot) = state.invoices.iter_mut().find(|i| i.id == settled.id) {
                    *slot = settled;
                }
            }
        });
    }
}

/// Exclusive access to a ledger's working wallet
///
/// Produced only by `AsyncLedgerStore::lock_wallet`. Reads go through `Deref`;
/// every mutation publishes the result to the owning ledger.
#[derive(Debug)]
pub struct WalletGuard<'a> {
    ledger: &'a AsyncLedgerStore,
    wallet: MutexGuard<'a, Wallet>,
}

impl Deref for WalletGuard<'_> {
    type Target = Wallet;

    fn deref(&self) -> &Wallet {
        &self.wallet
    }
}

impl WalletGuard<'_> {
    /// Connect the wallet and publish it
    pub fn connect(&mut self, address: &str) {
        self.wallet.connect(address);
        self.ledger.publish(&self.wallet, None);
    }

    /// Lock collateral and credit minted stablecoin, then publish
    ///
    /// # Errors
    ///
    /// Same as `LedgerStore::apply_mint`; nothing is modified on error.
    pub fn apply_mint(
        &mut self,
        collateral_delta: Decimal,
        debt_delta: Decimal,
    ) -> Result<(), StableflowError> {
        let (new_collateral, new_stable) =
            balances_after_mint(&self.wallet, collateral_delta, debt_delta)?;

        self.wallet.collateral_balance = new_collateral;
        self.wallet.stable_balance = new_stable;
        self.ledger.publish(&self.wallet, None);

        Ok(())
    }

    /// Debit stablecoin and mark an invoice paid, then publish both at once
    ///
    /// # Errors
    ///
    /// Same as `LedgerStore::apply_payment`; nothing is modified on error.
    pub fn apply_payment(
        &mut self,
        invoice_id: InvoiceId,
        amount: Decimal,
    ) -> Result<(), StableflowError> {
        let mut entry = self
            .ledger
            .invoices
            .get_mut(&invoice_id)
            .ok_or_else(|| StableflowError::invoice_not_found(invoice_id))?;

        if entry.is_paid() {
            return Err(StableflowError::invoice_already_paid(invoice_id));
        }

        let new_stable = balance_after_payment(&self.wallet, amount)?;

        settlement::mark_paid(entry.value_mut())?;
        let settled = entry.value().clone();
        drop(entry);

        self.wallet.stable_balance = new_stable;
        self.ledger.publish(&self.wallet, Some(settled));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{default_invoices, InvoiceStatus};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn ledger(collateral: Decimal, stable: Decimal) -> AsyncLedgerStore {
        AsyncLedgerStore::new(1, Wallet::new(collateral, stable), default_invoices())
    }

    fn paid_total(snapshot: &SessionSnapshot) -> Decimal {
        snapshot
            .invoices
            .iter()
            .filter(|invoice| invoice.is_paid())
            .map(|invoice| invoice.amount)
            .sum()
    }

    #[tokio::test]
    async fn test_from_config_uses_demo_defaults() {
        let ledger = AsyncLedgerStore::from_config(4, &SessionConfig::default());

        assert_eq!(ledger.session(), 4);
        let wallet = ledger.latest();
        assert!(!wallet.connected);
        assert_eq!(wallet.collateral_balance, Decimal::new(25, 1));
        assert_eq!(ledger.invoices().len(), 3);
    }

    #[tokio::test]
    async fn test_apply_mint_publishes_committed_wallet() {
        let ledger = ledger(Decimal::new(25, 1), Decimal::ZERO);
        let mut updates = ledger.subscribe();

        {
            let mut wallet = ledger.lock_wallet().await;
            wallet.connect("0xabc");
            wallet
                .apply_mint(Decimal::new(1, 1), Decimal::new(100, 0))
                .unwrap();
        }

        updates.changed().await.unwrap();
        let published = updates.borrow_and_update().wallet.clone();
        assert_eq!(published.collateral_balance, Decimal::new(24, 1));
        assert_eq!(published.stable_balance, Decimal::new(100, 0));
        assert_eq!(ledger.latest(), published);
    }

    #[tokio::test]
    async fn test_published_state_tracks_guarded_wallet() {
        let ledger = ledger(Decimal::new(25, 1), Decimal::new(10, 0));

        let mut wallet = ledger.lock_wallet().await;
        assert!(ledger.is_busy());
        assert_eq!(ledger.latest(), *wallet);

        wallet.connect("0xabc");
        assert_eq!(ledger.latest(), *wallet);

        wallet
            .apply_mint(Decimal::new(1, 1), Decimal::new(100, 0))
            .unwrap();
        assert_eq!(ledger.latest(), *wallet);

        wallet.apply_payment(102, Decimal::new(750, 2)).unwrap();
        assert_eq!(ledger.latest(), *wallet);
        assert_eq!(ledger.snapshot().wallet, *wallet);

        // A rejected change leaves both sides where they were
        let _ = wallet.apply_payment(102, Decimal::new(750, 2));
        assert_eq!(ledger.latest(), *wallet);
        assert_eq!(wallet.stable_balance, Decimal::new(10250, 2));
    }

    #[tokio::test]
    async fn test_failed_mint_publishes_nothing() {
        let ledger = ledger(Decimal::new(25, 1), Decimal::ZERO);
        let updates = ledger.subscribe();

        let mut wallet = ledger.lock_wallet().await;
        let result = wallet.apply_mint(Decimal::new(3, 0), Decimal::ONE);

        assert!(matches!(
            result,
            Err(StableflowError::InsufficientCollateral { .. })
        ));
        assert!(!updates.has_changed().unwrap());
        assert_eq!(wallet.collateral_balance, Decimal::new(25, 1));
    }

    #[tokio::test]
    async fn test_apply_payment_marks_invoice_paid() {
        let ledger = ledger(Decimal::ZERO, Decimal::new(100, 0));

        let mut wallet = ledger.lock_wallet().await;
        wallet.apply_payment(101, Decimal::new(300, 2)).unwrap();

        assert_eq!(wallet.stable_balance, Decimal::new(97, 0));
        assert_eq!(ledger.invoice(101).unwrap().status, InvoiceStatus::Paid);

        let again = wallet.apply_payment(101, Decimal::new(300, 2));
        assert_eq!(again, Err(StableflowError::invoice_already_paid(101)));
        assert_eq!(wallet.stable_balance, Decimal::new(97, 0));
    }

    #[tokio::test]
    async fn test_apply_payment_insufficient_funds_changes_nothing() {
        let ledger = ledger(Decimal::ZERO, Decimal::new(5, 0));

        let mut wallet = ledger.lock_wallet().await;
        let result = wallet.apply_payment(102, Decimal::new(750, 2));

        assert!(matches!(
            result,
            Err(StableflowError::InsufficientFunds { .. })
        ));
        assert_eq!(wallet.stable_balance, Decimal::new(5, 0));
        assert_eq!(ledger.invoice(102).unwrap().status, InvoiceStatus::Pending);
    }

    #[tokio::test]
    async fn test_invoice_reads_do_not_wait_for_wallet() {
        let ledger = Arc::new(ledger(Decimal::ZERO, Decimal::new(100, 0)));

        let _guard = ledger.lock_wallet().await;

        let ids: Vec<InvoiceId> = ledger.invoices().iter().map(|inv| inv.id).collect();
        assert_eq!(ids, vec![101, 102, 103]);
        assert_eq!(ledger.snapshot().invoices.len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_snapshots_never_split_a_payment() {
        let initial = Decimal::new(100, 0);

        for _ in 0..500 {
            let ledger = Arc::new(ledger(Decimal::ZERO, initial));
            let done = Arc::new(AtomicBool::new(false));

            let reader = {
                let ledger = Arc::clone(&ledger);
                let done = Arc::clone(&done);
                tokio::task::spawn_blocking(move || {
                    let mut torn = 0;
                    while !done.load(Ordering::Acquire) {
                        let snapshot = ledger.snapshot();
                        if snapshot.wallet.stable_balance + paid_total(&snapshot) != initial {
                            torn += 1;
                        }
                    }
                    torn
                })
            };

            {
                let mut wallet = ledger.lock_wallet().await;
                for invoice in ledger.invoices() {
                    wallet.apply_payment(invoice.id, invoice.amount).unwrap();
                }
            }
            done.store(true, Ordering::Release);

            assert_eq!(reader.await.unwrap(), 0);
            let last = ledger.snapshot();
            assert_eq!(paid_total(&last), Decimal::new(1135, 2));
            assert_eq!(last.wallet.stable_balance, Decimal::new(8865, 2));
        }
    }
}

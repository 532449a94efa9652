//! Settlement orchestration for async sessions
//!
//! This module provides the `AsyncStablecoinEngine` struct, which runs mints
//! and invoice payments against thread-safe `AsyncLedgerStore`s with a
//! simulated confirmation delay.
//!
//! # Design
//!
//! A settlement runs in three steps while holding the session's wallet lock:
//!
//! 1. Validate against the current wallet (connection, health factor,
//!    balances, invoice state)
//! 2. Wait out the confirmation latency (`tokio::time::sleep`)
//! 3. Apply the mutation and publish the committed session state
//!
//! Holding the lock across the delay serializes settlements per wallet, so a
//! second request on the same wallet observes the first one's result.
//! Rejections happen in step 1 and never incur the delay.
//!
//! # Architecture
//!
//! ```text
//! AsyncStablecoinEngine
//!     ├── Arc<AsyncSessionManager>  (ledger per session)
//!     ├── Arc<dyn PriceFeed>        (shared reference price)
//!     └── LatencyConfig             (confirmation delays)
//! ```
//!
//! The engine is cheap to clone; clones share all state. `submit_mint` and
//! `submit_payment` use this to move a clone into a spawned task and hand the
//! caller a `JoinHandle` that completes once the settlement has committed or
//! been rejected.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use super::AsyncSessionManager;
use crate::config::LatencyConfig;
use crate::core::accounting::{self, HealthFactor};
use crate::core::settlement;
use crate::core::traits::PriceFeed;
use crate::types::{
    CommandRecord, CommandType, Invoice, InvoiceId, SessionId, SessionSnapshot, StableflowError,
    Wallet,
};

/// Settlement orchestrator shared across async tasks
#[derive(Debug, Clone)]
pub struct AsyncStablecoinEngine {
    sessions: Arc<AsyncSessionManager>,
    price_feed: Arc<dyn PriceFeed>,
    latency: LatencyConfig,
}

impl AsyncStablecoinEngine {
    /// Create an engine over existing sessions and price feed
    ///
    /// Confirmation latency is taken from the session manager's config.
    pub fn new(sessions: Arc<AsyncSessionManager>, price_feed: Arc<dyn PriceFeed>) -> Self {
        let latency = sessions.config().latency;
        Self {
            sessions,
            price_feed,
            latency,
        }
    }

    /// Current reference price
    pub fn price(&self) -> Decimal {
        self.price_feed.price()
    }

    /// Preview the health factor of a prospective position
    pub fn evaluate_health(
        &self,
        collateral_locked: Decimal,
        debt_minted: Decimal,
        reference_price: Decimal,
    ) -> Result<HealthFactor, StableflowError> {
        accounting::evaluate_health(collateral_locked, debt_minted, reference_price)
    }

    /// Connect the session's wallet, opening the session if needed
    ///
    /// Waits for any in-flight settlement on the wallet.
    pub async fn connect(&self, session: SessionId) {
        let address = &self.sessions.config().wallet_address;
        let ledger = self.sessions.get_or_create(session);
        let mut wallet = ledger.lock_wallet().await;
        wallet.connect(address);
        info!(session, address = %address, "wallet connected");
    }

    /// Lock collateral and mint stablecoin at `reference_price`
    ///
    /// Resolves after the mint confirmation delay.
    ///
    /// # Errors
    ///
    /// Same rejections as the synchronous engine, reported without delay.
    pub async fn mint(
        &self,
        session: SessionId,
        collateral_locked: Decimal,
        debt_minted: Decimal,
        reference_price: Decimal,
    ) -> Result<Decimal, StableflowError> {
        let ledger = self.sessions.get_or_create(session);
        let mut wallet = ledger.lock_wallet().await;

        let health = accounting::check_mint(
            &wallet,
            session,
            collateral_locked,
            debt_minted,
            reference_price,
        )?;

        confirm(self.latency.mint).await;
        wallet.apply_mint(collateral_locked, debt_minted)?;

        info!(
            session,
            collateral = %collateral_locked,
            minted = %debt_minted,
            price = %reference_price,
            health = %health,
            "mint settled"
        );
        Ok(debt_minted)
    }

    /// Mint at the feed price read when the request is made
    pub async fn mint_at_market(
        &self,
        session: SessionId,
        collateral_locked: Decimal,
        debt_minted: Decimal,
    ) -> Result<Decimal, StableflowError> {
        let price = self.price();
        self.mint(session, collateral_locked, debt_minted, price)
            .await
    }

    /// Pay an invoice from the session's stablecoin balance
    ///
    /// Resolves after the payment confirmation delay.
    pub async fn pay(
        &self,
        session: SessionId,
        invoice_id: InvoiceId,
    ) -> Result<(), StableflowError> {
        let ledger = self.sessions.get_or_create(session);
        let mut wallet = ledger.lock_wallet().await;

        let invoice = ledger.invoice(invoice_id);
        let amount = settlement::check_payment(&wallet, session, invoice_id, invoice.as_ref())?;

        confirm(self.latency.payment).await;
        wallet.apply_payment(invoice_id, amount)?;

        info!(session, invoice = invoice_id, amount = %amount, "invoice paid");
        Ok(())
    }

    /// Start a mint in the background
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit_mint(
        &self,
        session: SessionId,
        collateral_locked: Decimal,
        debt_minted: Decimal,
        reference_price: Decimal,
    ) -> JoinHandle<Result<Decimal, StableflowError>> {
        let engine = self.clone();
        tokio::spawn(async move {
            engine
                .mint(session, collateral_locked, debt_minted, reference_price)
                .await
        })
    }

    /// Start an invoice payment in the background
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit_payment(
        &self,
        session: SessionId,
        invoice_id: InvoiceId,
    ) -> JoinHandle<Result<(), StableflowError>> {
        let engine = self.clone();
        tokio::spawn(async move { engine.pay(session, invoice_id).await })
    }

    /// Process a single command record
    ///
    /// A mint without an explicit price uses the feed price at the time the
    /// command is processed.
    pub async fn process_command(&self, record: CommandRecord) -> Result<(), StableflowError> {
        match record.op {
            CommandType::Connect => {
                self.connect(record.session).await;
                Ok(())
            }
            CommandType::Mint => {
                let collateral = record.collateral.ok_or_else(|| {
                    StableflowError::missing_field("mint", "collateral", record.session)
                })?;
                let debt = record
                    .debt
                    .ok_or_else(|| StableflowError::missing_field("mint", "debt", record.session))?;
                let price = record.price.unwrap_or_else(|| self.price());
                self.mint(record.session, collateral, debt, price)
                    .await
                    .map(|_| ())
            }
            CommandType::Pay => {
                let invoice = record.invoice.ok_or_else(|| {
                    StableflowError::missing_field("pay", "invoice", record.session)
                })?;
                self.pay(record.session, invoice).await
            }
        }
    }

    /// Watch the committed state of a session, opening it if needed
    pub fn subscribe(&self, session: SessionId) -> watch::Receiver<SessionSnapshot> {
        self.sessions.get_or_create(session).subscribe()
    }

    /// Last committed wallet of a session
    pub fn wallet(&self, session: SessionId) -> Option<Wallet> {
        self.sessions.get(session).map(|ledger| ledger.latest())
    }

    /// Invoices of a session sorted by id (empty for an unknown session)
    pub fn invoices(&self, session: SessionId) -> Vec<Invoice> {
        self.sessions
            .get(session)
            .map(|ledger| ledger.invoices())
            .unwrap_or_default()
    }

    /// Whether a settlement is in flight for the session
    pub fn is_busy(&self, session: SessionId) -> bool {
        self.sessions
            .get(session)
            .is_some_and(|ledger| ledger.is_busy())
    }

    /// Snapshots of every session sorted by session id
    pub fn snapshots(&self) -> Vec<SessionSnapshot> {
        self.sessions
            .get_all_sessions()
            .iter()
            .map(|ledger| ledger.snapshot())
            .collect()
    }
}

async fn confirm(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

//! Stablecoin engine
//!
//! This module provides the StablecoinEngine that orchestrates minting and
//! invoice settlement by coordinating the SessionManager, the position
//! accounting rules, and the price feed.
//!
//! The engine enforces business rules such as:
//! - Connected wallet before any mint or payment
//! - Minimum health factor before minting
//! - Sufficient collateral / stablecoin before any debit
//! - One-way invoice lifecycle (pending → paid)
//!
//! Every operation runs to completion synchronously; there is no simulated
//! confirmation latency here (see `core::r#async` for that).

use crate::config::SessionConfig;
use crate::core::accounting::{self, HealthFactor};
use crate::core::ledger::LedgerStore;
use crate::core::session_manager::SessionManager;
use crate::core::settlement;
use crate::core::traits::PriceFeed;
use crate::types::{
    CommandRecord, CommandType, Invoice, InvoiceId, SessionId, SessionSnapshot, StableflowError,
    Wallet,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

/// Synchronous stablecoin engine
#[derive(Debug)]
pub struct StablecoinEngine {
    sessions: SessionManager,
    price_feed: Arc<dyn PriceFeed>,
}

impl StablecoinEngine {
    /// Create an engine whose price feed is built from the config
    pub fn new(config: SessionConfig) -> Self {
        let price_feed = config.price.build_feed();
        Self::with_price_feed(config, price_feed)
    }

    /// Create an engine reading prices from an existing feed
    pub fn with_price_feed(config: SessionConfig, price_feed: Arc<dyn PriceFeed>) -> Self {
        StablecoinEngine {
            sessions: SessionManager::new(config),
            price_feed,
        }
    }

    /// Current reference price
    pub fn price(&self) -> Decimal {
        self.price_feed.price()
    }

    /// Advance the price feed one step
    pub fn tick_price(&self) -> Decimal {
        self.price_feed.tick()
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
    pub fn connect(&mut self, session: SessionId) {
        let address = self.sessions.config().wallet_address.clone();
        let ledger = self.sessions.get_or_create(session);
        ledger.connect(&address);
        info!(session, address = %address, "wallet connected");
    }

    /// Lock collateral and mint stablecoin at `reference_price`
    ///
    /// # Returns
    ///
    /// The minted amount.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The wallet is not connected
    /// - The resulting health factor is below 150%
    /// - The collateral exceeds the wallet's collateral balance
    pub fn mint(
        &mut self,
        session: SessionId,
        collateral_locked: Decimal,
        debt_minted: Decimal,
        reference_price: Decimal,
    ) -> Result<Decimal, StableflowError> {
        let ledger = self.sessions.get_or_create(session);

        let health = accounting::check_mint(
            ledger.wallet(),
            session,
            collateral_locked,
            debt_minted,
            reference_price,
        )?;

        ledger.apply_mint(collateral_locked, debt_minted)?;

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

    /// Mint at the current feed price
    pub fn mint_at_market(
        &mut self,
        session: SessionId,
        collateral_locked: Decimal,
        debt_minted: Decimal,
    ) -> Result<Decimal, StableflowError> {
        let price = self.price();
        self.mint(session, collateral_locked, debt_minted, price)
    }

    /// Pay an invoice from the session's stablecoin balance
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The wallet is not connected
    /// - The invoice is unknown or already paid
    /// - The stablecoin balance is below the invoice amount
    pub fn pay(&mut self, session: SessionId, invoice_id: InvoiceId) -> Result<(), StableflowError> {
        let ledger = self.sessions.get_or_create(session);

        let amount = settlement::check_payment(
            ledger.wallet(),
            session,
            invoice_id,
            ledger.invoice(invoice_id),
        )?;

        ledger.apply_payment(invoice_id, amount)?;

        info!(session, invoice = invoice_id, amount = %amount, "invoice paid");
        Ok(())
    }

    /// Process a single command record
    ///
    /// Routes the command to the matching operation. A mint without an
    /// explicit price uses the current feed price.
    pub fn process(&mut self, record: CommandRecord) -> Result<(), StableflowError> {
        match record.op {
            CommandType::Connect => {
                self.connect(record.session);
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
                self.mint(record.session, collateral, debt, price).map(|_| ())
            }
            CommandType::Pay => {
                let invoice = record.invoice.ok_or_else(|| {
                    StableflowError::missing_field("pay", "invoice", record.session)
                })?;
                self.pay(record.session, invoice)
            }
        }
    }

    pub fn wallet(&self, session: SessionId) -> Option<&Wallet> {
        self.sessions.get(session).map(LedgerStore::wallet)
    }

    /// Invoices of a session sorted by id (empty for an unknown session)
    pub fn invoices(&self, session: SessionId) -> Vec<&Invoice> {
        self.sessions
            .get(session)
            .map(LedgerStore::invoices)
            .unwrap_or_default()
    }

    /// All session ledgers sorted by session id
    pub fn sessions(&self) -> Vec<&LedgerStore> {
        self.sessions.get_all_sessions()
    }

    /// Snapshots of every session sorted by session id
    pub fn snapshots(&self) -> Vec<SessionSnapshot> {
        self.sessions
            .get_all_sessions()
            .into_iter()
            .map(LedgerStore::snapshot)
            .collect()
    }
}

impl Default for StablecoinEngine {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PriceConfig;
    use crate::core::accounting::MIN_HEALTH_FACTOR_PERCENT;
    use crate::types::InvoiceStatus;
    use rstest::rstest;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn engine() -> StablecoinEngine {
        StablecoinEngine::new(SessionConfig::default().with_price(PriceConfig::fixed(dec("3000"))))
    }

    fn connected_engine() -> StablecoinEngine {
        let mut engine = engine();
        engine.connect(1);
        engine
    }

    #[test]
    fn test_scenario_a_mint_allowed() {
        let mut engine = connected_engine();

        let minted = engine.mint(1, dec("0.1"), dec("100"), dec("3000")).unwrap();

        assert_eq!(minted, dec("100"));
        let wallet = engine.wallet(1).unwrap();
        assert_eq!(wallet.collateral_balance, dec("2.4"));
        assert_eq!(wallet.stable_balance, dec("100"));
    }

    #[test]
    fn test_scenario_b_mint_undercollateralized() {
        let mut engine = connected_engine();

        let result = engine.mint(1, dec("0.01"), dec("100"), dec("3000"));

        assert_eq!(
            result,
            Err(StableflowError::undercollateralized(
                Some(dec("30")),
                MIN_HEALTH_FACTOR_PERCENT
            ))
        );
        let wallet = engine.wallet(1).unwrap();
        assert_eq!(wallet.collateral_balance, dec("2.5"));
        assert_eq!(wallet.stable_balance, Decimal::ZERO);
    }

    #[test]
    fn test_scenario_c_pay_then_repeat() {
        let mut engine = connected_engine();
        engine.mint(1, dec("0.1"), dec("100"), dec("3000")).unwrap();

        engine.pay(1, 101).unwrap();
        assert_eq!(engine.wallet(1).unwrap().stable_balance, dec("97.00"));
        assert_eq!(engine.invoices(1)[0].status, InvoiceStatus::Paid);

        let repeat = engine.pay(1, 101);
        assert_eq!(repeat, Err(StableflowError::invoice_already_paid(101)));
        assert_eq!(engine.wallet(1).unwrap().stable_balance, dec("97.00"));
    }

    #[test]
    fn test_two_identical_mints_accumulate() {
        let mut engine = connected_engine();

        engine.mint(1, dec("0.1"), dec("100"), dec("3000")).unwrap();
        engine.mint(1, dec("0.1"), dec("100"), dec("3000")).unwrap();

        let wallet = engine.wallet(1).unwrap();
        assert_eq!(wallet.collateral_balance, dec("2.3"));
        assert_eq!(wallet.stable_balance, dec("200"));
    }

    #[rstest]
    #[case::mint(CommandRecord::mint(1, dec("0.1"), dec("100"), Some(dec("3000"))))]
    #[case::pay(CommandRecord::pay(1, 101))]
    fn test_operations_require_connection(#[case] record: CommandRecord) {
        let mut engine = engine();

        let result = engine.process(record);

        assert_eq!(result, Err(StableflowError::not_connected(1)));
        let wallet = engine.wallet(1).unwrap();
        assert_eq!(wallet.collateral_balance, dec("2.5"));
        assert_eq!(wallet.stable_balance, Decimal::ZERO);
    }

    #[test]
    fn test_pay_insufficient_funds_leaves_state_unchanged() {
        let mut engine = connected_engine();

        let result = engine.pay(1, 102);

        assert_eq!(
            result,
            Err(StableflowError::insufficient_funds(Decimal::ZERO, dec("7.50")))
        );
        assert_eq!(engine.invoices(1)[1].status, InvoiceStatus::Pending);
    }

    #[test]
    fn test_mint_exceeding_collateral_is_rejected() {
        let mut engine = connected_engine();

        let result = engine.mint(1, dec("3"), dec("100"), dec("3000"));

        assert_eq!(
            result,
            Err(StableflowError::insufficient_collateral(dec("2.5"), dec("3")))
        );
    }

    #[test]
    fn test_zero_debt_mint_is_rejected_as_neutral() {
        let mut engine = connected_engine();

        let result = engine.mint(1, dec("0.1"), Decimal::ZERO, dec("3000"));

        assert_eq!(
            result,
            Err(StableflowError::undercollateralized(None, MIN_HEALTH_FACTOR_PERCENT))
        );
    }

    #[test]
    fn test_process_mint_without_price_uses_feed() {
        let mut engine = connected_engine();

        engine
            .process(CommandRecord::mint(1, dec("0.1"), dec("100"), None))
            .unwrap();

        assert_eq!(engine.wallet(1).unwrap().stable_balance, dec("100"));
    }

    #[test]
    fn test_process_mint_missing_debt() {
        let mut engine = connected_engine();
        let mut record = CommandRecord::mint(1, dec("0.1"), dec("100"), None);
        record.debt = None;

        let result = engine.process(record);

        assert_eq!(result, Err(StableflowError::missing_field("mint", "debt", 1)));
    }

    #[test]
    fn test_mint_at_market_reads_feed() {
        let mut engine = connected_engine();
        assert_eq!(engine.price(), dec("3000"));

        // 0.05 ETH at 3000 backs exactly 100 USDX at 150%
        engine.mint_at_market(1, dec("0.05"), dec("100")).unwrap();
        assert_eq!(engine.wallet(1).unwrap().stable_balance, dec("100"));
    }

    #[test]
    fn test_evaluate_health_delegates_to_accounting() {
        let engine = engine();
        assert_eq!(
            engine.evaluate_health(dec("0.1"), dec("100"), dec("3000")),
            Ok(HealthFactor::Percent(dec("300")))
        );
        assert_eq!(
            engine.evaluate_health(dec("0.1"), Decimal::ZERO, dec("3000")),
            Ok(HealthFactor::Neutral)
        );
    }

    #[test]
    fn test_unknown_session_has_no_wallet() {
        let engine = engine();
        assert!(engine.wallet(9).is_none());
        assert!(engine.invoices(9).is_empty());
        assert!(engine.sessions().is_empty());
    }
}

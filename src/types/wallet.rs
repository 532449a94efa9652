//! Wallet-related types for the StableFlow ledger
//!
//! This module defines the Wallet structure holding one session's
//! collateral and stablecoin balances.

use rust_decimal::Decimal;
use serde::Serialize;

/// Session identifier
///
/// Supports session IDs from 0 to 65,535
pub type SessionId = u16;

/// Simulated wallet state
///
/// Both balances are non-negative at every observed instant. Balance
/// mutations go through the ledger, which applies them all-or-nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Wallet {
    /// Whether the user has connected the wallet
    pub connected: bool,

    /// Address assigned on connect
    pub address: Option<String>,

    /// Unlocked collateral (ETH) available to back new debt
    pub collateral_balance: Decimal,

    /// Minted stablecoin (USDX) available to spend
    pub stable_balance: Decimal,
}

impl Wallet {
    /// Create a disconnected wallet with the given starting balances
    pub fn new(collateral_balance: Decimal, stable_balance: Decimal) -> Self {
        Wallet {
            connected: false,
            address: None,
            collateral_balance,
            stable_balance,
        }
    }

    /// Mark the wallet connected under `address`
    ///
    /// Connecting an already-connected wallet keeps its original address.
    pub fn connect(&mut self, address: &str) {
        if !self.connected {
            self.connected = true;
            self.address = Some(address.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_wallet_is_disconnected() {
        let wallet = Wallet::new(Decimal::new(25, 1), Decimal::ZERO);

        assert!(!wallet.connected);
        assert_eq!(wallet.address, None);
        assert_eq!(wallet.collateral_balance, Decimal::new(25, 1));
        assert_eq!(wallet.stable_balance, Decimal::ZERO);
    }

    #[test]
    fn test_connect_is_idempotent() {
        let mut wallet = Wallet::new(Decimal::ONE, Decimal::ZERO);

        wallet.connect("0xabc");
        wallet.connect("0xdef");

        assert!(wallet.connected);
        assert_eq!(wallet.address.as_deref(), Some("0xabc"));
    }
}

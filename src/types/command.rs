//! Command types for scripted session replay
//!
//! A command is one user action against a session: connecting the wallet,
//! minting stablecoin against collateral, or paying an invoice.

use super::invoice::InvoiceId;
use super::wallet::SessionId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Command types supported by the replay engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    /// Connect the session's wallet
    Connect,

    /// Lock collateral and mint stablecoin
    ///
    /// Requires `collateral` and `debt`. Uses `price` as the reference price
    /// when given, otherwise the current feed price.
    Mint,

    /// Pay an invoice out of the stablecoin balance
    ///
    /// Requires `invoice`.
    Pay,
}

/// A single parsed command
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRecord {
    /// What to do
    pub op: CommandType,

    /// Which session to do it in
    pub session: SessionId,

    /// Collateral to lock (mint only)
    pub collateral: Option<Decimal>,

    /// Stablecoin to mint (mint only)
    pub debt: Option<Decimal>,

    /// Explicit reference price (mint only, optional)
    pub price: Option<Decimal>,

    /// Target invoice (pay only)
    pub invoice: Option<InvoiceId>,
}

impl CommandRecord {
    /// Build a connect command
    pub fn connect(session: SessionId) -> Self {
        CommandRecord {
            op: CommandType::Connect,
            session,
            collateral: None,
            debt: None,
            price: None,
            invoice: None,
        }
    }

    /// Build a mint command
    pub fn mint(
        session: SessionId,
        collateral: Decimal,
        debt: Decimal,
        price: Option<Decimal>,
    ) -> Self {
        CommandRecord {
            op: CommandType::Mint,
            session,
            collateral: Some(collateral),
            debt: Some(debt),
            price,
            invoice: None,
        }
    }

    /// Build a pay command
    pub fn pay(session: SessionId, invoice: InvoiceId) -> Self {
        CommandRecord {
            op: CommandType::Pay,
            session,
            collateral: None,
            debt: None,
            price: None,
            invoice: Some(invoice),
        }
    }
}

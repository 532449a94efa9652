//! Position accounting
//!
//! Pure functions computing the health factor of a prospective position
//! and deciding whether a mint may proceed.
//!
//! ```text
//! health factor % = (collateral_locked * reference_price / debt_minted) * 100
//! ```
//!
//! A position with no debt carries no risk and is reported as
//! [`HealthFactor::Neutral`]. A mint is allowed only at or above
//! [`MIN_HEALTH_FACTOR_PERCENT`].

use crate::types::{SessionId, StableflowError, Wallet};
use rust_decimal::Decimal;
use std::fmt;

/// Minimum collateralization, in percent, a mint must keep
pub const MIN_HEALTH_FACTOR_PERCENT: Decimal = Decimal::from_parts(150, 0, 0, false, 0);

/// Health of a prospective position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthFactor {
    /// No debt, nothing to evaluate
    Neutral,
    /// Collateral value over debt, in percent
    Percent(Decimal),
}

impl HealthFactor {
    pub fn percent(&self) -> Option<Decimal> {
        match self {
            HealthFactor::Neutral => None,
            HealthFactor::Percent(p) => Some(*p),
        }
    }

    /// Whether a mint producing this position may proceed
    ///
    /// A neutral position mints nothing and is never allowed.
    pub fn allows_mint(&self) -> bool {
        match self {
            HealthFactor::Neutral => false,
            HealthFactor::Percent(p) => is_mint_allowed(*p),
        }
    }
}

impl fmt::Display for HealthFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthFactor::Neutral => write!(f, "neutral"),
            HealthFactor::Percent(p) => write!(f, "{}%", p.round_dp(2)),
        }
    }
}

/// Compute the health factor of locking `collateral_locked` to mint `debt_minted`
///
/// # Errors
///
/// - `InvalidAmount` if collateral or debt is negative
/// - `InvalidPrice` if the reference price is not strictly positive
/// - `ArithmeticOverflow` if the collateral value does not fit a `Decimal`
pub fn evaluate_health(
    collateral_locked: Decimal,
    debt_minted: Decimal,
    reference_price: Decimal,
) -> Result<HealthFactor, StableflowError> {
    if collateral_locked < Decimal::ZERO {
        return Err(StableflowError::invalid_amount("collateral", collateral_locked));
    }
    if debt_minted < Decimal::ZERO {
        return Err(StableflowError::invalid_amount("debt", debt_minted));
    }
    if reference_price <= Decimal::ZERO {
        return Err(StableflowError::invalid_price(reference_price));
    }

    if debt_minted.is_zero() {
        return Ok(HealthFactor::Neutral);
    }

    let percent = collateral_locked
        .checked_mul(reference_price)
        .and_then(|value| value.checked_div(debt_minted))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or_else(|| StableflowError::arithmetic_overflow("evaluate_health"))?;

    Ok(HealthFactor::Percent(percent))
}

/// Whether a health factor meets the minimum collateralization
pub fn is_mint_allowed(health_factor_percent: Decimal) -> bool {
    health_factor_percent >= MIN_HEALTH_FACTOR_PERCENT
}

/// Validate a mint request against a wallet snapshot
///
/// Runs the mint preconditions in order: connected wallet, health factor,
/// then available collateral. Returns the health factor on success.
pub fn check_mint(
    wallet: &Wallet,
    session: SessionId,
    collateral_locked: Decimal,
    debt_minted: Decimal,
    reference_price: Decimal,
) -> Result<HealthFactor, StableflowError> {
    if !wallet.connected {
        return Err(StableflowError::not_connected(session));
    }

    let health = evaluate_health(collateral_locked, debt_minted, reference_price)?;
    if !health.allows_mint() {
        return Err(StableflowError::undercollateralized(
            health.percent(),
            MIN_HEALTH_FACTOR_PERCENT,
        ));
    }

    if collateral_locked > wallet.collateral_balance {
        return Err(StableflowError::insufficient_collateral(
            wallet.collateral_balance,
            collateral_locked,
        ));
    }

    Ok(health)
}

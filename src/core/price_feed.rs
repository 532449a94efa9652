//! Reference price feeds
//!
//! - `FixedPriceFeed` always reports the same price.
//! - `RandomWalkFeed` drifts by a bounded random step on every tick. The walk
//!   has no mean reversion, so it is clamped to a floor to keep the price
//!   strictly positive.

use crate::core::traits::PriceFeed;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::sync::Mutex;
use tracing::debug;

/// Constant price feed
#[derive(Debug, Clone)]
pub struct FixedPriceFeed {
    price: Decimal,
}

impl FixedPriceFeed {
    pub fn new(price: Decimal) -> Self {
        Self { price }
    }
}

impl PriceFeed for FixedPriceFeed {
    fn price(&self) -> Decimal {
        self.price
    }
}

#[derive(Debug)]
struct WalkState {
    price: Decimal,
    rng: StdRng,
}

/// Random-walk price feed
///
/// Each tick computes `floor(price + (u - 0.5) * max_step)` for `u` drawn
/// uniformly from `[0, 1)`, then clamps the result to `floor`.
#[derive(Debug)]
pub struct RandomWalkFeed {
    state: Mutex<WalkState>,
    max_step: Decimal,
    floor: Decimal,
}

impl RandomWalkFeed {
    /// Create a walk starting at `initial`
    ///
    /// A `seed` makes the walk reproducible; without one it is seeded from
    /// system entropy. A floor below one cent is raised to one cent.
    pub fn new(initial: Decimal, max_step: Decimal, floor: Decimal, seed: Option<u64>) -> Self {
        let floor = floor.max(Decimal::new(1, 2));
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            state: Mutex::new(WalkState {
                price: initial.max(floor),
                rng,
            }),
            max_step: max_step.abs(),
            floor,
        }
    }

    fn next_price(&self, state: &mut WalkState) -> Decimal {
        let u: f64 = state.rng.gen();
        let offset = Decimal::from_f64(u - 0.5)
            .and_then(|factor| factor.checked_mul(self.max_step))
            .unwrap_or(Decimal::ZERO);

        state
            .price
            .checked_add(offset)
            .map(|p| p.floor())
            .unwrap_or(state.price)
            .max(self.floor)
    }
}

impl PriceFeed for RandomWalkFeed {
    fn price(&self) -> Decimal {
        match self.state.lock() {
            Ok(state) => state.price,
            Err(poisoned) => poisoned.into_inner().price,
        }
    }

    fn tick(&self) -> Decimal {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };

        let next = self.next_price(&mut state);
        debug!(from = %state.price, to = %next, "price tick");
        state.price = next;
        next
    }
}

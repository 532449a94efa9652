//! Background price ticker
//!
//! Advances a shared `PriceFeed` on a fixed interval so async sessions see a
//! moving reference price.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::core::traits::PriceFeed;

/// Shortest accepted tick interval
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Spawn a task that ticks `feed` every `interval` until aborted
///
/// The first tick happens one full interval after spawning. Missed ticks are
/// skipped rather than replayed in a burst. Must be called from within a tokio
/// runtime.
pub fn spawn_price_ticker(feed: Arc<dyn PriceFeed>, interval: Duration) -> JoinHandle<()> {
    let period = interval.max(MIN_INTERVAL);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            feed.tick();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::price_feed::{FixedPriceFeed, RandomWalkFeed};
    use rust_decimal::Decimal;

    #[tokio::test(start_paused = true)]
    async fn test_ticker_advances_feed_each_interval() {
        let feed: Arc<dyn PriceFeed> = Arc::new(RandomWalkFeed::new(
            Decimal::new(3000, 0),
            Decimal::new(10, 0),
            Decimal::ONE,
            Some(7),
        ));
        let reference = RandomWalkFeed::new(
            Decimal::new(3000, 0),
            Decimal::new(10, 0),
            Decimal::ONE,
            Some(7),
        );

        let handle = spawn_price_ticker(Arc::clone(&feed), Duration::from_secs(3));

        // Nothing happens before the first interval elapses
        tokio::time::sleep(Duration::from_millis(2900)).await;
        assert_eq!(feed.price(), Decimal::new(3000, 0));

        tokio::time::sleep(Duration::from_millis(3200)).await;
        reference.tick();
        let expected = reference.tick();
        assert_eq!(feed.price(), expected);

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_on_fixed_feed_keeps_price() {
        let feed: Arc<dyn PriceFeed> = Arc::new(FixedPriceFeed::new(Decimal::new(3000, 0)));

        let handle = spawn_price_ticker(Arc::clone(&feed), Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(feed.price(), Decimal::new(3000, 0));
        handle.abort();
    }
}

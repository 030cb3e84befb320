//! Pool snapshot provider.
//!
//! Produces the `poolA`/`poolB`/`poolC` snapshot a request is simulated
//! against, either synthetically or around a live cross price.

use crate::cex::SpotPriceSource;
use crate::errors::{AppError, Result};
use crate::models::TradeIntent;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub mod state;
pub mod synthetic;

pub use state::{MAX_POOLS, MIN_POOLS, PoolSnapshot, PoolState};
pub use synthetic::{live_snapshot, synthetic_snapshot};

/// Builds one snapshot per request. Live failures degrade to synthetic pools.
#[derive(Clone)]
pub struct SnapshotProvider {
    source: Arc<dyn SpotPriceSource>,
    currency: String,
    timeout: Duration,
}

impl SnapshotProvider {
    pub fn new(source: Arc<dyn SpotPriceSource>, currency: &str, timeout: Duration) -> Self {
        Self {
            source,
            currency: currency.to_string(),
            timeout,
        }
    }

    /// Snapshot for `intent`: live around a cross price if requested, else
    /// synthetic. Never fails.
    pub async fn snapshot<R: Rng + Send>(
        &self,
        intent: &TradeIntent,
        rng: &mut R,
    ) -> PoolSnapshot {
        if !intent.use_live {
            return synthetic_snapshot(rng);
        }
        let live = match self.cross_price(&intent.from_token, &intent.to_token).await {
            Ok(cross) => live_snapshot(cross, rng),
            Err(e) => Err(e),
        };
        match live {
            Ok(snapshot) => {
                info!(
                    from = %intent.from_token,
                    to = %intent.to_token,
                    "[SNAPSHOT] live pools built"
                );
                snapshot
            }
            Err(e) => {
                warn!(error = %e, "[SNAPSHOT] live quotes unavailable, using synthetic pools");
                synthetic_snapshot(rng)
            }
        }
    }

    /// `base` priced in `quote`, derived from two concurrent spot quotes
    /// against the shared reference currency.
    pub async fn cross_price(&self, base: &str, quote: &str) -> Result<f64> {
        let fetch = async {
            futures::join!(
                self.source.spot_price(base, &self.currency),
                self.source.spot_price(quote, &self.currency)
            )
        };
        let (base_px, quote_px) = tokio::time::timeout(self.timeout, fetch)
            .await
            .map_err(|_| AppError::Timeout(self.timeout.as_millis() as u64))?;
        let cross = base_px? / quote_px?;
        if !cross.is_finite() || cross <= 0.0 {
            return Err(AppError::Quote(format!("unusable cross price {cross}")));
        }
        Ok(cross)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSource {
        prices: HashMap<&'static str, f64>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SpotPriceSource for FixedSource {
        async fn spot_price(&self, asset: &str, _currency: &str) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prices
                .get(asset)
                .copied()
                .ok_or_else(|| AppError::Quote(format!("no price for {asset}")))
        }
    }

    struct SlowSource;

    #[async_trait]
    impl SpotPriceSource for SlowSource {
        async fn spot_price(&self, _asset: &str, _currency: &str) -> Result<f64> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(1.0)
        }
    }

    fn fixed() -> Arc<FixedSource> {
        Arc::new(FixedSource {
            prices: HashMap::from([("ETH", 3000.0), ("BTC", 60000.0)]),
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn synthetic_mode_never_calls_the_source() {
        let source = fixed();
        let provider = SnapshotProvider::new(source.clone(), "USD", Duration::from_secs(1));
        let mut rng = StdRng::seed_from_u64(3);
        let snap = provider
            .snapshot(&TradeIntent::new("ETH", "BTC", 1.0), &mut rng)
            .await;
        assert_eq!(snap.len(), 3);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn live_mode_uses_cross_price() {
        let source = fixed();
        let provider = SnapshotProvider::new(source.clone(), "USD", Duration::from_secs(1));
        let mut rng = StdRng::seed_from_u64(3);
        let intent = TradeIntent::new("ETH", "BTC", 1.0).with_live(true);
        let snap = provider.snapshot(&intent, &mut rng).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        for (_, s) in snap.iter() {
            assert!(s.price > 0.05 * 0.97 && s.price < 0.05 * 1.03);
        }
        assert_eq!(snap.get("poolB").unwrap().fee, 0.001);
    }

    #[tokio::test]
    async fn failed_quote_falls_back_to_synthetic() {
        let provider = SnapshotProvider::new(fixed(), "USD", Duration::from_secs(1));
        let mut rng = StdRng::seed_from_u64(5);
        let intent = TradeIntent::new("ETH", "DOGE", 1.0).with_live(true);
        let snap = provider.snapshot(&intent, &mut rng).await;
        assert_eq!(snap.ids().collect::<Vec<_>>(), vec!["poolA", "poolB", "poolC"]);
        // Synthetic price range, nowhere near the 0.05 cross price.
        let a = snap.get("poolA").unwrap();
        assert!(a.price >= 0.055 && a.price < 0.061);
    }

    #[tokio::test]
    async fn slow_quotes_time_out() {
        let provider = SnapshotProvider::new(Arc::new(SlowSource), "USD", Duration::from_millis(20));
        let err = provider.cross_price("ETH", "BTC").await.unwrap_err();
        assert!(matches!(err, AppError::Timeout(20)));

        let mut rng = StdRng::seed_from_u64(9);
        let intent = TradeIntent::new("ETH", "BTC", 1.0).with_live(true);
        assert_eq!(provider.snapshot(&intent, &mut rng).await.len(), 3);
    }
}

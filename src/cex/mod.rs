//! CEX spot quote clients.
//!
//! Responsibilities:
//! • Fetch a spot price for an asset against a reference currency.
//! • Reject anything that is not a positive, finite price.

use crate::errors::Result;
use async_trait::async_trait;

pub mod coinbase;

pub use coinbase::CoinbaseClient;

/// Source of spot prices for live pool snapshots.
#[async_trait]
pub trait SpotPriceSource: Send + Sync {
    /// Spot price of one unit of `asset` in `currency`.
    async fn spot_price(&self, asset: &str, currency: &str) -> Result<f64>;
}

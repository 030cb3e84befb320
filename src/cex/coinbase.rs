use crate::cex::SpotPriceSource;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

#[derive(Debug, Deserialize)]
struct SpotMsg {
    data: SpotData,
}

#[derive(Debug, Deserialize)]
struct SpotData {
    amount: String,
}

/// Client for the Coinbase v2 `prices/{ASSET}-{CURRENCY}/spot` endpoint.
#[derive(Clone, Debug)]
pub struct CoinbaseClient {
    http: reqwest::Client,
    base_url: Url,
}

impl CoinbaseClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    fn spot_url(&self, asset: &str, currency: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let pair = format!("{}-{}", asset.to_uppercase(), currency.to_uppercase());
        Ok(Url::parse(&format!("{base}/prices/{pair}/spot"))?)
    }
}

#[async_trait]
impl SpotPriceSource for CoinbaseClient {
    async fn spot_price(&self, asset: &str, currency: &str) -> Result<f64> {
        let url = self.spot_url(asset, currency)?;
        let res = self.http.get(url.clone()).send().await?;
        if !res.status().is_success() {
            return Err(AppError::Quote(format!("{url} returned {}", res.status())));
        }
        let body = res.text().await?;
        let price = parse_spot_body(&body)?;
        debug!(asset, currency, price, "[QUOTE] spot price fetched");
        Ok(price)
    }
}

/// Extract the spot price from a Coinbase response body.
fn parse_spot_body(body: &str) -> Result<f64> {
    let parsed: SpotMsg = serde_json::from_str(body)?;
    let price: f64 = parsed.data.amount.trim().parse()?;
    if !price.is_finite() || price <= 0.0 {
        return Err(AppError::Quote(format!("non-positive spot price {price}")));
    }
    Ok(price)
}

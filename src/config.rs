//! Configuration loader and application settings.

use crate::errors::{AppError, Result};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const DEFAULT_QUOTE_BASE_URL: &str = "https://api.coinbase.com/v2";
pub const DEFAULT_QUOTE_CURRENCY: &str = "USD";
pub const DEFAULT_QUOTE_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_MAX_SIMULATIONS: u32 = 10_000;

/// Consolidated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the spot quote service (Coinbase v2 API shape).
    pub quote_base_url: Url,
    /// Reference currency both assets are quoted against.
    pub quote_currency: String,
    /// Upper bound for both live quote fetches together.
    pub quote_timeout_ms: u64,
    /// Largest `simulations` value a trade intent may request.
    pub max_simulations: u32,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to defaults
    /// for anything unset.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("QUOTE_BASE_URL").unwrap_or_else(|| DEFAULT_QUOTE_BASE_URL.into());
        let quote_base_url = Url::parse(raw_url.trim_end_matches('/'))?;
        let quote_currency = lookup("QUOTE_CURRENCY")
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_QUOTE_CURRENCY.into());
        let quote_timeout_ms =
            parse_var(&lookup, "QUOTE_TIMEOUT_MS")?.unwrap_or(DEFAULT_QUOTE_TIMEOUT_MS);
        let max_simulations =
            parse_var(&lookup, "MAX_SIMULATIONS")?.unwrap_or(DEFAULT_MAX_SIMULATIONS);
        let seed = parse_var(&lookup, "SIM_SEED")?;

        if quote_timeout_ms == 0 {
            return Err(AppError::Config("QUOTE_TIMEOUT_MS must be positive".into()));
        }
        if max_simulations == 0 {
            return Err(AppError::Config("MAX_SIMULATIONS must be positive".into()));
        }

        Ok(Self {
            quote_base_url,
            quote_currency,
            quote_timeout_ms,
            max_simulations,
            seed,
        })
    }

    /// Defaults only; no environment lookup.
    pub fn defaults() -> Result<Self> {
        Self::from_lookup(|_| None)
    }

    pub fn quote_timeout(&self) -> Duration {
        Duration::from_millis(self.quote_timeout_ms)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AppError::Config(format!("{key}={raw:?}: {e}"))),
        None => Ok(None),
    }
}

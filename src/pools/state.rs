use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fewest pools a snapshot may hold (the optimizer splits across two).
pub const MIN_POOLS: usize = 2;
/// Most pools a snapshot may hold. The arbitrage search is cubic in this.
pub const MAX_POOLS: usize = 8;

/// Market attributes of a single pool at snapshot time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoolState {
    /// Quote units per base unit.
    pub price: f64,
    /// Fractional trading fee in `[0, 1)`.
    pub fee: f64,
    /// Fixed cost per use, in quote-asset units.
    #[serde(rename = "gas")]
    pub gas_cost: f64,
    /// Capacity hint; advisory only.
    pub liquidity: u64,
}

impl PoolState {
    pub fn new(price: f64, fee: f64, gas_cost: f64, liquidity: u64) -> Self {
        Self {
            price,
            fee,
            gas_cost,
            liquidity,
        }
    }

    /// Price after the pool fee is taken.
    pub fn effective_price(&self) -> f64 {
        self.price * (1.0 - self.fee)
    }

    /// Effective price per unit of gas. A free pool ranks above everything.
    pub fn effective_per_gas(&self) -> f64 {
        if self.gas_cost > 0.0 {
            self.effective_price() / self.gas_cost
        } else {
            f64::INFINITY
        }
    }

    fn check(&self, id: &str) -> Result<()> {
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(AppError::InvalidSnapshot(format!(
                "{id}: price must be positive, got {}",
                self.price
            )));
        }
        if !(0.0..1.0).contains(&self.fee) {
            return Err(AppError::InvalidSnapshot(format!(
                "{id}: fee must be in [0, 1), got {}",
                self.fee
            )));
        }
        if !self.gas_cost.is_finite() || self.gas_cost < 0.0 {
            return Err(AppError::InvalidSnapshot(format!(
                "{id}: gas cost must be non-negative, got {}",
                self.gas_cost
            )));
        }
        Ok(())
    }
}

/// Immutable mapping of pool id to state, iterated in id order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, PoolState>", into = "BTreeMap<String, PoolState>")]
pub struct PoolSnapshot {
    pools: BTreeMap<String, PoolState>,
}

impl PoolSnapshot {
    pub fn new(pools: BTreeMap<String, PoolState>) -> Result<Self> {
        if pools.len() < MIN_POOLS || pools.len() > MAX_POOLS {
            return Err(AppError::InvalidSnapshot(format!(
                "expected {MIN_POOLS}..={MAX_POOLS} pools, got {}",
                pools.len()
            )));
        }
        for (id, state) in &pools {
            if id.is_empty() || id.contains(':') {
                return Err(AppError::InvalidSnapshot(format!("bad pool id {id:?}")));
            }
            state.check(id)?;
        }
        Ok(Self { pools })
    }

    /// Skip validation for pools built from known-good constant ranges.
    pub(crate) fn from_trusted(pools: BTreeMap<String, PoolState>) -> Self {
        debug_assert!(Self::new(pools.clone()).is_ok());
        Self { pools }
    }

    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, PoolState)>,
        S: Into<String>,
    {
        Self::new(pairs.into_iter().map(|(id, s)| (id.into(), s)).collect())
    }

    pub fn get(&self, id: &str) -> Option<&PoolState> {
        self.pools.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.pools.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.pools.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PoolState)> {
        self.pools.iter().map(|(id, s)| (id.as_str(), s))
    }

    /// First pool (in id order) with the strictly greatest `score`.
    pub fn best_by<F>(&self, score: F) -> (&str, &PoolState)
    where
        F: Fn(&PoolState) -> f64,
    {
        let mut iter = self.iter();
        // Construction guarantees at least MIN_POOLS entries.
        let mut best = iter.next().unwrap_or_else(|| unreachable!("snapshot is never empty"));
        let mut best_score = score(best.1);
        for (id, state) in iter {
            let s = score(state);
            if s > best_score {
                best = (id, state);
                best_score = s;
            }
        }
        best
    }
}

impl TryFrom<BTreeMap<String, PoolState>> for PoolSnapshot {
    type Error = AppError;

    fn try_from(pools: BTreeMap<String, PoolState>) -> Result<Self> {
        Self::new(pools)
    }
}

impl From<PoolSnapshot> for BTreeMap<String, PoolState> {
    fn from(snapshot: PoolSnapshot) -> Self {
        snapshot.pools
    }
}

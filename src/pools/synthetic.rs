use crate::pools::state::{PoolSnapshot, PoolState};
use rand::Rng;

/// Sampling ranges for one synthetic pool.
struct SyntheticProfile {
    id: &'static str,
    price: (f64, f64),
    fee: (f64, f64),
    gas: (f64, f64),
    liquidity: (u64, u64),
}

/// Per-pool profile applied around a live cross price.
struct LiveProfile {
    id: &'static str,
    spread: (f64, f64),
    fee: f64,
    gas: f64,
    liquidity: (u64, u64),
}

// Ranges differ slightly per pool so the strategies disagree.
const SYNTHETIC_POOLS: [SyntheticProfile; 3] = [
    SyntheticProfile {
        id: "poolA",
        price: (0.055, 0.061),
        fee: (0.001, 0.005),
        gas: (0.0001, 0.00015),
        liquidity: (100, 500),
    },
    SyntheticProfile {
        id: "poolB",
        price: (0.054, 0.06),
        fee: (0.0002, 0.002),
        gas: (0.00012, 0.00018),
        liquidity: (80, 400),
    },
    SyntheticProfile {
        id: "poolC",
        price: (0.053, 0.062),
        fee: (0.001, 0.003),
        gas: (0.00009, 0.00014),
        liquidity: (150, 600),
    },
];

const LIVE_POOLS: [LiveProfile; 3] = [
    LiveProfile {
        id: "poolA",
        spread: (0.99, 1.01),
        fee: 0.002,
        gas: 0.00012,
        liquidity: (200, 700),
    },
    LiveProfile {
        id: "poolB",
        spread: (0.98, 1.02),
        fee: 0.001,
        gas: 0.00015,
        liquidity: (150, 500),
    },
    LiveProfile {
        id: "poolC",
        spread: (0.97, 1.03),
        fee: 0.0015,
        gas: 0.0001,
        liquidity: (300, 900),
    },
];

/// Draw a fresh synthetic snapshot of `poolA`, `poolB` and `poolC`.
pub fn synthetic_snapshot<R: Rng>(rng: &mut R) -> PoolSnapshot {
    let pools = SYNTHETIC_POOLS.iter().map(|p| {
        let state = PoolState::new(
            rng.gen_range(p.price.0..p.price.1),
            rng.gen_range(p.fee.0..p.fee.1),
            rng.gen_range(p.gas.0..p.gas.1),
            rng.gen_range(p.liquidity.0..=p.liquidity.1),
        );
        (p.id.to_string(), state)
    });
    PoolSnapshot::from_trusted(pools.collect())
}

/// Build a snapshot around a live `cross_price`, perturbing it per pool.
pub fn live_snapshot<R: Rng>(
    cross_price: f64,
    rng: &mut R,
) -> crate::errors::Result<PoolSnapshot> {
    let pools = LIVE_POOLS.iter().map(|p| {
        let state = PoolState::new(
            cross_price * rng.gen_range(p.spread.0..p.spread.1),
            p.fee,
            p.gas,
            rng.gen_range(p.liquidity.0..=p.liquidity.1),
        );
        (p.id.to_string(), state)
    });
    PoolSnapshot::new(pools.collect())
}

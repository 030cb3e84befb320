//! Competing routing strategies.
//!
//! Every solver sees the same snapshot and trade amount. Route choice is a
//! pure function of the snapshot; only latency and the naive solver's noise
//! draw from the RNG.

use crate::models::SolverResult;
use crate::pools::{PoolSnapshot, PoolState};
use rand::Rng;
use rand::rngs::StdRng;

pub mod arbitrage;
pub mod custom;
pub mod optimizer;
pub mod single;

pub use arbitrage::ArbitrageSolver;
pub use custom::CustomSolver;
pub use optimizer::OptimizerSolver;
pub use single::{BalancedSolver, GreedySolver, NaiveSolver};

pub trait Solver: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(&self, amount: f64, pools: &PoolSnapshot, rng: &mut StdRng) -> SolverResult;
}

/// The fixed strategies in evaluation order, plus the custom one when logic
/// is supplied. Ties between solvers go to the earlier entry.
pub fn solver_set(custom_logic: Option<&str>) -> Vec<Box<dyn Solver>> {
    let mut solvers: Vec<Box<dyn Solver>> = vec![
        Box::new(NaiveSolver),
        Box::new(OptimizerSolver),
        Box::new(ArbitrageSolver),
        Box::new(GreedySolver),
        Box::new(BalancedSolver),
    ];
    if let Some(logic) = custom_logic {
        solvers.push(Box::new(CustomSolver::new(logic)));
    }
    solvers
}

/// Latency in milliseconds drawn uniformly from `range`.
pub(crate) fn latency(rng: &mut StdRng, range: (f64, f64)) -> f64 {
    rng.gen_range(range.0..range.1)
}

/// Result for a whole-amount trade through a single pool.
pub(crate) fn single_pool_result(
    solver: &str,
    amount: f64,
    id: &str,
    state: &PoolState,
    profit_rate: f64,
    latency_ms: f64,
) -> SolverResult {
    let received = amount * state.effective_price();
    SolverResult {
        solver: solver.to_string(),
        received_amount: received,
        route: vec![id.to_string()],
        gas_cost: state.gas_cost,
        solver_profit: received * profit_rate,
        latency_ms,
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::pools::{PoolSnapshot, PoolState};

    /// poolA: highest raw and effective price, cheapest gas.
    pub fn scenario() -> PoolSnapshot {
        PoolSnapshot::from_pairs([
            ("poolA", PoolState::new(0.06, 0.001, 0.0001, 100)),
            ("poolB", PoolState::new(0.055, 0.002, 0.00015, 100)),
            ("poolC", PoolState::new(0.058, 0.0015, 0.00012, 100)),
        ])
        .unwrap()
    }

    /// Raw price, effective price and price-per-gas all disagree.
    pub fn divergent() -> PoolSnapshot {
        PoolSnapshot::from_pairs([
            // highest raw price, heavy fee
            ("poolA", PoolState::new(0.062, 0.08, 0.00013, 100)),
            // best effective price, expensive gas
            ("poolB", PoolState::new(0.060, 0.001, 0.0003, 100)),
            // mediocre price, very cheap gas
            ("poolC", PoolState::new(0.058, 0.002, 0.00005, 100)),
        ])
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn solver_order_and_names() {
        let names: Vec<&str> = solver_set(None).iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "naiveSolver",
                "optimizerSolver",
                "arbitrageSolver",
                "greedySolver",
                "balancedSolver"
            ]
        );
        let with_custom = solver_set(Some("best_pool = 'poolA'"));
        assert_eq!(with_custom.len(), 6);
        assert_eq!(with_custom[5].name(), "customSolver");
    }

    #[test]
    fn routes_only_reference_snapshot_pools() {
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..50 {
            let snap = crate::pools::synthetic_snapshot(&mut rng);
            for solver in solver_set(Some("best_pool = best_by(liquidity)")) {
                let r = solver.solve(100.0, &snap, &mut rng);
                assert!(!r.route.is_empty());
                assert!(r.route.iter().all(|id| snap.contains(id)), "{r:?}");
                assert!(r.received_amount >= 0.0);
                assert!(r.gas_cost >= 0.0);
                assert!(r.solver_profit >= 0.0);
                assert!(r.latency_ms >= 0.0);
            }
        }
    }
}

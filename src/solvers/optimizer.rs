use super::{Solver, latency};
use crate::models::SolverResult;
use crate::pools::{PoolSnapshot, PoolState};
use rand::rngs::StdRng;

/// Splits the trade evenly across the two best effective prices.
pub struct OptimizerSolver;

const SPLIT: [f64; 2] = [0.5, 0.5];

impl Solver for OptimizerSolver {
    fn name(&self) -> &'static str {
        "optimizerSolver"
    }

    fn solve(&self, amount: f64, pools: &PoolSnapshot, rng: &mut StdRng) -> SolverResult {
        let mut ranked: Vec<(&str, &PoolState)> = pools.iter().collect();
        // Stable sort: equal effective prices keep snapshot order.
        ranked.sort_by(|a, b| b.1.effective_price().total_cmp(&a.1.effective_price()));
        let legs = &ranked[..SPLIT.len()];

        let received: f64 = legs
            .iter()
            .zip(SPLIT)
            .map(|((_, state), share)| amount * share * state.effective_price())
            .sum();
        let gas_cost = legs.iter().map(|(_, s)| s.gas_cost).sum::<f64>() / legs.len() as f64;

        SolverResult {
            solver: self.name().to_string(),
            received_amount: received,
            route: legs.iter().map(|(id, _)| id.to_string()).collect(),
            gas_cost,
            solver_profit: received * 0.0004,
            latency_ms: latency(rng, (100.0, 300.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::fixtures::{divergent, scenario};
    use rand::SeedableRng;

    #[test]
    fn splits_across_top_two_in_rank_order() {
        let pools = scenario();
        let mut rng = StdRng::seed_from_u64(1);
        let r = OptimizerSolver.solve(100.0, &pools, &mut rng);
        // effective: A 0.05994, C 0.057913, B 0.05489
        assert_eq!(r.route, vec!["poolA", "poolC"]);
        let expected = 50.0 * 0.06 * 0.999 + 50.0 * 0.058 * 0.9985;
        assert!((r.received_amount - expected).abs() < 1e-12);
        assert!((r.gas_cost - (0.0001 + 0.00012) / 2.0).abs() < 1e-15);
        assert!((r.solver_profit - expected * 0.0004).abs() < 1e-12);
        assert!((100.0..300.0).contains(&r.latency_ms));
    }

    #[test]
    fn rank_order_follows_effective_not_raw_price() {
        let pools = divergent();
        let mut rng = StdRng::seed_from_u64(2);
        // effective: B 0.05994, C 0.057884, A 0.05704
        assert_eq!(OptimizerSolver.solve(1.0, &pools, &mut rng).route, vec!["poolB", "poolC"]);
    }

    #[test]
    fn ties_keep_snapshot_order() {
        let pools = PoolSnapshot::from_pairs([
            ("p1", PoolState::new(1.0, 0.0, 0.0, 0)),
            ("p2", PoolState::new(2.0, 0.0, 0.0, 0)),
            ("p3", PoolState::new(2.0, 0.0, 0.0, 0)),
        ])
        .unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(OptimizerSolver.solve(1.0, &pools, &mut rng).route, vec!["p2", "p3"]);
    }
}

use super::{Solver, latency, single_pool_result};
use crate::models::SolverResult;
use crate::pools::PoolSnapshot;
use rand::Rng;
use rand::rngs::StdRng;

/// Best effective price, with a little symmetric noise on the payout.
pub struct NaiveSolver;

/// Highest raw price, fee ignored when choosing.
pub struct GreedySolver;

/// Best effective price per unit of gas.
pub struct BalancedSolver;

const NAIVE_NOISE: f64 = 0.0005;

impl Solver for NaiveSolver {
    fn name(&self) -> &'static str {
        "naiveSolver"
    }

    fn solve(&self, amount: f64, pools: &PoolSnapshot, rng: &mut StdRng) -> SolverResult {
        let (id, state) = pools.best_by(|s| s.effective_price());
        let noisy_price = state.effective_price() + rng.gen_range(-NAIVE_NOISE..NAIVE_NOISE);
        let received = (amount * noisy_price).max(0.0);
        SolverResult {
            solver: self.name().to_string(),
            received_amount: received,
            route: vec![id.to_string()],
            gas_cost: state.gas_cost,
            solver_profit: received * 0.0002,
            latency_ms: latency(rng, (50.0, 200.0)),
        }
    }
}

impl Solver for GreedySolver {
    fn name(&self) -> &'static str {
        "greedySolver"
    }

    fn solve(&self, amount: f64, pools: &PoolSnapshot, rng: &mut StdRng) -> SolverResult {
        let (id, state) = pools.best_by(|s| s.price);
        let latency_ms = latency(rng, (30.0, 100.0));
        single_pool_result(self.name(), amount, id, state, 0.0006, latency_ms)
    }
}

impl Solver for BalancedSolver {
    fn name(&self) -> &'static str {
        "balancedSolver"
    }

    fn solve(&self, amount: f64, pools: &PoolSnapshot, rng: &mut StdRng) -> SolverResult {
        let (id, state) = pools.best_by(|s| s.effective_per_gas());
        let latency_ms = latency(rng, (80.0, 150.0));
        single_pool_result(self.name(), amount, id, state, 0.0003, latency_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::fixtures::{divergent, scenario};
    use rand::SeedableRng;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn scenario_choices() {
        let pools = scenario();
        let mut rng = StdRng::seed_from_u64(1);

        let greedy = GreedySolver.solve(100.0, &pools, &mut rng);
        assert_eq!(greedy.route, vec!["poolA"]);
        assert!(close(greedy.received_amount, 100.0 * 0.06 * 0.999));
        assert!(close(greedy.solver_profit, greedy.received_amount * 0.0006));
        assert_eq!(greedy.gas_cost, 0.0001);

        // price*(1-fee)/gas: A 599.4, B 365.9, C 482.6
        let balanced = BalancedSolver.solve(100.0, &pools, &mut rng);
        assert_eq!(balanced.route, vec!["poolA"]);
        assert!(close(balanced.solver_profit, balanced.received_amount * 0.0003));
    }

    #[test]
    fn divergent_snapshot_splits_choices() {
        let pools = divergent();
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(GreedySolver.solve(1.0, &pools, &mut rng).route, vec!["poolA"]);
        assert_eq!(NaiveSolver.solve(1.0, &pools, &mut rng).route, vec!["poolB"]);
        assert_eq!(BalancedSolver.solve(1.0, &pools, &mut rng).route, vec!["poolC"]);
    }

    #[test]
    fn naive_noise_is_bounded() {
        let pools = scenario();
        let mut rng = StdRng::seed_from_u64(3);
        let exact = 100.0 * 0.06 * 0.999;
        for _ in 0..500 {
            let r = NaiveSolver.solve(100.0, &pools, &mut rng);
            assert!((r.received_amount - exact).abs() <= 100.0 * NAIVE_NOISE);
            assert!((50.0..200.0).contains(&r.latency_ms));
        }
    }

    #[test]
    fn latency_ranges() {
        let pools = scenario();
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..200 {
            assert!((30.0..100.0).contains(&GreedySolver.solve(1.0, &pools, &mut rng).latency_ms));
            assert!((80.0..150.0).contains(&BalancedSolver.solve(1.0, &pools, &mut rng).latency_ms));
        }
    }
}

use super::{Solver, latency, single_pool_result};
use crate::models::SolverResult;
use crate::policy::{Policy, PolicyError};
use crate::pools::PoolSnapshot;
use rand::rngs::StdRng;
use tracing::{debug, warn};

/// Request-supplied policy choosing a single pool.
///
/// The policy is compiled once per request. Any compile or runtime failure
/// yields [`SolverResult::zero`] for that round and nothing else.
pub struct CustomSolver {
    policy: Result<Policy, PolicyError>,
}

impl CustomSolver {
    pub fn new(logic: &str) -> Self {
        let policy = Policy::compile(logic);
        if let Err(e) = &policy {
            warn!(error = %e, "[CUSTOM] policy rejected, custom solver will score zero");
        }
        Self { policy }
    }

    fn try_solve(
        &self,
        amount: f64,
        pools: &PoolSnapshot,
        rng: &mut StdRng,
    ) -> Result<SolverResult, PolicyError> {
        let policy = self.policy.as_ref().map_err(Clone::clone)?;
        let (id, state) = match policy.choose(pools, amount, rng)? {
            Some(id) => {
                let state = pools
                    .get(&id)
                    .ok_or_else(|| PolicyError::UnknownPool(id.clone()))?;
                (id, state)
            }
            // Unassigned output falls back to the highest raw price.
            None => {
                let (id, state) = pools.best_by(|s| s.price);
                (id.to_string(), state)
            }
        };
        let latency_ms = latency(rng, (50.0, 150.0));
        Ok(single_pool_result(self.name(), amount, &id, state, 0.0003, latency_ms))
    }
}

impl Solver for CustomSolver {
    fn name(&self) -> &'static str {
        "customSolver"
    }

    fn solve(&self, amount: f64, pools: &PoolSnapshot, rng: &mut StdRng) -> SolverResult {
        match self.try_solve(amount, pools, rng) {
            Ok(result) => result,
            Err(e) => {
                debug!(error = %e, "[CUSTOM] policy failed this round");
                SolverResult::zero(self.name())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ERROR_ROUTE;
    use crate::solvers::fixtures::{divergent, scenario};
    use rand::SeedableRng;

    fn solve(logic: &str) -> SolverResult {
        let mut rng = StdRng::seed_from_u64(8);
        CustomSolver::new(logic).solve(100.0, &scenario(), &mut rng)
    }

    #[test]
    fn chosen_pool_is_priced() {
        let r = solve("best_pool = 'poolB'");
        assert_eq!(r.solver, "customSolver");
        assert_eq!(r.route, vec!["poolB"]);
        assert!((r.received_amount - 100.0 * 0.055 * 0.998).abs() < 1e-12);
        assert!((r.solver_profit - r.received_amount * 0.0003).abs() < 1e-15);
        assert_eq!(r.gas_cost, 0.00015);
        assert!((50.0..150.0).contains(&r.latency_ms));
    }

    #[test]
    fn unassigned_output_falls_back_to_highest_raw_price() {
        let mut rng = StdRng::seed_from_u64(9);
        let r = CustomSolver::new("let x = amount").solve(1.0, &divergent(), &mut rng);
        assert_eq!(r.route, vec!["poolA"]);
    }

    #[test]
    fn failures_yield_exact_zero_result() {
        let zero = SolverResult::zero("customSolver");
        // runtime error
        assert_eq!(solve("best_pool = 1 / 0"), zero);
        // unknown pool
        assert_eq!(solve("best_pool = 'poolZ'"), zero);
        // not a string
        assert_eq!(solve("best_pool = 42"), zero);
        // does not parse
        assert_eq!(solve("raise Exception('boom')"), zero);
        // arbitrary code is not a thing
        assert_eq!(solve("__import__('os').system('true')"), zero);
        assert_eq!(zero.route, vec![ERROR_ROUTE]);
    }

    #[test]
    fn hostile_policies_score_zero_instead_of_crashing() {
        let zero = SolverResult::zero("customSolver");
        let chain = format!("best_pool = {}1", "1+".repeat(2040));
        assert_eq!(solve(&chain), zero);
        assert_eq!(solve("best_pool = if uniform(-1e308, 1e308) > 0 then 'poolA' else 'poolB'"), zero);
    }

    #[test]
    fn random_policies_use_the_round_rng() {
        let solver = CustomSolver::new("best_pool = if random() < 0.5 then 'poolA' else 'poolC'");
        let mut rng = StdRng::seed_from_u64(10);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..100 {
            seen.insert(solver.solve(1.0, &scenario(), &mut rng).route[0].clone());
        }
        assert_eq!(seen.into_iter().collect::<Vec<_>>(), vec!["poolA", "poolC"]);
    }
}

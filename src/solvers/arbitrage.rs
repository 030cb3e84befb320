use super::{Solver, latency};
use crate::models::SolverResult;
use crate::pools::{MAX_POOLS, PoolSnapshot, PoolState};
use rand::rngs::StdRng;

/// Exhaustive search over three-hop routes `a -> b -> c` with `a != b` and
/// `b != c`, compounding the amount through each hop. Work is `n^3` in the
/// pool count, which `PoolSnapshot` caps at `MAX_POOLS`.
///
/// Compounding only pays when effective prices exceed one; below that the
/// best triple receives less than any single-pool route.
pub struct ArbitrageSolver;

/// Candidate routes as pool indices.
fn candidate_routes(n: usize) -> impl Iterator<Item = [usize; 3]> {
    (0..n).flat_map(move |a| {
        (0..n)
            .filter(move |&b| b != a)
            .flat_map(move |b| (0..n).filter(move |&c| c != b).map(move |c| [a, b, c]))
    })
}

impl Solver for ArbitrageSolver {
    fn name(&self) -> &'static str {
        "arbitrageSolver"
    }

    fn solve(&self, amount: f64, pools: &PoolSnapshot, rng: &mut StdRng) -> SolverResult {
        debug_assert!(pools.len() <= MAX_POOLS);
        let legs: Vec<(&str, &PoolState)> = pools.iter().collect();

        let mut hops = [0, 1, 0];
        let mut received = f64::NEG_INFINITY;
        for route in candidate_routes(legs.len()) {
            let out = route
                .iter()
                .fold(amount, |acc, &i| acc * legs[i].1.effective_price());
            if out > received {
                received = out;
                hops = route;
            }
        }
        let gas_cost = hops.iter().map(|&i| legs[i].1.gas_cost).sum::<f64>() / 3.0;

        SolverResult {
            solver: self.name().to_string(),
            received_amount: received,
            route: hops.iter().map(|&i| legs[i].0.to_string()).collect(),
            gas_cost,
            solver_profit: received * 0.0005,
            latency_ms: latency(rng, (200.0, 400.0)),
        }
    }
}

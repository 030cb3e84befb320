//! Round runner: one snapshot, N rounds, one report.

use crate::aggregator::Aggregator;
use crate::cex::CoinbaseClient;
use crate::config::AppConfig;
use crate::models::{AggregateReport, RoundResult, TradeIntent};
use crate::pools::{PoolSnapshot, SnapshotProvider};
use crate::solvers::{Solver, solver_set};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, info};

/// Rounds between cooperative yields in [`Simulator::run`].
pub const YIELD_EVERY: u32 = 64;

/// Every solver against the same snapshot, in evaluation order.
pub fn play_round(
    solvers: &[Box<dyn Solver>],
    amount: f64,
    pools: &PoolSnapshot,
    rng: &mut StdRng,
) -> RoundResult {
    solvers.iter().map(|s| s.solve(amount, pools, rng)).collect()
}

/// Run `intent.simulations` rounds against a fixed snapshot.
pub fn simulate(intent: &TradeIntent, pools: PoolSnapshot, rng: &mut StdRng) -> AggregateReport {
    let mut session = Session::new(intent, &pools);
    while session.step(&pools, rng).is_some() {}
    session.finish(pools)
}

/// Owns the snapshot provider and the RNG shared by successive requests.
pub struct Simulator {
    provider: SnapshotProvider,
    rng: StdRng,
}

impl Simulator {
    pub fn new(provider: SnapshotProvider, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { provider, rng }
    }

    /// Simulator backed by the Coinbase spot API described by `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        let source = Arc::new(CoinbaseClient::new(config.quote_base_url.clone()));
        let provider =
            SnapshotProvider::new(source, &config.quote_currency, config.quote_timeout());
        Self::new(provider, config.seed)
    }

    /// Simulate one request. Yields to the scheduler every [`YIELD_EVERY`]
    /// rounds so dropping the future abandons the loop.
    pub async fn run(&mut self, intent: &TradeIntent) -> AggregateReport {
        let pools = self.provider.snapshot(intent, &mut self.rng).await;
        let mut session = Session::new(intent, &pools);
        while let Some(round) = session.step(&pools, &mut self.rng) {
            if (round + 1) % YIELD_EVERY == 0 {
                tokio::task::yield_now().await;
            }
        }
        session.finish(pools)
    }
}

/// Solvers and counters for one request, advanced a round at a time.
struct Session {
    solvers: Vec<Box<dyn Solver>>,
    agg: Aggregator,
    amount: f64,
    rounds: Range<u32>,
}

impl Session {
    fn new(intent: &TradeIntent, pools: &PoolSnapshot) -> Self {
        let solvers = solver_set(intent.custom_logic.as_deref());
        let names: Vec<&str> = solvers.iter().map(|s| s.name()).collect();
        info!(
            solvers = names.len(),
            pools = pools.len(),
            rounds = intent.simulations,
            "[INIT] round loop starting"
        );
        let agg = Aggregator::new(&names, pools);
        Self {
            solvers,
            agg,
            amount: intent.amount,
            rounds: 0..intent.simulations,
        }
    }

    /// Play the next round. `None` once every round has been played.
    fn step(&mut self, pools: &PoolSnapshot, rng: &mut StdRng) -> Option<u32> {
        let round = self.rounds.next()?;
        let results = play_round(&self.solvers, self.amount, pools, rng);
        if let Some(w) = self.agg.record(results) {
            debug!(round, winner = self.solvers[w].name(), "[ROUND] winner selected");
        }
        Some(round)
    }

    fn finish(self, pools: PoolSnapshot) -> AggregateReport {
        let report = self.agg.finish(pools);
        info!(
            rounds = report.history.len(),
            win_rate = ?report.win_rate,
            "[REPORT] simulation complete"
        );
        report
    }
}

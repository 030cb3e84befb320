//! Request-scoped accumulation of round outcomes.

use crate::models::{AggregateReport, RoundResult, SolverResult};
use crate::pools::PoolSnapshot;
use std::collections::BTreeMap;
use tracing::debug;

/// Separator tolerated in decorated route entries such as `poolA:v3`.
pub const ROUTE_ID_SEPARATOR: char = ':';

/// Index of the round's winner: strictly highest received amount, earliest
/// solver on ties. `None` only for an empty round.
pub fn select_winner(round: &[SolverResult]) -> Option<usize> {
    let mut winner: Option<usize> = None;
    for (i, result) in round.iter().enumerate() {
        match winner {
            Some(w) if result.received_amount <= round[w].received_amount => {}
            _ => winner = Some(i),
        }
    }
    winner
}

/// Pool id part of a route entry.
pub fn pool_id(entry: &str) -> &str {
    entry.split(ROUTE_ID_SEPARATOR).next().unwrap_or(entry)
}

/// Win counts, pool usage and streaks across the rounds of one request.
#[derive(Debug, Clone)]
pub struct Aggregator {
    solvers: Vec<String>,
    wins: Vec<u64>,
    current_streak: Vec<u64>,
    longest_streak: Vec<u64>,
    pool_usage: BTreeMap<String, u64>,
    history: Vec<RoundResult>,
}

impl Aggregator {
    /// Zeroed counters for `solvers` (in evaluation order) over `pools`.
    pub fn new<S: AsRef<str>>(solvers: &[S], pools: &PoolSnapshot) -> Self {
        let n = solvers.len();
        Self {
            solvers: solvers.iter().map(|s| s.as_ref().to_string()).collect(),
            wins: vec![0; n],
            current_streak: vec![0; n],
            longest_streak: vec![0; n],
            pool_usage: pools.ids().map(|id| (id.to_string(), 0)).collect(),
            history: Vec::new(),
        }
    }

    pub fn rounds(&self) -> usize {
        self.history.len()
    }

    /// Fold one round in and return the winner's solver index.
    pub fn record(&mut self, round: RoundResult) -> Option<usize> {
        let winner = select_winner(&round);
        let slot = winner.and_then(|i| self.solvers.iter().position(|n| *n == round[i].solver));

        if let (Some(i), Some(w)) = (winner, slot) {
            self.wins[w] += 1;
            for entry in &round[i].route {
                match self.pool_usage.get_mut(pool_id(entry)) {
                    Some(count) => *count += 1,
                    None => debug!(entry = %entry, "[ROUND] route entry is not a snapshot pool"),
                }
            }
        }
        for i in 0..self.solvers.len() {
            if Some(i) == slot {
                self.current_streak[i] += 1;
                self.longest_streak[i] = self.longest_streak[i].max(self.current_streak[i]);
            } else {
                self.current_streak[i] = 0;
            }
        }

        self.history.push(round);
        slot
    }

    pub fn finish(self, pools: PoolSnapshot) -> AggregateReport {
        let rounds = self.history.len();
        let win_rate = self
            .solvers
            .iter()
            .zip(&self.wins)
            .map(|(name, &wins)| {
                let rate = if rounds == 0 {
                    0.0
                } else {
                    wins as f64 / rounds as f64 * 100.0
                };
                (name.clone(), rate)
            })
            .collect();
        let win_streaks = self
            .solvers
            .iter()
            .cloned()
            .zip(self.longest_streak.iter().copied())
            .collect();
        let last_run = self
            .history
            .last()
            .map(|round| {
                round
                    .iter()
                    .map(|r| (r.solver.clone(), r.clone()))
                    .collect()
            })
            .unwrap_or_default();

        AggregateReport {
            last_run,
            win_rate,
            pool_usage: self.pool_usage,
            win_streaks,
            history: self.history,
            pools,
        }
    }
}

//! Shared data structures used throughout the application.

use crate::errors::{AppError, Result};
use crate::policy::MAX_SOURCE_LEN;
use crate::pools::PoolSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_simulations() -> u32 {
    1
}

/// Description of the hypothetical trade every solver competes on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeIntent {
    pub from_token: String,
    pub to_token: String,
    pub amount: f64,
    /// Accepted for compatibility; no solver enforces it.
    #[serde(default)]
    pub max_slippage: f64,
    #[serde(default = "default_simulations", alias = "simulation_count")]
    pub simulations: u32,
    #[serde(default)]
    pub custom_logic: Option<String>,
    #[serde(default)]
    pub use_live: bool,
}

impl TradeIntent {
    pub fn new(from_token: &str, to_token: &str, amount: f64) -> Self {
        Self {
            from_token: from_token.to_string(),
            to_token: to_token.to_string(),
            amount,
            max_slippage: 0.0,
            simulations: 1,
            custom_logic: None,
            use_live: false,
        }
    }

    pub fn with_simulations(mut self, simulations: u32) -> Self {
        self.simulations = simulations;
        self
    }

    pub fn with_custom_logic(mut self, logic: &str) -> Self {
        self.custom_logic = Some(logic.to_string());
        self
    }

    pub fn with_live(mut self, use_live: bool) -> Self {
        self.use_live = use_live;
        self
    }

    /// Reject intents the simulator cannot score meaningfully.
    pub fn validate(&self, max_simulations: u32) -> Result<()> {
        if self.from_token.trim().is_empty() || self.to_token.trim().is_empty() {
            return Err(AppError::InvalidIntent("token symbols must be non-empty".into()));
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(AppError::InvalidIntent(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        if self.simulations == 0 || self.simulations > max_simulations {
            return Err(AppError::InvalidIntent(format!(
                "simulations must be within 1..={max_simulations}, got {}",
                self.simulations
            )));
        }
        if let Some(logic) = &self.custom_logic {
            if logic.len() > MAX_SOURCE_LEN {
                return Err(AppError::InvalidIntent(format!(
                    "custom logic exceeds {MAX_SOURCE_LEN} bytes"
                )));
            }
        }
        Ok(())
    }
}

/// One solver's proposed route and its simulated outcome for a single round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverResult {
    pub solver: String,
    pub received_amount: f64,
    pub route: Vec<String>,
    pub gas_cost: f64,
    /// Derived fee the solver would earn; not charged to the trade.
    pub solver_profit: f64,
    /// Synthetic, cosmetic.
    pub latency_ms: f64,
}

/// Route entry reported when a solver could not produce a route.
pub const ERROR_ROUTE: &str = "error";

impl SolverResult {
    /// Well-defined result for a solver whose evaluation failed.
    pub fn zero(solver: &str) -> Self {
        Self {
            solver: solver.to_string(),
            received_amount: 0.0,
            route: vec![ERROR_ROUTE.to_string()],
            gas_cost: 0.0,
            solver_profit: 0.0,
            latency_ms: 0.0,
        }
    }
}

/// Results of every active solver for one round, in evaluation order.
pub type RoundResult = Vec<SolverResult>;

/// Final summary of one simulation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub last_run: BTreeMap<String, SolverResult>,
    pub win_rate: BTreeMap<String, f64>,
    pub pool_usage: BTreeMap<String, u64>,
    pub win_streaks: BTreeMap<String, u64>,
    pub history: Vec<RoundResult>,
    pub pools: PoolSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_defaults_apply() {
        let raw = r#"{"from_token":"ETH","to_token":"BTC","amount":100.0,"max_slippage":0.5}"#;
        let intent: TradeIntent = serde_json::from_str(raw).unwrap();
        assert_eq!(intent.simulations, 1);
        assert!(intent.custom_logic.is_none());
        assert!(!intent.use_live);
    }

    #[test]
    fn intent_accepts_simulation_count_alias() {
        let raw = r#"{"from_token":"ETH","to_token":"BTC","amount":1.0,"simulation_count":7}"#;
        let intent: TradeIntent = serde_json::from_str(raw).unwrap();
        assert_eq!(intent.simulations, 7);
    }

    #[test]
    fn validate_rejects_bad_intents() {
        let ok = TradeIntent::new("ETH", "BTC", 10.0);
        assert!(ok.validate(100).is_ok());

        assert!(TradeIntent::new("ETH", "BTC", 0.0).validate(100).is_err());
        assert!(TradeIntent::new("ETH", "BTC", f64::NAN).validate(100).is_err());
        assert!(TradeIntent::new("", "BTC", 1.0).validate(100).is_err());
        assert!(ok.clone().with_simulations(0).validate(100).is_err());
        assert!(ok.clone().with_simulations(101).validate(100).is_err());

        let huge = "x".repeat(MAX_SOURCE_LEN + 1);
        let err = ok.with_custom_logic(&huge).validate(100).unwrap_err();
        assert!(matches!(err, AppError::InvalidIntent(_)));
    }

    #[test]
    fn zero_result_shape() {
        let r = SolverResult::zero("customSolver");
        assert_eq!(r.received_amount, 0.0);
        assert_eq!(r.route, vec!["error".to_string()]);
        assert_eq!(r.gas_cost, 0.0);
        assert_eq!(r.solver_profit, 0.0);
        assert_eq!(r.latency_ms, 0.0);
    }
}

//! Sandboxed policy language for request-supplied solver logic.
//!
//! A policy is a short list of assignments evaluated against a read-only view
//! of the pool snapshot. It can read pool attributes, draw from the request's
//! RNG and must name a pool through `best_pool`. There are no loops, no I/O and
//! no way to reach anything the host does not bind explicitly.
//!
//! ```text
//! # prefer the cheapest pool unless the top price is far ahead
//! let top = best_by(price * (1 - fee))
//! let cheap = best_by(-gas)
//! best_pool = if effective(top) - effective(cheap) > 0.001 then top else cheap
//! ```

use crate::pools::PoolSnapshot;
use rand::rngs::StdRng;
use thiserror::Error;

pub mod eval;
pub mod lexer;
pub mod parser;

pub use eval::{Evaluator, Value};
pub use parser::{Program, parse};

/// Largest accepted policy source, in bytes.
pub const MAX_SOURCE_LEN: usize = 4096;
pub const MAX_STATEMENTS: usize = 64;
pub const MAX_DEPTH: usize = 32;
/// Expression evaluations allowed per run.
pub const MAX_STEPS: usize = 10_000;
/// Variable a policy assigns to choose its pool.
pub const OUTPUT_VAR: &str = "best_pool";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PolicyError {
    #[error("policy source is {0} bytes, limit is {MAX_SOURCE_LEN}")]
    TooLong(usize),

    #[error("policy has more than {0} statements")]
    TooManyStatements(usize),

    #[error("expression nesting deeper than {0}")]
    TooDeep(usize),

    #[error("syntax error on line {line}: {msg}")]
    Syntax { line: usize, msg: String },

    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("`{name}` takes {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("type error: {0}")]
    Type(String),

    #[error("`{0}` is read-only")]
    ReadOnly(String),

    #[error("unknown pool `{0}`")]
    UnknownPool(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("non-finite arithmetic result")]
    NonFinite,

    #[error("invalid range [{0}, {1})")]
    InvalidRange(f64, f64),

    #[error("evaluation exceeded {0} steps")]
    BudgetExceeded(usize),
}

/// A compiled policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    program: Program,
}

impl Policy {
    pub fn compile(src: &str) -> Result<Self, PolicyError> {
        Ok(Self {
            program: parse(src)?,
        })
    }

    /// Run the policy and return the pool it chose, validated against `pools`.
    /// `None` means the policy left `best_pool` unassigned.
    pub fn choose(
        &self,
        pools: &PoolSnapshot,
        amount: f64,
        rng: &mut StdRng,
    ) -> Result<Option<String>, PolicyError> {
        let chosen = Evaluator::new(pools, amount, rng).run(&self.program)?;
        match chosen {
            Some(id) if !pools.contains(&id) => Err(PolicyError::UnknownPool(id)),
            other => Ok(other),
        }
    }
}

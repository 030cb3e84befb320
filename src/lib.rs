//! Core library for the solver-ensemble trade simulator.
//!
//! A request ([`models::TradeIntent`]) is priced against one pool snapshot
//! by every solver for a number of rounds; the [`runner`] folds the rounds
//! into an [`models::AggregateReport`].

pub mod aggregator;
pub mod cex;
pub mod config;
pub mod errors;
pub mod models;
pub mod policy;
pub mod pools;
pub mod runner;
pub mod solvers;
pub mod utils;

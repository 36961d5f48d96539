//! `conj-tradeoff` library crate.
//!
//! Accuracy/cost trade-off analysis for conjunction-detection benchmark sweeps:
//! Pareto frontier extraction and cost-model fitting with optimum search.
//!
//! The binary (`tradeoff`) is a thin wrapper around this library so the
//! analysis is testable without spawning processes.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod frontier;
pub mod io;
pub mod math;
pub mod models;
pub mod report;

//! Accuracy/cost trade-off frontier.
//!
//! Responsibilities:
//!
//! - score trials against a ground-truth detection count
//! - extract the Pareto frontier with a single sorted scan
//! - provide a pairwise dominance reference for cross-checking

pub mod dominance;
pub mod extract;

pub use dominance::*;
pub use extract::*;

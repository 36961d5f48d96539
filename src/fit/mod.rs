//! Cost-model fitting orchestration.
//!
//! Responsibilities:
//!
//! - fit `a/x + b*x + c*x^2 + d` by non-linear least squares
//! - report fit quality (SSE, RMSE, R²)
//! - locate the cost-minimizing parameter within the observed range

pub mod fitter;
pub mod grid;
pub mod optimum;

pub use fitter::*;
pub use grid::*;
pub use optimum::*;

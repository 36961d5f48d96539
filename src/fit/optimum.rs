//! Locate the minimum of a fitted cost curve inside the observed range.
//!
//! Two stages:
//! 1. evaluate the curve on a uniform grid over `[min, max]`
//! 2. refine around the best grid point with Brent's bounded method, searching
//!    only between its two grid neighbours
//!
//! The search never leaves the observed range; the model is not trusted beyond
//! the measured conditions.

use crate::domain::{CostCoefficients, Optimum, ParameterRange};
use crate::error::AnalysisError;
use crate::fit::grid::lin_space;
use crate::math::{BoundedOptions, minimize_bounded};

/// Minimum grid resolution for the bracketing scan.
const MIN_GRID_POINTS: usize = 3;

/// Find `argmin cost(x)` for `x` in `range`.
pub fn locate_optimum(
    coefficients: &CostCoefficients,
    range: ParameterRange,
    grid_points: usize,
    opts: BoundedOptions,
) -> Result<Optimum, AnalysisError> {
    let cost = |x: f64| coefficients.predict(x);

    if range.max <= range.min {
        return Ok(Optimum {
            parameter: range.min,
            cost: cost(range.min),
        });
    }

    let grid = lin_space(range.min, range.max, grid_points.max(MIN_GRID_POINTS));
    let mut best_idx = 0;
    let mut best_cost = f64::INFINITY;
    for (i, &x) in grid.iter().enumerate() {
        let c = cost(x);
        if c < best_cost {
            best_idx = i;
            best_cost = c;
        }
    }
    if !best_cost.is_finite() {
        return Err(AnalysisError::FitDidNotConverge {
            stage: "bounded minimization",
            iterations: grid.len(),
            objective: best_cost,
        });
    }

    let lo = grid[best_idx.saturating_sub(1)];
    let hi = grid[(best_idx + 1).min(grid.len() - 1)];
    let refined = minimize_bounded(cost, lo, hi, opts);
    if !refined.converged {
        return Err(AnalysisError::FitDidNotConverge {
            stage: "bounded minimization",
            iterations: refined.evals,
            objective: refined.fx,
        });
    }

    // Brent stays strictly inside its bracket, so a minimum sitting exactly on
    // a range bound is only reached by the grid itself.
    if refined.fx <= best_cost {
        Ok(Optimum {
            parameter: refined.x.clamp(range.min, range.max),
            cost: refined.fx,
        })
    } else {
        Ok(Optimum {
            parameter: grid[best_idx],
            cost: best_cost,
        })
    }
}

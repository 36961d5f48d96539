//! Evaluation of the empirical cost model `cost(x) = a/x + b*x + c*x^2 + d`.
//!
//! The fitter relies on two primitive operations:
//! - build a design (Jacobian) row for a given parameter value
//! - predict `cost(x)` given coefficients (for residuals, optimum search, grids)

use crate::math::{inverse, linear, quadratic};

/// Number of model coefficients `(a, b, c, d)`.
pub const COST_PARAM_COUNT: usize = 4;

/// Fill the design row `[1/x, x, x^2, 1]`.
///
/// This is also the Jacobian row `∂cost/∂(a, b, c, d)`.
///
/// # Panics
/// Panics if `out.len() < COST_PARAM_COUNT`.
pub fn fill_design_row(x: f64, out: &mut [f64]) {
    out[0] = inverse(x);
    out[1] = linear(x);
    out[2] = quadratic(x);
    out[3] = 1.0;
}

/// Predict `cost(x)` for coefficients `[a, b, c, d]`.
pub fn predict(coefficients: &[f64; COST_PARAM_COUNT], x: f64) -> f64 {
    let [a, b, c, d] = *coefficients;
    a * inverse(x) + b * linear(x) + c * quadratic(x) + d
}

/// Human-readable formula with the fitted coefficients.
pub fn formula(coefficients: &[f64; COST_PARAM_COUNT]) -> String {
    let [a, b, c, d] = *coefficients;
    format!("{a:.4}/x + {b:.6}x + {c:.3e}x^2 + {d:.4}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_matches_design_row() {
        let coeffs = [100.0, 0.5, 0.01, 3.0];
        let x = 4.0;
        let mut row = [0.0; COST_PARAM_COUNT];
        fill_design_row(x, &mut row);
        let dot: f64 = row.iter().zip(coeffs.iter()).map(|(r, c)| r * c).sum();
        assert!((predict(&coeffs, x) - dot).abs() < 1e-12);
        assert!((predict(&coeffs, x) - (25.0 + 2.0 + 0.16 + 3.0)).abs() < 1e-12);
    }
}

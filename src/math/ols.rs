//! Least squares solver.
//!
//! The optimum fitter repeatedly solves small linear least-squares problems of
//! the form:
//!
//! ```text
//! minimize ||A δ - r||^2
//! ```
//!
//! where `A` is a (possibly damped) Jacobian with four columns.
//!
//! Implementation choices:
//! - Columns are scaled to unit norm before solving. The cost basis mixes
//!   `1/x` and `x^2`, which differ by many orders of magnitude over typical
//!   tolerance ranges; unscaled, the absolute singular-value cutoff would drop
//!   the small columns.
//! - SVD handles tall systems (nalgebra's `QR::solve` is for square systems).

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD on a column-scaled matrix.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(a: &DMatrix<f64>, r: &DVector<f64>) -> Option<DVector<f64>> {
    let scales: Vec<f64> = a
        .column_iter()
        .map(|col| {
            let norm = col.norm();
            if norm.is_finite() && norm > 0.0 { norm } else { 1.0 }
        })
        .collect();

    let mut scaled = a.clone();
    for (j, &s) in scales.iter().enumerate() {
        scaled.column_mut(j).unscale_mut(s);
    }

    let svd = scaled.svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(z) = svd.solve(r, tol) {
            if z.iter().all(|v| v.is_finite()) {
                return Some(DVector::from_iterator(
                    z.len(),
                    z.iter().zip(scales.iter()).map(|(zj, sj)| zj / sj),
                ));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&a, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn least_squares_handles_badly_scaled_columns() {
        // Columns 1/x and x^2 over x in [10, 200]: norms differ by ~1e6.
        let xs: Vec<f64> = (1..=20).map(|i| 10.0 * i as f64).collect();
        let mut data = Vec::new();
        let mut y = Vec::new();
        for &x in &xs {
            data.extend_from_slice(&[1.0 / x, x * x]);
            y.push(50.0 / x + 0.002 * x * x);
        }
        let a = DMatrix::from_row_slice(xs.len(), 2, &data);
        let y = DVector::from_vec(y);

        let beta = solve_least_squares(&a, &y).unwrap();
        assert!((beta[0] - 50.0).abs() < 1e-8, "got {}", beta[0]);
        assert!((beta[1] - 0.002).abs() < 1e-12, "got {}", beta[1]);
    }
}

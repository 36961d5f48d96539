//! Basis functions for the empirical cost model.
//!
//! The model is `cost(x) = a·g0(x) + b·g1(x) + c·g2(x) + d`, with:
//!
//! - `g0(x) = 1/x` (work growing as a tolerance/stride shrinks)
//! - `g1(x) = x`
//! - `g2(x) = x^2`
//!
//! Numerical notes:
//! - `1/x` is only evaluated for strictly positive `x`; the fitter rejects
//!   non-positive parameters up front. The guard below keeps grid sampling
//!   finite if a caller hands us `x = 0` anyway.

/// Smallest magnitude used as a divisor in `g0`.
const X_EPS: f64 = 1e-12;

/// `g0(x) = 1/x`.
pub fn inverse(x: f64) -> f64 {
    1.0 / x.max(X_EPS)
}

/// `g1(x) = x`.
pub fn linear(x: f64) -> f64 {
    x
}

/// `g2(x) = x^2`.
pub fn quadratic(x: f64) -> f64 {
    x * x
}

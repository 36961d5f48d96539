//! Bounded scalar minimization (Brent's method).
//!
//! Finds a local minimum of `f` on `[lo, hi]` by combining golden-section
//! steps with parabolic interpolation. The iterate never leaves the interval,
//! so the result never extrapolates past the bounds.
//!
//! Convergence: stop once the bracket around the best point is within
//! `sqrt(eps)·|x| + xatol/3` of its midpoint.

/// `(3 - sqrt(5)) / 2`
const GOLDEN: f64 = 0.381_966_011_250_105_1;

/// Options for `minimize_bounded`.
#[derive(Debug, Clone, Copy)]
pub struct BoundedOptions {
    /// Absolute tolerance on the minimizer location.
    pub xatol: f64,
    /// Maximum number of function evaluations.
    pub max_evals: usize,
}

impl Default for BoundedOptions {
    fn default() -> Self {
        Self {
            xatol: 1e-5,
            max_evals: 500,
        }
    }
}

/// Result of a bounded minimization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundedMinimum {
    pub x: f64,
    pub fx: f64,
    pub evals: usize,
    /// `false` when the evaluation budget ran out first.
    pub converged: bool,
}

/// Minimize `f` over `[lo, hi]`.
///
/// The caller guarantees `lo < hi` and both finite.
pub fn minimize_bounded<F>(f: F, lo: f64, hi: f64, opts: BoundedOptions) -> BoundedMinimum
where
    F: Fn(f64) -> f64,
{
    let sqrt_eps = f64::EPSILON.sqrt();
    let (mut a, mut b) = (lo, hi);

    // x: best point so far, w: second best, v: previous w.
    let mut x = a + GOLDEN * (b - a);
    let mut w = x;
    let mut v = x;
    let mut fx = f(x);
    let mut fw = fx;
    let mut fv = fx;
    let mut evals = 1usize;

    // d: current step, e: step before last.
    let mut d = 0.0_f64;
    let mut e = 0.0_f64;

    let mut xm = 0.5 * (a + b);
    let mut tol1 = sqrt_eps * x.abs() + opts.xatol / 3.0;
    let mut tol2 = 2.0 * tol1;

    while (x - xm).abs() > tol2 - 0.5 * (b - a) {
        if evals >= opts.max_evals {
            return BoundedMinimum {
                x,
                fx,
                evals,
                converged: false,
            };
        }

        let mut golden = true;
        if e.abs() > tol1 {
            // Try a parabola through x, w, v.
            let mut r = (x - w) * (fx - fv);
            let mut q = (x - v) * (fx - fw);
            let mut p = (x - v) * q - (x - w) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            }
            q = q.abs();
            r = e;
            e = d;

            if p.abs() < (0.5 * q * r).abs() && p > q * (a - x) && p < q * (b - x) {
                golden = false;
                d = p / q;
                let u = x + d;
                // Don't evaluate too close to the bounds.
                if (u - a) < tol2 || (b - u) < tol2 {
                    d = tol1 * sign_or_one(xm - x);
                }
            }
        }

        if golden {
            e = if x >= xm { a - x } else { b - x };
            d = GOLDEN * e;
        }

        let u = x + sign_or_one(d) * d.abs().max(tol1);
        let fu = f(u);
        evals += 1;

        if fu <= fx {
            if u >= x {
                a = x;
            } else {
                b = x;
            }
            v = w;
            fv = fw;
            w = x;
            fw = fx;
            x = u;
            fx = fu;
        } else {
            if u < x {
                a = u;
            } else {
                b = u;
            }
            if fu <= fw || w == x {
                v = w;
                fv = fw;
                w = u;
                fw = fu;
            } else if fu <= fv || v == x || v == w {
                v = u;
                fv = fu;
            }
        }

        xm = 0.5 * (a + b);
        tol1 = sqrt_eps * x.abs() + opts.xatol / 3.0;
        tol2 = 2.0 * tol1;
    }

    BoundedMinimum {
        x,
        fx,
        evals,
        converged: true,
    }
}

fn sign_or_one(v: f64) -> f64 {
    if v < 0.0 { -1.0 } else { 1.0 }
}

//! Non-linear least-squares fit of the cost model.
//!
//! Given samples `(x_i, y_i)` we minimize
//!
//! ```text
//! SSE(p) = Σ (y_i - cost(x_i; p))^2,   cost(x; a, b, c, d) = a/x + b*x + c*x^2 + d
//! ```
//!
//! with Levenberg–Marquardt:
//! - each iteration solves the damped system `[J; sqrt(λ)·D] δ = [r; 0]` by SVD,
//!   `D` holding the Jacobian column norms
//! - the first attempt at every iteration is undamped (Gauss–Newton); damping
//!   is only switched on when a step fails to reduce the SSE
//! - convergence: relative SSE reduction `<= ftol`, or step norm
//!   `<= xtol·(|p| + xtol)`
//!
//! The initial guess is fixed (all ones by default), so fits are deterministic.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, trace};

use crate::domain::{CostCoefficients, CostSample, FitQuality, FittedModel, ParameterRange, Trial};
use crate::error::AnalysisError;
use crate::fit::optimum::locate_optimum;
use crate::math::{BoundedOptions, solve_least_squares};
use crate::models::{COST_PARAM_COUNT, fill_design_row, predict};

/// Damping used the first time a Gauss–Newton step is rejected.
const INITIAL_DAMPING: f64 = 1e-3;

/// Below this the damping is switched off again.
const MIN_DAMPING: f64 = 1e-12;

/// Fitting options.
#[derive(Debug, Clone)]
pub struct FitOptions {
    /// Starting coefficients `[a, b, c, d]`.
    pub initial_guess: [f64; COST_PARAM_COUNT],
    /// Maximum number of Levenberg–Marquardt iterations.
    pub max_iterations: usize,
    /// Relative SSE-reduction tolerance.
    pub ftol: f64,
    /// Relative step-size tolerance.
    pub xtol: f64,
    /// Points in the coarse scan that brackets the optimum.
    pub grid_points: usize,
    /// Refinement of the bracketed optimum.
    pub bounded: BoundedOptions,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            initial_guess: [1.0; COST_PARAM_COUNT],
            max_iterations: 200,
            ftol: 1.5e-8,
            xtol: 1.5e-8,
            grid_points: 101,
            bounded: BoundedOptions::default(),
        }
    }
}

/// Converged least-squares solution.
#[derive(Debug, Clone)]
struct LeastSquaresFit {
    coefficients: [f64; COST_PARAM_COUNT],
    sse: f64,
    iterations: usize,
}

/// Extract `(parameter, cost)` samples from trials.
pub fn samples_from_trials(trials: &[Trial], parameter: &str) -> Result<Vec<CostSample>, AnalysisError> {
    trials
        .iter()
        .enumerate()
        .map(|(i, t)| {
            t.parameters
                .get(parameter)
                .map(|x| CostSample::new(x, t.cost))
                .ok_or_else(|| AnalysisError::InvalidTrial(format!("trial {i} has no parameter '{parameter}'")))
        })
        .collect()
}

/// Fit the cost model and locate its minimum within the observed range.
pub fn fit_optimum(samples: &[CostSample], opts: &FitOptions) -> Result<FittedModel, AnalysisError> {
    validate_samples(samples)?;

    let distinct = count_distinct(samples);
    if distinct < COST_PARAM_COUNT {
        return Err(AnalysisError::UnderdeterminedFit {
            distinct,
            required: COST_PARAM_COUNT,
        });
    }

    let xs: Vec<f64> = samples.iter().map(|s| s.parameter).collect();
    let ys: Vec<f64> = samples.iter().map(|s| s.cost).collect();

    let fit = levenberg_marquardt(&xs, &ys, opts)?;

    let n = samples.len();
    let quality = FitQuality {
        sse: fit.sse,
        rmse: (fit.sse / n as f64).sqrt(),
        r_squared: r_squared(&ys, fit.sse),
        n,
        distinct_parameters: distinct,
    };

    let range = ParameterRange {
        min: xs.iter().copied().fold(f64::INFINITY, f64::min),
        max: xs.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    };
    let coefficients = CostCoefficients::from_array(fit.coefficients);
    let optimum = locate_optimum(&coefficients, range, opts.grid_points, opts.bounded)?;

    debug!(
        n,
        distinct,
        iterations = fit.iterations,
        sse = fit.sse,
        x_opt = optimum.parameter,
        "fitted cost model"
    );

    Ok(FittedModel {
        coefficients,
        quality,
        iterations: fit.iterations,
        range,
        optimum,
    })
}

fn validate_samples(samples: &[CostSample]) -> Result<(), AnalysisError> {
    if samples.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    for (i, s) in samples.iter().enumerate() {
        if !(s.parameter.is_finite() && s.parameter > 0.0) {
            return Err(AnalysisError::InvalidTrial(format!(
                "sample {i} has parameter {} (must be finite and > 0)",
                s.parameter
            )));
        }
        if !(s.cost.is_finite() && s.cost >= 0.0) {
            return Err(AnalysisError::InvalidTrial(format!(
                "sample {i} has cost {} (must be finite and >= 0)",
                s.cost
            )));
        }
    }
    Ok(())
}

fn count_distinct(samples: &[CostSample]) -> usize {
    let mut xs: Vec<f64> = samples.iter().map(|s| s.parameter).collect();
    xs.sort_by(f64::total_cmp);
    xs.dedup();
    xs.len()
}

/// `1 - SS_res/SS_tot`, or `None` when every observed cost is identical.
fn r_squared(ys: &[f64], sse: f64) -> Option<f64> {
    let (lo, hi) = ys
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &y| (lo.min(y), hi.max(y)));
    if lo == hi {
        return None;
    }
    let mean = ys.iter().sum::<f64>() / ys.len() as f64;
    let ss_tot: f64 = ys.iter().map(|y| (y - mean).powi(2)).sum();
    if ss_tot > 0.0 { Some(1.0 - sse / ss_tot) } else { None }
}

fn levenberg_marquardt(xs: &[f64], ys: &[f64], opts: &FitOptions) -> Result<LeastSquaresFit, AnalysisError> {
    let n = xs.len();
    let k = COST_PARAM_COUNT;

    let mut p = opts.initial_guess;
    let mut sse = sum_squared_residuals(xs, ys, &p);
    if !sse.is_finite() {
        return Err(AnalysisError::InvalidTrial(
            "initial guess produces a non-finite objective".to_string(),
        ));
    }

    let mut damping = 0.0_f64;
    let mut row = [0.0; COST_PARAM_COUNT];

    for iteration in 1..=opts.max_iterations {
        // Jacobian of the model and residuals at the current point.
        let mut jac = DMatrix::<f64>::zeros(n, k);
        let mut res = DVector::<f64>::zeros(n);
        for i in 0..n {
            fill_design_row(xs[i], &mut row);
            for j in 0..k {
                jac[(i, j)] = row[j];
            }
            res[i] = ys[i] - predict(&p, xs[i]);
        }

        let step = damped_step(&jac, &res, damping);
        let Some(delta) = step else {
            trace!(iteration, damping, "step solve failed, increasing damping");
            damping = raise_damping(damping);
            continue;
        };

        let p_norm = p.iter().map(|v| v * v).sum::<f64>().sqrt();
        let step_small = delta.norm() <= opts.xtol * (p_norm + opts.xtol);

        let mut candidate = p;
        for j in 0..k {
            candidate[j] += delta[j];
        }
        let sse_new = sum_squared_residuals(xs, ys, &candidate);
        trace!(iteration, damping, sse, sse_new, "levenberg-marquardt step");

        if sse_new.is_finite() && sse_new <= sse {
            let reduction = sse - sse_new;
            p = candidate;
            sse = sse_new;
            damping = lower_damping(damping);

            if step_small || sse == 0.0 || reduction <= opts.ftol * (sse + reduction) {
                return Ok(LeastSquaresFit {
                    coefficients: p,
                    sse,
                    iterations: iteration,
                });
            }
        } else {
            if step_small {
                // No productive step left at this resolution.
                return Ok(LeastSquaresFit {
                    coefficients: p,
                    sse,
                    iterations: iteration,
                });
            }
            damping = raise_damping(damping);
        }
    }

    Err(AnalysisError::FitDidNotConverge {
        stage: "Levenberg-Marquardt fit",
        iterations: opts.max_iterations,
        objective: sse,
    })
}

/// Solve `[J; sqrt(λ)·D] δ = [r; 0]` (plain `J δ = r` when `λ = 0`).
fn damped_step(jac: &DMatrix<f64>, res: &DVector<f64>, damping: f64) -> Option<DVector<f64>> {
    if damping <= 0.0 {
        return solve_least_squares(jac, res);
    }

    let (n, k) = jac.shape();
    let mut a = DMatrix::<f64>::zeros(n + k, k);
    a.view_mut((0, 0), (n, k)).copy_from(jac);
    let sqrt_damping = damping.sqrt();
    for j in 0..k {
        let col_norm = jac.column(j).norm();
        a[(n + j, j)] = sqrt_damping * if col_norm > 0.0 { col_norm } else { 1.0 };
    }

    let mut b = DVector::<f64>::zeros(n + k);
    b.rows_mut(0, n).copy_from(res);

    solve_least_squares(&a, &b)
}

fn raise_damping(damping: f64) -> f64 {
    if damping <= 0.0 { INITIAL_DAMPING } else { damping * 10.0 }
}

fn lower_damping(damping: f64) -> f64 {
    let next = damping / 10.0;
    if next < MIN_DAMPING { 0.0 } else { next }
}

fn sum_squared_residuals(xs: &[f64], ys: &[f64], p: &[f64; COST_PARAM_COUNT]) -> f64 {
    xs.iter()
        .zip(ys.iter())
        .map(|(&x, &y)| {
            let r = y - predict(p, x);
            r * r
        })
        .sum()
}

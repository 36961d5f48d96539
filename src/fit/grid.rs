//! Parameter grid generation.
//!
//! Grids serve two purposes:
//! - a coarse scan that brackets the minimum of the fitted curve before the
//!   bounded minimizer refines it (the curve can have a local minimum near one
//!   end and the global one near the other)
//! - sampled curves for the rendering collaborator

/// Generate `steps` evenly spaced points between `min` and `max` (inclusive).
///
/// `steps < 2` yields `[min]` (or nothing for `0`).
pub fn lin_space(min: f64, max: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (steps as f64 - 1.0);
            let mut out: Vec<f64> = (0..steps).map(|i| min + step * i as f64).collect();
            // Pin the last point exactly so range checks stay exact.
            out[steps - 1] = max;
            out
        }
    }
}

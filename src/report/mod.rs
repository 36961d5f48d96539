//! Reporting utilities: fitted residuals and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::{CostSample, FittedModel, GroundTruth, Trial};
use crate::error::AnalysisError;
use crate::frontier::{accuracy_pct, resolve_ground_truth};

/// Observed vs fitted cost at one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleResidual {
    pub parameter: f64,
    pub observed: f64,
    pub fitted: f64,
    pub residual: f64,
}

/// Compute fitted values and residuals for each sample, ordered by parameter.
pub fn compute_residuals(samples: &[CostSample], model: &FittedModel) -> Vec<SampleResidual> {
    let mut out: Vec<SampleResidual> = samples
        .iter()
        .map(|s| {
            let fitted = model.coefficients.predict(s.parameter);
            SampleResidual {
                parameter: s.parameter,
                observed: s.cost,
                fitted,
                residual: s.cost - fitted,
            }
        })
        .collect();
    out.sort_by(|a, b| a.parameter.total_cmp(&b.parameter));
    out
}

/// Detection count and accuracy at one parameter value.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterAccuracy {
    pub parameter: f64,
    pub detections: u64,
    pub accuracy_pct: f64,
}

/// Accuracy of each trial relative to the largest detection count among
/// them, ordered by `parameter`.
pub fn accuracy_by_parameter(trials: &[Trial], parameter: &str) -> Result<Vec<ParameterAccuracy>, AnalysisError> {
    let baseline = resolve_ground_truth(trials, GroundTruth::Max)?;
    let mut out = Vec::with_capacity(trials.len());
    for (i, t) in trials.iter().enumerate() {
        let x = t.parameters.get(parameter).ok_or_else(|| {
            AnalysisError::InvalidTrial(format!("trial {i} has no parameter '{parameter}'"))
        })?;
        out.push(ParameterAccuracy {
            parameter: x,
            detections: t.detection_count,
            accuracy_pct: accuracy_pct(t.detection_count, baseline),
        });
    }
    out.sort_by(|a, b| a.parameter.total_cmp(&b.parameter));
    Ok(out)
}

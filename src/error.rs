//! Error types.
//!
//! - `AnalysisError`: failures of the frontier/fit computations. Callers match on
//!   the variant to decide what to do (e.g. retry a fit with another guess).
//! - `AppError`: what the binary reports, a message plus a process exit code.
//!
//! Exit codes:
//! - `2`: bad input, bad configuration, or IO failure
//! - `3`: insufficient or invalid data for the requested analysis
//! - `4`: numerical failure

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("No trials to analyse.")]
    EmptyInput,

    #[error("Invalid trial: {0}")]
    InvalidTrial(String),

    #[error("Invalid ground truth: detection count must be > 0, got {0}.")]
    InvalidGroundTruth(u64),

    #[error("Underdetermined fit: need at least {required} distinct parameter values, got {distinct}.")]
    UnderdeterminedFit { distinct: usize, required: usize },

    #[error("{stage} did not converge after {iterations} iterations (last objective {objective:.6e}).")]
    FitDidNotConverge {
        stage: &'static str,
        iterations: usize,
        objective: f64,
    },
}

impl AnalysisError {
    pub fn exit_code(&self) -> u8 {
        match self {
            AnalysisError::InvalidTrial(_) => 2,
            AnalysisError::EmptyInput
            | AnalysisError::InvalidGroundTruth(_)
            | AnalysisError::UnderdeterminedFit { .. } => 3,
            AnalysisError::FitDidNotConverge { .. } => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    /// Prefix the message with context (e.g. the group being fitted).
    pub fn context(self, prefix: impl std::fmt::Display) -> Self {
        Self {
            exit_code: self.exit_code,
            message: format!("{prefix}: {}", self.message),
        }
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_errors_map_to_exit_codes() {
        let err: AppError = AnalysisError::InvalidGroundTruth(0).into();
        assert_eq!(err.exit_code(), 3);

        let err: AppError = AnalysisError::FitDidNotConverge {
            stage: "Levenberg-Marquardt",
            iterations: 10,
            objective: 1.0,
        }
        .into();
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("10 iterations"));
    }

    #[test]
    fn context_prefixes_message() {
        let err = AppError::new(3, "boom").context("group G1");
        assert_eq!(err.to_string(), "group G1: boom");
        assert_eq!(err.exit_code(), 3);
    }
}

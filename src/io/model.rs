//! Read/write fitted-model JSON files.
//!
//! Model JSON is the "portable" representation of a fit run:
//! - per group: coefficients, fit quality, observed range, optimum
//! - a precomputed curve grid for quick plotting
//!
//! The schema is defined by `domain::ModelFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{GroupFitRecord, ModelFile};
use crate::error::AppError;

/// Tool identifier stamped into model files.
pub const TOOL_NAME: &str = "tradeoff";

/// Assemble a model file from fitted groups.
pub fn build_model_file(fits: Vec<GroupFitRecord>) -> ModelFile {
    ModelFile {
        tool: TOOL_NAME.to_string(),
        generated_at: Utc::now(),
        fits,
    }
}

/// Write a model JSON file.
pub fn write_model_json(path: &Path, model: &ModelFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create model JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, model)
        .map_err(|e| AppError::new(2, format!("Failed to write model JSON: {e}")))?;
    Ok(())
}

/// Read a model JSON file.
pub fn read_model_json(path: &Path) -> Result<ModelFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open model JSON '{}': {e}", path.display())))?;
    let model: ModelFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid model JSON: {e}")))?;
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CostSample;
    use crate::fit::{FitOptions, fit_optimum};

    #[test]
    fn model_json_survives_a_file_round_trip() {
        let samples: Vec<CostSample> = [10.0, 20.0, 40.0, 80.0, 160.0]
            .iter()
            .map(|&x| CostSample::new(x, 400.0 / x + 0.05 * x + 2.0))
            .collect();
        let model = fit_optimum(&samples, &FitOptions::default()).unwrap();
        let record = GroupFitRecord {
            group: "all".to_string(),
            parameter: "tolerance_km".to_string(),
            cost_column: "total_s".to_string(),
            grid: model.curve_grid(11),
            model,
        };
        let file = build_model_file(vec![record]);

        let path = std::env::temp_dir().join(format!("tradeoff-model-{}.json", std::process::id()));
        write_model_json(&path, &file).unwrap();
        let back = read_model_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(back.tool, TOOL_NAME);
        assert_eq!(back.fits.len(), 1);
        let (a, b) = (&back.fits[0].model, &file.fits[0].model);
        assert!((a.coefficients.a - b.coefficients.a).abs() < 1e-9);
        assert!((a.optimum.parameter - b.optimum.parameter).abs() < 1e-9);
        assert_eq!(a.quality.n, 5);
        assert_eq!(a.quality.r_squared.is_some(), b.quality.r_squared.is_some());
        assert_eq!(back.fits[0].grid.x.len(), 11);
        assert_eq!(back.fits[0].grid.x[10], 160.0);
    }

    #[test]
    fn missing_model_file_is_an_input_error() {
        let err = read_model_json(Path::new("/nonexistent/tradeoff-model.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}

//! Export frontier results to CSV/JSON.
//!
//! The exports are meant to be easy to consume from a charting script or a
//! spreadsheet: one row per frontier point, parameters first.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::FrontierPoint;
use crate::error::AppError;
use crate::frontier::FrontierSummary;

/// Write frontier points to a CSV file.
pub fn write_frontier_csv(path: &Path, points: &[FrontierPoint]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_frontier_rows(&mut file, points)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV '{}': {e}", path.display())))
}

fn write_frontier_rows<W: Write>(out: &mut W, points: &[FrontierPoint]) -> std::io::Result<()> {
    // Header from the first point; every point of one run shares the same columns.
    let names: Vec<&str> = points
        .first()
        .map(|p| p.parameters.names().collect())
        .unwrap_or_default();

    let mut header: Vec<&str> = names.clone();
    header.extend(["detections", "accuracy_pct", "cost"]);
    writeln!(out, "{}", header.join(","))?;

    for p in points {
        let mut fields: Vec<String> = names
            .iter()
            .map(|n| p.parameters.get(n).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        fields.push(p.detection_count.to_string());
        fields.push(format!("{:.4}", p.accuracy_pct));
        fields.push(format!("{:.6}", p.cost));
        writeln!(out, "{}", fields.join(","))?;
    }
    Ok(())
}

#[derive(Serialize)]
struct FrontierJson<'a> {
    ground_truth: u64,
    trials: usize,
    threshold_pct: f64,
    above_threshold: usize,
    frontier: &'a [FrontierPoint],
}

/// Write the frontier summary as pretty JSON.
pub fn write_frontier_json(path: &Path, summary: &FrontierSummary) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create frontier JSON '{}': {e}", path.display())))?;
    let doc = FrontierJson {
        ground_truth: summary.ground_truth,
        trials: summary.trials,
        threshold_pct: summary.threshold_pct,
        above_threshold: summary.above_threshold,
        frontier: &summary.points,
    };
    serde_json::to_writer_pretty(file, &doc)
        .map_err(|e| AppError::new(2, format!("Failed to write frontier JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParameterSet;

    #[test]
    fn frontier_rows_have_parameters_then_metrics() {
        let points = vec![FrontierPoint {
            parameters: ParameterSet::new().with("step_ratio", 9.0).with("cell_ratio", 1.15),
            accuracy_pct: 99.5,
            cost: 12.25,
            detection_count: 995,
        }];
        let mut buf = Vec::new();
        write_frontier_rows(&mut buf, &points).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "step_ratio,cell_ratio,detections,accuracy_pct,cost");
        assert_eq!(lines[1], "9,1.15,995,99.5000,12.250000");
    }
}

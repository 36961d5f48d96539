//! Formatted terminal output (Markdown-style tables).
//!
//! We keep formatting code in one place so:
//! - the frontier/fit code stays clean and testable
//! - output changes are localized

use crate::domain::{FittedModel, GroupFitRecord, ModelFile, Trial};
use crate::frontier::{FrontierSummary, accuracy_pct};
use crate::models::formula;
use crate::report::{ParameterAccuracy, SampleResidual};

/// Format the frontier summary and table.
pub fn format_frontier_summary(summary: &FrontierSummary, source: &str) -> String {
    let mut out = String::new();

    out.push_str("=== tradeoff - Pareto frontier (accuracy vs cost) ===\n");
    out.push_str(&format!("Source: {source}\n"));
    out.push_str(&format!("Ground truth: {} conjunctions\n", summary.ground_truth));
    out.push_str(&format!(
        "Pareto frontier: {} of {} trials ({} at >= {:.2}% accuracy)\n\n",
        summary.points.len(),
        summary.trials,
        summary.above_threshold,
        summary.threshold_pct
    ));

    let names: Vec<String> = summary
        .points
        .first()
        .map(|p| p.parameters.names().map(str::to_string).collect())
        .unwrap_or_default();

    let show_cell_km = names.iter().any(|n| n == "tolerance_km") && names.iter().any(|n| n == "cell_ratio");

    let rows: Vec<Vec<String>> = summary
        .points
        .iter()
        .map(|p| {
            let mut row: Vec<String> = names
                .iter()
                .map(|n| fmt_param(p.parameters.get(n)))
                .collect();
            if show_cell_km {
                row.push(fmt_cell_km(p.parameters.get("tolerance_km"), p.parameters.get("cell_ratio")));
            }
            row.push(p.detection_count.to_string());
            row.push(format!("{:.2}%", p.accuracy_pct));
            row.push(format!("{:.2}s", p.cost));
            row
        })
        .collect();

    let mut headers = names.clone();
    if show_cell_km {
        headers.push("Cell (km)".to_string());
    }
    out.push_str(&markdown_table(&with_metric_headers(&headers), &rows));
    out
}

/// Format every evaluated trial (frontier or not).
pub fn format_trials_table(trials: &[Trial], ground_truth: u64) -> String {
    let names: Vec<String> = trials
        .first()
        .map(|t| t.parameters.names().map(str::to_string).collect())
        .unwrap_or_default();

    let rows: Vec<Vec<String>> = trials
        .iter()
        .map(|t| {
            let mut row: Vec<String> = names
                .iter()
                .map(|n| fmt_param(t.parameters.get(n)))
                .collect();
            row.push(t.detection_count.to_string());
            row.push(format!("{:.2}%", accuracy_pct(t.detection_count, ground_truth)));
            row.push(format!("{:.1}s", t.cost));
            row
        })
        .collect();

    let mut out = format!("All evaluated points ({} total):\n", trials.len());
    out.push_str(&markdown_table(&with_metric_headers(&names), &rows));
    out
}

/// Format one fitted group: model, quality, optimum, residual table.
///
/// When `accuracy` is non-empty the table also lists detections and accuracy
/// at each parameter value.
pub fn format_fit_report(
    label: &str,
    parameter: &str,
    model: &FittedModel,
    residuals: &[SampleResidual],
    accuracy: &[ParameterAccuracy],
) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== tradeoff - cost model fit [{label}] ===\n"));
    out.push_str(&format_model_lines(parameter, model));

    if !residuals.is_empty() {
        out.push('\n');
        let mut headers = vec![parameter.to_string()];
        if !accuracy.is_empty() {
            headers.extend(["Conj".to_string(), "Accuracy".to_string()]);
        }
        headers.extend([
            "Observed".to_string(),
            "Fitted".to_string(),
            "Residual".to_string(),
        ]);
        let rows: Vec<Vec<String>> = residuals
            .iter()
            .map(|r| {
                let mut row = vec![fmt_param(Some(r.parameter))];
                if !accuracy.is_empty() {
                    match accuracy.iter().find(|a| a.parameter == r.parameter) {
                        Some(a) => {
                            row.push(a.detections.to_string());
                            row.push(format!("{:.2}%", a.accuracy_pct));
                        }
                        None => row.extend([String::new(), String::new()]),
                    }
                }
                row.extend([
                    format!("{:.3}s", r.observed),
                    format!("{:.3}s", r.fitted),
                    format!("{:+.3}s", r.residual),
                ]);
                row
            })
            .collect();
        out.push_str(&markdown_table(&headers, &rows));
    }

    out
}

/// Format a saved model file (`tradeoff show`).
pub fn format_model_file(file: &ModelFile) -> String {
    let mut out = format!(
        "=== {} model file (generated {}) ===\n",
        file.tool,
        file.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    for GroupFitRecord {
        group,
        parameter,
        cost_column,
        model,
        ..
    } in &file.fits
    {
        out.push_str(&format!("\n[{group}] cost column: {cost_column}\n"));
        out.push_str(&format_model_lines(parameter, model));
    }
    out
}

fn format_model_lines(parameter: &str, model: &FittedModel) -> String {
    let mut out = String::new();
    let q = &model.quality;
    out.push_str(&format!("Model: cost(x) = {}\n", formula(&model.coefficients.to_array())));
    out.push_str(&format!(
        "Samples: n={} | distinct {parameter}={} | range=[{}, {}]\n",
        q.n,
        q.distinct_parameters,
        fmt_param(Some(model.range.min)),
        fmt_param(Some(model.range.max)),
    ));
    out.push_str(&format!(
        "Fit: SSE={:.6} RMSE={:.6}s R^2={} ({} iterations)\n",
        q.sse,
        q.rmse,
        fmt_r_squared(q.r_squared),
        model.iterations
    ));
    out.push_str(&format!(
        "Optimal {parameter}: {:.3} -> {:.3}s\n",
        model.optimum.parameter, model.optimum.cost
    ));
    out
}

fn with_metric_headers(names: &[String]) -> Vec<String> {
    let mut headers = names.to_vec();
    headers.extend(["Conj".to_string(), "Accuracy".to_string(), "Time".to_string()]);
    headers
}

fn fmt_r_squared(r2: Option<f64>) -> String {
    match r2 {
        Some(v) => format!("{v:.4}"),
        None => "undefined (constant cost)".to_string(),
    }
}

/// Grid cell size: tolerance divided by the cell ratio.
fn fmt_cell_km(tolerance_km: Option<f64>, cell_ratio: Option<f64>) -> String {
    match (tolerance_km, cell_ratio) {
        (Some(t), Some(r)) if r > 0.0 => format!("{:.1}", t / r),
        _ => String::new(),
    }
}

fn fmt_param(v: Option<f64>) -> String {
    match v {
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{v:.0}"),
        Some(v) => format!("{v:.2}"),
        None => String::new(),
    }
}

fn markdown_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let line = |cells: &[String]| -> String {
        let parts: Vec<String> = cells
            .iter()
            .zip(widths.iter())
            .map(|(c, &w)| format!(" {c:<w$} "))
            .collect();
        format!("|{}|\n", parts.join("|"))
    };

    out.push_str(&line(headers));
    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w + 2)).collect();
    out.push_str(&format!("|{}|\n", sep.join("|")));
    for row in rows {
        out.push_str(&line(row));
    }
    out
}

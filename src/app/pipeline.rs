//! Shared analysis pipelines behind the CLI subcommands.
//!
//! frontier: CSV -> trials -> (aggregate) -> ground truth -> Pareto scan
//! fit:      CSV(s) -> groups -> (aggregate) -> samples -> LM fit + optimum -> residuals
//!
//! The CLI only prints and exports what these return.

use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::data::{TrialGroup, aggregate_trials, group_by_column};
use crate::domain::{FitConfig, FittedModel, FrontierConfig, GroupBy, GroupFitRecord, ModelFile, Trial};
use crate::error::AppError;
use crate::fit::{FitOptions, fit_optimum, samples_from_trials};
use crate::frontier::{FrontierSummary, resolve_ground_truth, summarize_frontier};
use crate::io::{RowError, TrialSchema, build_model_file, load_table, normalize_header_name};
use crate::report::{ParameterAccuracy, SampleResidual, accuracy_by_parameter, compute_residuals};

/// All computed outputs of a `tradeoff frontier` run.
#[derive(Debug, Clone)]
pub struct FrontierRun {
    /// Trials the frontier was computed from (after optional aggregation).
    pub trials: Vec<Trial>,
    pub summary: FrontierSummary,
    pub row_errors: Vec<RowError>,
}

/// One fitted group.
#[derive(Debug, Clone)]
pub struct GroupFit {
    pub label: String,
    pub model: FittedModel,
    pub residuals: Vec<SampleResidual>,
    /// Detections and accuracy per parameter value, when a detections column
    /// was given.
    pub accuracy: Vec<ParameterAccuracy>,
}

/// All computed outputs of a `tradeoff fit` run.
#[derive(Debug, Clone)]
pub struct FitRun {
    pub groups: Vec<GroupFit>,
    pub skipped_rows: usize,
}

/// Execute frontier extraction for one benchmark table.
pub fn run_frontier(config: &FrontierConfig) -> Result<FrontierRun, AppError> {
    let table = load_table(&config.csv_path)?;
    let schema = TrialSchema {
        parameter_columns: config.parameter_columns.clone(),
        cost_column: config.cost_column.clone(),
        detections_column: Some(config.detections_column.clone()),
    };
    let extraction = table.to_trials(&schema)?;

    let trials = if config.aggregate {
        let merged = aggregate_trials(&extraction.trials);
        debug!(rows = extraction.trials.len(), configurations = merged.len(), "aggregated repeated runs");
        merged
    } else {
        extraction.trials
    };

    let ground_truth = resolve_ground_truth(&trials, config.ground_truth)?;
    let summary = summarize_frontier(&trials, ground_truth, config.threshold_pct)?;
    info!(
        source = %table.source,
        trials = trials.len(),
        frontier = summary.points.len(),
        ground_truth,
        "frontier extracted"
    );

    Ok(FrontierRun {
        trials,
        summary,
        row_errors: extraction.row_errors,
    })
}

/// Execute cost-model fitting for every group of the configured inputs.
///
/// Groups are fitted in parallel; the output keeps group order.
pub fn run_fit(config: &FitConfig) -> Result<FitRun, AppError> {
    if config.csv_paths.is_empty() {
        return Err(AppError::new(2, "No input CSV given."));
    }

    let parameter = normalize_header_name(&config.parameter_column);
    let group_column = match &config.group_by {
        GroupBy::Column(column) => Some(normalize_header_name(column)),
        GroupBy::None | GroupBy::File => None,
    };

    let mut parameter_columns = vec![parameter.clone()];
    parameter_columns.extend(group_column.clone());
    let schema = TrialSchema {
        parameter_columns,
        cost_column: config.cost_column.clone(),
        detections_column: config.detections_column.clone(),
    };

    let mut per_file: Vec<TrialGroup> = Vec::with_capacity(config.csv_paths.len());
    let mut skipped_rows = 0;
    for path in &config.csv_paths {
        let table = load_table(path)?;
        let extraction = table.to_trials(&schema)?;
        skipped_rows += extraction.row_errors.len();
        per_file.push(TrialGroup {
            label: file_label(path),
            trials: extraction.trials,
        });
    }

    let groups = match (&config.group_by, &group_column) {
        (GroupBy::File, _) => per_file,
        (_, Some(column)) => {
            let pooled: Vec<Trial> = per_file.into_iter().flat_map(|g| g.trials).collect();
            group_by_column(&pooled, column)
        }
        _ => vec![TrialGroup {
            label: "all".to_string(),
            trials: per_file.into_iter().flat_map(|g| g.trials).collect(),
        }],
    };
    if groups.is_empty() {
        return Err(AppError::new(3, "Grouping produced no trial groups to fit."));
    }

    let opts = FitOptions {
        max_iterations: config.max_iterations,
        grid_points: config.grid_points,
        ..FitOptions::default()
    };

    let groups: Vec<GroupFit> = groups
        .par_iter()
        .map(|group| fit_group(group, &parameter, config.detections_column.is_some(), &opts))
        .collect::<Result<_, AppError>>()?;

    info!(groups = groups.len(), skipped_rows, "cost models fitted");
    Ok(FitRun {
        groups,
        skipped_rows,
    })
}

/// Build the exportable model file for a fit run.
pub fn model_file_from_run(run: &FitRun, config: &FitConfig) -> ModelFile {
    let fits = run
        .groups
        .iter()
        .map(|g| GroupFitRecord {
            group: g.label.clone(),
            parameter: config.parameter_column.clone(),
            cost_column: config.cost_column.clone(),
            model: g.model.clone(),
            grid: g.model.curve_grid(config.curve_points),
        })
        .collect();
    build_model_file(fits)
}

fn fit_group(
    group: &TrialGroup,
    parameter: &str,
    with_accuracy: bool,
    opts: &FitOptions,
) -> Result<GroupFit, AppError> {
    let fit = || -> Result<GroupFit, AppError> {
        let averaged = aggregate_trials(&group.trials);
        let samples = samples_from_trials(&averaged, parameter)?;
        let accuracy = if with_accuracy {
            accuracy_by_parameter(&averaged, parameter)?
        } else {
            Vec::new()
        };
        let model = fit_optimum(&samples, opts)?;
        debug!(
            group = %group.label,
            samples = samples.len(),
            optimum = model.optimum.parameter,
            "group fitted"
        );
        let residuals = compute_residuals(&samples, &model);
        Ok(GroupFit {
            label: group.label.clone(),
            model,
            residuals,
            accuracy,
        })
    };
    fit().map_err(|e| e.context(&group.label))
}

fn file_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GroundTruth;
    use std::path::PathBuf;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("tradeoff-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn frontier_config(path: PathBuf) -> FrontierConfig {
        FrontierConfig {
            csv_path: path,
            parameter_columns: vec!["step_ratio".to_string(), "cell_ratio".to_string()],
            cost_column: "total_s".to_string(),
            detections_column: "conj".to_string(),
            ground_truth: GroundTruth::First,
            aggregate: false,
            threshold_pct: 98.0,
            show_all: false,
            export_csv: None,
            export_json: None,
        }
    }

    fn fit_config(paths: Vec<PathBuf>, group_by: GroupBy) -> FitConfig {
        FitConfig {
            csv_paths: paths,
            parameter_column: "tolerance_km".to_string(),
            cost_column: "total_s".to_string(),
            group_by,
            max_iterations: 200,
            grid_points: 101,
            curve_points: 50,
            detections_column: None,
            export_model: None,
        }
    }

    fn sweep_csv(scale: f64, extra_column: Option<(&str, f64)>) -> String {
        let mut out = String::from("tolerance_km,step_ratio,total_s");
        if let Some((name, _)) = extra_column {
            out.push_str(&format!(",{name}"));
        }
        out.push('\n');
        for x in [5.0, 10.0, 20.0, 40.0, 80.0, 160.0] {
            let cost = scale * (100.0 / x + 0.01 * x);
            out.push_str(&format!("{x},4,{cost}"));
            if let Some((_, v)) = extra_column {
                out.push_str(&format!(",{v}"));
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn frontier_from_csv() {
        let path = write_temp(
            "frontier.csv",
            "step_ratio,cell_ratio,conj,total_s\n\
             9,1.0,1000,30.0\n\
             6,1.3,990,20.0\n\
             5,1.45,970,22.0\n\
             4,1.45,,18.0\n",
        );
        let run = run_frontier(&frontier_config(path.clone())).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(run.summary.ground_truth, 1000);
        assert_eq!(run.trials.len(), 3);
        assert_eq!(run.row_errors.len(), 1);
        let costs: Vec<f64> = run.summary.points.iter().map(|p| p.cost).collect();
        assert_eq!(costs, vec![30.0, 20.0]);
        assert_eq!(run.summary.above_threshold, 2);
    }

    #[test]
    fn frontier_aggregates_repeated_runs() {
        let path = write_temp(
            "frontier-agg.csv",
            "step_ratio,cell_ratio,conj,total_s\n\
             9,1.0,1000,30.0\n\
             9,1.0,1000,34.0\n\
             6,1.3,990,20.0\n",
        );
        let mut config = frontier_config(path.clone());
        config.aggregate = true;
        let run = run_frontier(&config).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(run.trials.len(), 2);
        assert!((run.summary.points[0].cost - 32.0).abs() < 1e-12);
    }

    #[test]
    fn fit_pooled_recovers_optimum() {
        let path = write_temp("fit-pooled.csv", &sweep_csv(1.0, None));
        let run = run_fit(&fit_config(vec![path.clone()], GroupBy::None)).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(run.groups.len(), 1);
        let group = &run.groups[0];
        assert_eq!(group.label, "all");
        assert!((group.model.optimum.parameter - 100.0).abs() < 1e-2);
        assert_eq!(group.residuals.len(), 6);
    }

    #[test]
    fn fit_per_file_keeps_input_order() {
        let a = write_temp("gc-a.csv", &sweep_csv(1.0, None));
        let b = write_temp("gc-b.csv", &sweep_csv(2.0, None));
        let config = fit_config(vec![a.clone(), b.clone()], GroupBy::File);
        let run = run_fit(&config).unwrap();
        let file = model_file_from_run(&run, &config);
        let _ = std::fs::remove_file(&a);
        let _ = std::fs::remove_file(&b);

        assert_eq!(run.groups.len(), 2);
        assert!(run.groups[0].label.ends_with("gc-a"));
        assert!(run.groups[1].label.ends_with("gc-b"));
        assert!((run.groups[1].model.optimum.cost - 2.0 * run.groups[0].model.optimum.cost).abs() < 1e-3);
        assert_eq!(file.fits.len(), 2);
        assert_eq!(file.fits[0].grid.x.len(), 50);
    }

    #[test]
    fn fit_group_by_column_splits_rows() {
        let mut csv = sweep_csv(1.0, Some(("prepass_km", 10.0)));
        let second = sweep_csv(3.0, Some(("prepass_km", 5.0)));
        csv.push_str(second.lines().skip(1).collect::<Vec<_>>().join("\n").as_str());
        csv.push('\n');
        let path = write_temp("fit-grouped.csv", &csv);
        let config = fit_config(vec![path.clone()], GroupBy::Column("prepass_km".to_string()));
        let run = run_fit(&config).unwrap();
        let _ = std::fs::remove_file(&path);

        let labels: Vec<&str> = run.groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["prepass_km=5", "prepass_km=10"]);
    }

    #[test]
    fn underdetermined_group_names_the_group() {
        let path = write_temp(
            "fit-short.csv",
            "tolerance_km,total_s\n5,20\n10,11\n20,6\n",
        );
        let err = run_fit(&fit_config(vec![path.clone()], GroupBy::None)).unwrap_err();
        let _ = std::fs::remove_file(&path);

        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().starts_with("all:"));
    }

    #[test]
    fn column_names_match_case_insensitively() {
        let mut csv = sweep_csv(1.0, Some(("prepass_km", 10.0)));
        let second = sweep_csv(3.0, Some(("prepass_km", 5.0)));
        csv.push_str(second.lines().skip(1).collect::<Vec<_>>().join("\n").as_str());
        csv.push('\n');
        let path = write_temp("fit-upper.csv", &csv);

        let mut pooled = fit_config(vec![path.clone()], GroupBy::None);
        pooled.parameter_column = "TOLERANCE_KM".to_string();
        let pooled_run = run_fit(&pooled);

        let mut grouped = fit_config(vec![path.clone()], GroupBy::Column("PREPASS_KM".to_string()));
        grouped.parameter_column = " Tolerance_Km ".to_string();
        let grouped_run = run_fit(&grouped);
        let _ = std::fs::remove_file(&path);

        assert_eq!(pooled_run.unwrap().groups.len(), 1);
        let labels: Vec<String> = grouped_run.unwrap().groups.into_iter().map(|g| g.label).collect();
        assert_eq!(labels, vec!["prepass_km=5", "prepass_km=10"]);
    }

    #[test]
    fn fit_reports_accuracy_per_parameter() {
        let path = write_temp(
            "fit-conj.csv",
            "tolerance_km,conj,total_s\n\
             5,1000,20.05\n\
             10,1000,10.1\n\
             20,990,5.2\n\
             40,980,2.9\n\
             80,950,2.05\n",
        );
        let mut config = fit_config(vec![path.clone()], GroupBy::None);
        config.detections_column = Some("conj".to_string());
        let run = run_fit(&config).unwrap();
        let _ = std::fs::remove_file(&path);

        let accuracy = &run.groups[0].accuracy;
        assert_eq!(accuracy.len(), 5);
        assert_eq!(accuracy[0].accuracy_pct, 100.0);
        assert!((accuracy[4].accuracy_pct - 95.0).abs() < 1e-12);
        assert!(run.groups[0].residuals.len() == accuracy.len());
    }
}

//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments
//! - runs frontier extraction or cost-model fitting
//! - prints reports
//! - writes optional exports

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, FitArgs, FrontierArgs, ShowArgs};
use crate::domain::{FitConfig, FrontierConfig, GroundTruth, GroupBy};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `tradeoff` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match cli.command {
        Command::Frontier(args) => handle_frontier(args),
        Command::Fit(args) => handle_fit(args),
        Command::Show(args) => handle_show(args),
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_frontier(args: FrontierArgs) -> Result<(), AppError> {
    let config = frontier_config_from_args(&args);
    let run = pipeline::run_frontier(&config)?;

    let source = config.csv_path.display().to_string();
    println!("{}", crate::report::format_frontier_summary(&run.summary, &source));
    if config.show_all {
        println!(
            "{}",
            crate::report::format_trials_table(&run.trials, run.summary.ground_truth)
        );
    }
    if !run.row_errors.is_empty() {
        eprintln!("Skipped {} row(s) with missing or invalid values.", run.row_errors.len());
    }

    if let Some(path) = &config.export_csv {
        crate::io::write_frontier_csv(path, &run.summary.points)?;
    }
    if let Some(path) = &config.export_json {
        crate::io::write_frontier_json(path, &run.summary)?;
    }

    Ok(())
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args);
    let run = pipeline::run_fit(&config)?;

    for group in &run.groups {
        println!(
            "{}",
            crate::report::format_fit_report(
                &group.label,
                &config.parameter_column,
                &group.model,
                &group.residuals,
                &group.accuracy
            )
        );
    }
    if run.skipped_rows > 0 {
        eprintln!("Skipped {} row(s) with missing or invalid values.", run.skipped_rows);
    }

    if let Some(path) = &config.export_model {
        let file = pipeline::model_file_from_run(&run, &config);
        crate::io::write_model_json(path, &file)?;
    }

    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let file = crate::io::read_model_json(&args.model)?;
    println!("{}", crate::report::format_model_file(&file));
    Ok(())
}

pub fn frontier_config_from_args(args: &FrontierArgs) -> FrontierConfig {
    let ground_truth = match args.ground_truth_count {
        Some(count) => GroundTruth::Count(count),
        None => args.ground_truth.into(),
    };
    FrontierConfig {
        csv_path: args.csv.clone(),
        parameter_columns: args.params.clone(),
        cost_column: args.cost_column.clone(),
        detections_column: args.detections_column.clone(),
        ground_truth,
        aggregate: args.aggregate,
        threshold_pct: args.threshold,
        show_all: args.show_all,
        export_csv: args.export.clone(),
        export_json: args.json.clone(),
    }
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    let group_by = match (&args.group_by, args.per_file) {
        (Some(column), _) => GroupBy::Column(column.clone()),
        (None, true) => GroupBy::File,
        (None, false) => GroupBy::None,
    };
    FitConfig {
        csv_paths: args.csv.clone(),
        parameter_column: args.param.clone(),
        cost_column: args.cost_column.clone(),
        group_by,
        max_iterations: args.max_iterations,
        grid_points: args.grid_points,
        curve_points: args.curve_points,
        detections_column: args.detections_column.clone(),
        export_model: args.export_model.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_count_overrides_policy() {
        let cli = Cli::parse_from([
            "tradeoff",
            "frontier",
            "--csv",
            "p.csv",
            "--ground-truth",
            "max",
            "--ground-truth-count",
            "1200",
        ]);
        let Command::Frontier(args) = cli.command else {
            panic!("expected frontier command");
        };
        let config = frontier_config_from_args(&args);
        assert_eq!(config.ground_truth, GroundTruth::Count(1200));
    }

    #[test]
    fn fit_grouping_modes() {
        let parse = |extra: &[&str]| {
            let mut argv = vec!["tradeoff", "fit", "--csv", "a.csv"];
            argv.extend_from_slice(extra);
            let Command::Fit(args) = Cli::parse_from(argv).command else {
                panic!("expected fit command");
            };
            fit_config_from_args(&args).group_by
        };
        assert_eq!(parse(&[]), GroupBy::None);
        assert_eq!(parse(&["--per-file"]), GroupBy::File);
        assert_eq!(
            parse(&["--group-by", "prepass_km"]),
            GroupBy::Column("prepass_km".to_string())
        );
    }
}

//! Command-line parsing for the benchmark trade-off analyser.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! analysis code. `app` turns these structs into plain config values.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::GroundTruthSource;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "tradeoff",
    version,
    about = "Accuracy/cost trade-off analysis for conjunction-detection benchmarks"
)]
pub struct Cli {
    /// Log filter (e.g. `info`, `tradeoff=debug`). Overrides `RUST_LOG`.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract the Pareto frontier (max accuracy, min time) from a parameter sweep.
    Frontier(FrontierArgs),
    /// Fit `a/x + b*x + c*x^2 + d` to time vs one parameter and report the optimum.
    Fit(FitArgs),
    /// Print a previously exported model JSON.
    Show(ShowArgs),
}

/// Options for frontier extraction.
#[derive(Debug, Args, Clone)]
pub struct FrontierArgs {
    /// Benchmark CSV (one row per trial).
    #[arg(long, value_name = "CSV")]
    pub csv: PathBuf,

    /// Parameter columns to carry into the frontier (comma-separated).
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "tolerance_km,step_ratio,interp_stride,cell_ratio"
    )]
    pub params: Vec<String>,

    /// Column holding the total time of a trial.
    #[arg(long, default_value = "total_s")]
    pub cost_column: String,

    /// Column holding the number of detected conjunctions.
    #[arg(long, default_value = "conj")]
    pub detections_column: String,

    /// Which trial defines the reference detection count.
    #[arg(long, value_enum, default_value_t = GroundTruthSource::First)]
    pub ground_truth: GroundTruthSource,

    /// Explicit reference detection count (overrides `--ground-truth`).
    #[arg(long)]
    pub ground_truth_count: Option<u64>,

    /// Average repeated runs of identical configurations first.
    #[arg(long)]
    pub aggregate: bool,

    /// Accuracy (%) highlighted in the summary.
    #[arg(long, default_value_t = 98.0)]
    pub threshold: f64,

    /// Also print every evaluated trial.
    #[arg(long)]
    pub show_all: bool,

    /// Export the frontier to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the frontier summary to JSON.
    #[arg(long)]
    pub json: Option<PathBuf>,
}

/// Options for cost-model fitting.
#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Benchmark CSV(s). Rows of all files are pooled unless `--per-file` is set.
    #[arg(long, value_name = "CSV", required = true, num_args = 1..)]
    pub csv: Vec<PathBuf>,

    /// Parameter column to fit against (x axis).
    #[arg(long, default_value = "tolerance_km")]
    pub param: String,

    /// Column holding the total time of a trial.
    #[arg(long, default_value = "total_s")]
    pub cost_column: String,

    /// Detected-conjunction column; adds per-value detections and accuracy
    /// (relative to the best count in the group) to the report.
    #[arg(long)]
    pub detections_column: Option<String>,

    /// Fit each distinct value of this column separately.
    #[arg(long, conflicts_with = "per_file")]
    pub group_by: Option<String>,

    /// Fit each input file separately.
    #[arg(long)]
    pub per_file: bool,

    /// Levenberg-Marquardt iteration budget.
    #[arg(long, default_value_t = 200)]
    pub max_iterations: usize,

    /// Grid points used to bracket the optimum before refinement.
    #[arg(long, default_value_t = 101)]
    pub grid_points: usize,

    /// Points in the exported fitted curve.
    #[arg(long, default_value_t = 500)]
    pub curve_points: usize,

    /// Export fitted models (coefficients, R^2, optimum, curve) to JSON.
    #[arg(long = "export-model")]
    pub export_model: Option<PathBuf>,
}

/// Options for printing a saved model.
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Model JSON produced by `tradeoff fit --export-model`.
    #[arg(long, value_name = "JSON")]
    pub model: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontier_defaults() {
        let cli = Cli::parse_from(["tradeoff", "frontier", "--csv", "pareto.csv"]);
        let Command::Frontier(args) = cli.command else {
            panic!("expected frontier command");
        };
        assert_eq!(args.params, vec!["tolerance_km", "step_ratio", "interp_stride", "cell_ratio"]);
        assert_eq!(args.ground_truth, GroundTruthSource::First);
        assert_eq!(args.threshold, 98.0);
    }

    #[test]
    fn fit_accepts_several_files() {
        let cli = Cli::parse_from([
            "tradeoff", "fit", "--csv", "a.csv", "b.csv", "--per-file", "--param", "tolerance_km",
        ]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit command");
        };
        assert_eq!(args.csv.len(), 2);
        assert!(args.per_file);
    }

    #[test]
    fn group_by_conflicts_with_per_file() {
        let res = Cli::try_parse_from([
            "tradeoff", "fit", "--csv", "a.csv", "--per-file", "--group-by", "prepass_km",
        ]);
        assert!(res.is_err());
    }
}

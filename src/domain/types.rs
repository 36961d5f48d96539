//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during frontier extraction and fitting
//! - exported to CSV/JSON for a rendering collaborator
//! - reloaded later (`tradeoff show`)

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Ordered mapping from parameter name to value.
///
/// Insertion order is preserved so reports list parameters in the same order
/// as the benchmark table's columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    entries: Vec<(String, f64)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. Replaces the value if the name already exists.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact-equality key used to group repeated configurations.
    pub fn group_key(&self) -> Vec<(String, u64)> {
        self.entries
            .iter()
            .map(|(n, v)| (n.clone(), v.to_bits()))
            .collect()
    }
}

impl Serialize for ParameterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// One benchmark observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    pub parameters: ParameterSet,
    /// Total measured time (seconds).
    pub cost: f64,
    pub detection_count: u64,
}

impl Trial {
    pub fn new(parameters: ParameterSet, cost: f64, detection_count: u64) -> Self {
        Self {
            parameters,
            cost,
            detection_count,
        }
    }
}

/// How the reference detection count is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundTruth {
    /// Detection count of the first trial (the benchmark runner writes the
    /// exhaustive reference configuration first).
    First,
    /// Highest detection count in the table.
    Max,
    /// Explicitly designated count.
    Count(u64),
}

/// CLI-facing subset of `GroundTruth` (explicit counts use their own flag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GroundTruthSource {
    First,
    Max,
}

impl From<GroundTruthSource> for GroundTruth {
    fn from(value: GroundTruthSource) -> Self {
        match value {
            GroundTruthSource::First => GroundTruth::First,
            GroundTruthSource::Max => GroundTruth::Max,
        }
    }
}

/// A Pareto-optimal trial.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontierPoint {
    pub parameters: ParameterSet,
    pub accuracy_pct: f64,
    pub cost: f64,
    pub detection_count: u64,
}

/// One `(parameter, cost)` observation for the optimum fitter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostSample {
    pub parameter: f64,
    pub cost: f64,
}

impl CostSample {
    pub fn new(parameter: f64, cost: f64) -> Self {
        Self { parameter, cost }
    }
}

/// Coefficients of `cost(x) = a/x + b*x + c*x^2 + d`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostCoefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl CostCoefficients {
    pub fn from_array(p: [f64; 4]) -> Self {
        Self {
            a: p[0],
            b: p[1],
            c: p[2],
            d: p[3],
        }
    }

    /// Coefficients in design-row order `[a, b, c, d]`.
    pub fn to_array(self) -> [f64; 4] {
        [self.a, self.b, self.c, self.d]
    }

    pub fn predict(&self, x: f64) -> f64 {
        crate::models::predict(&self.to_array(), x)
    }
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    /// `None` when the observed costs have zero variance.
    pub r_squared: Option<f64>,
    pub n: usize,
    pub distinct_parameters: usize,
}

/// Closed interval of observed parameter values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
}

/// Minimizer of the fitted curve within the observed range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Optimum {
    pub parameter: f64,
    pub cost: f64,
}

/// Output of the optimum fitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub coefficients: CostCoefficients,
    pub quality: FitQuality,
    pub iterations: usize,
    pub range: ParameterRange,
    pub optimum: Optimum,
}

impl FittedModel {
    /// Sample the fitted curve at `n` evenly spaced points across the observed range.
    pub fn curve_grid(&self, n: usize) -> CurveGrid {
        let x = crate::fit::lin_space(self.range.min, self.range.max, n.max(2));
        let cost = x.iter().map(|&xi| self.coefficients.predict(xi)).collect();
        CurveGrid { x, cost }
    }
}

/// How trials are split into independent fits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupBy {
    /// One fit over all rows of all inputs.
    None,
    /// One fit per distinct value of a column (e.g. prepass distance).
    Column(String),
    /// One fit per input file (e.g. one file per garbage-collector variant).
    File,
}

/// Configuration of a `tradeoff frontier` run.
#[derive(Debug, Clone)]
pub struct FrontierConfig {
    pub csv_path: PathBuf,
    /// Parameter columns carried into the frontier records. Empty means all
    /// columns that are not the cost or detection column.
    pub parameter_columns: Vec<String>,
    pub cost_column: String,
    pub detections_column: String,
    pub ground_truth: GroundTruth,
    /// Average repeated configurations before extracting the frontier.
    pub aggregate: bool,
    /// Accuracy (percent) highlighted in the summary.
    pub threshold_pct: f64,
    pub show_all: bool,
    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

/// Configuration of a `tradeoff fit` run.
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub csv_paths: Vec<PathBuf>,
    pub parameter_column: String,
    pub cost_column: String,
    pub group_by: GroupBy,
    pub max_iterations: usize,
    pub grid_points: usize,
    pub curve_points: usize,
    pub detections_column: Option<String>,
    pub export_model: Option<PathBuf>,
}

/// A saved fitted model (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub fits: Vec<GroupFitRecord>,
}

/// One fitted group inside a `ModelFile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupFitRecord {
    pub group: String,
    pub parameter: String,
    pub cost_column: String,
    pub model: FittedModel,
    pub grid: CurveGrid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveGrid {
    pub x: Vec<f64>,
    pub cost: Vec<f64>,
}

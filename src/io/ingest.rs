//! CSV ingest and normalization.
//!
//! This module turns a benchmark-results CSV into `Trial`s that are safe to
//! analyse. The expected layout is the one the benchmark runner writes:
//!
//! ```text
//! tolerance_km,step_ratio,cell_ratio,interp_stride,detections,events,conj,...,total_s
//! ```
//!
//! Design goals:
//! - **Column-driven**: callers name the parameter/cost/detection columns;
//!   nothing else in the file is interpreted
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (row order is preserved)
//! - **Separation of concerns**: no analysis logic here

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, warn};

use crate::domain::{ParameterSet, Trial};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Raw numeric table. Non-numeric or empty cells are `None`.
#[derive(Debug, Clone)]
pub struct BenchmarkTable {
    /// File path (or other label) the table was read from.
    pub source: String,
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
    pub row_errors: Vec<RowError>,
}

#[derive(Debug, Clone)]
pub struct TableRow {
    pub line: usize,
    pub cells: Vec<Option<f64>>,
}

/// Which columns map to which trial fields.
#[derive(Debug, Clone)]
pub struct TrialSchema {
    /// Empty means every column except cost and detections.
    pub parameter_columns: Vec<String>,
    pub cost_column: String,
    /// When absent every trial gets `detection_count = 0` (fits need cost only).
    pub detections_column: Option<String>,
}

/// Trials extracted from a table plus the rows that were skipped.
#[derive(Debug, Clone)]
pub struct TrialExtraction {
    pub trials: Vec<Trial>,
    pub row_errors: Vec<RowError>,
}

/// Open and parse a CSV file.
pub fn load_table(path: &Path) -> Result<BenchmarkTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_table(file, path.display().to_string())
}

/// Parse CSV from any reader.
pub fn read_table<R: Read>(reader: R, source: impl Into<String>) -> Result<BenchmarkTable, AppError> {
    let source = source.into();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers in '{source}': {e}")))?
        .clone();
    let columns = normalized_headers(&headers);
    if columns.iter().all(|c| c.is_empty()) {
        return Err(AppError::new(2, format!("CSV '{source}' has no header row.")));
    }

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: 1-based lines, plus the header line.
        let line = idx + 2;
        match result {
            Ok(record) => rows.push(TableRow {
                line,
                cells: (0..columns.len())
                    .map(|i| record.get(i).and_then(parse_number))
                    .collect(),
            }),
            Err(e) => row_errors.push(RowError {
                line,
                message: format!("CSV parse error: {e}"),
            }),
        }
    }

    debug!(source = %source, rows = rows.len(), errors = row_errors.len(), "read benchmark table");
    Ok(BenchmarkTable {
        source,
        columns,
        rows,
        row_errors,
    })
}

impl BenchmarkTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = normalize_header_name(name);
        self.columns.iter().position(|c| *c == name)
    }

    /// Map rows to trials. Rows missing a required value are skipped and
    /// reported; a missing column is an error.
    pub fn to_trials(&self, schema: &TrialSchema) -> Result<TrialExtraction, AppError> {
        let cost_idx = self.require_column(&schema.cost_column)?;
        let det_idx = match &schema.detections_column {
            Some(name) => Some(self.require_column(name)?),
            None => None,
        };

        let param_idx: Vec<(String, usize)> = if schema.parameter_columns.is_empty() {
            self.columns
                .iter()
                .enumerate()
                .filter(|(i, c)| *i != cost_idx && Some(*i) != det_idx && !c.is_empty())
                .map(|(i, c)| (c.clone(), i))
                .collect()
        } else {
            schema
                .parameter_columns
                .iter()
                .map(|name| -> Result<(String, usize), AppError> {
                    Ok((normalize_header_name(name), self.require_column(name)?))
                })
                .collect::<Result<_, AppError>>()?
        };

        let mut trials = Vec::with_capacity(self.rows.len());
        let mut row_errors = self.row_errors.clone();

        for row in &self.rows {
            match self.row_to_trial(row, &param_idx, cost_idx, det_idx) {
                Ok(trial) => trials.push(trial),
                Err(message) => row_errors.push(RowError {
                    line: row.line,
                    message,
                }),
            }
        }

        if !row_errors.is_empty() {
            warn!(
                source = %self.source,
                skipped = row_errors.len(),
                "skipped benchmark rows with missing or invalid values"
            );
        }
        if trials.is_empty() {
            return Err(AppError::new(
                3,
                format!("No valid rows remain in '{}'.", self.source),
            ));
        }

        Ok(TrialExtraction { trials, row_errors })
    }

    fn require_column(&self, name: &str) -> Result<usize, AppError> {
        self.column_index(name).ok_or_else(|| {
            AppError::new(
                2,
                format!(
                    "Column '{name}' not found in '{}' (columns: {}).",
                    self.source,
                    self.columns.join(", ")
                ),
            )
        })
    }

    fn row_to_trial(
        &self,
        row: &TableRow,
        param_idx: &[(String, usize)],
        cost_idx: usize,
        det_idx: Option<usize>,
    ) -> Result<Trial, String> {
        let value = |idx: usize| -> Result<f64, String> {
            row.cells
                .get(idx)
                .copied()
                .flatten()
                .ok_or_else(|| format!("missing or non-numeric '{}'", self.columns[idx]))
        };

        let mut parameters = ParameterSet::new();
        for (name, idx) in param_idx {
            parameters.insert(name.clone(), value(*idx)?);
        }

        let cost = value(cost_idx)?;
        if cost < 0.0 {
            return Err(format!("negative cost {cost}"));
        }

        let detection_count = match det_idx {
            Some(idx) => {
                let v = value(idx)?;
                if v < 0.0 {
                    return Err(format!("negative detection count {v}"));
                }
                v.round() as u64
            }
            None => 0,
        };

        Ok(Trial::new(parameters, cost, detection_count))
    }
}

fn normalized_headers(headers: &StringRecord) -> Vec<String> {
    headers.iter().map(normalize_header_name).collect()
}

/// Canonical form of a column name, as stored in `BenchmarkTable::columns`
/// and in trial parameter sets.
pub fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

//! Domain types used throughout the analysis.
//!
//! This module defines:
//!
//! - input observations (`Trial`, `ParameterSet`, `CostSample`)
//! - analysis outputs (`FrontierPoint`, `FittedModel`, etc.)
//! - run configuration (`FrontierConfig`, `FitConfig`)

pub mod types;

pub use types::*;

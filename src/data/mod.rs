//! Dataset preparation between ingest and analysis.

pub mod aggregate;

pub use aggregate::*;

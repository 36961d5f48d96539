//! Mathematical utilities: cost basis functions, least squares, bounded minimization.

pub mod basis;
pub mod bounded;
pub mod ols;

pub use basis::*;
pub use bounded::*;
pub use ols::*;

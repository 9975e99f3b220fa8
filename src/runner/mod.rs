//! Plan execution engine
//!
//! This module handles running a plan's steps: guard evaluation, variable
//! interpolation, process launching and the run report.

pub mod condition;
pub mod context;
pub mod executor;
pub mod interpolate;
pub mod process;
pub mod report;

// Re-export main types
pub use condition::{evaluate, evaluate_expr, parse as parse_condition, CompareOp, Expr, Predicate, Value};
pub use context::*;
pub use executor::*;
pub use interpolate::*;
pub use process::*;
pub use report::*;

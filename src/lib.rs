//! jrebuild - assemble a custom JRE from a declared build plan
//!
//! A plan is an ordered list of external commands (`jlink` and friends) with
//! per-step guards and exit-code policy. jrebuild checks the host once, then
//! runs the plan step by step, aborting on the first unrecoverable failure.

// Public modules
pub mod cli;
pub mod error;
pub mod plan;
pub mod preflight;
pub mod runner;
pub mod ui;

// Re-export commonly used types
pub use error::{BuildError, Result};
pub use plan::{parse_plan, parse_plan_file, Plan, Step};
pub use runner::{ExecutionContext, Executor, RunReport};

/// Current version of jrebuild
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

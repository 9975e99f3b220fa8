//! CLI interface and argument parsing
//!
//! This module handles command-line parsing, shell completion and wiring the
//! pre-flight checks, plan loading and executor together.

pub mod app;
pub mod completion;

// Re-export main types
pub use app::*;

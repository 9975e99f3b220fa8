//! Plan parsing and validation
//!
//! This module handles parsing of plan files (JSON, or YAML by extension)
//! into a validated, ordered list of steps.

pub mod parse;
pub mod schema;
pub mod step;
pub mod types;

// Re-export main types
pub use parse::*;
pub use schema::*;
pub use step::*;
pub use types::*;

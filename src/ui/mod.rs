//! Terminal output

pub mod logger;

pub use logger::*;

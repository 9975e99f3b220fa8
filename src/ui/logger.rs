//! Leveled, colored logging to stderr
//!
//! A [`Logger`] is built once from the CLI flags and handed to the executor and
//! process runner. Stdout is left to the commands being run.

use colored::Colorize;
use std::io::{self, Write};

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Warnings and errors only
    Quiet = 0,
    #[default]
    Normal = 1,
    Verbose = 2,
    Debug = 3,
}

/// Logger carrying a configured verbosity
#[derive(Debug, Clone, Copy, Default)]
pub struct Logger {
    verbosity: Verbosity,
}

impl Logger {
    pub fn new(verbosity: Verbosity) -> Self {
        Logger { verbosity }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Whether messages at `level` are printed
    pub fn enabled(&self, level: Verbosity) -> bool {
        self.verbosity >= level
    }

    pub fn error(&self, message: &str) {
        emit(&"[ERROR]".red().bold().to_string(), message);
    }

    pub fn warn(&self, message: &str) {
        emit(&"[WARN]".yellow().bold().to_string(), message);
    }

    pub fn info(&self, message: &str) {
        if self.enabled(Verbosity::Normal) {
            emit(&"[INFO]".cyan().to_string(), message);
        }
    }

    pub fn verbose(&self, message: &str) {
        if self.enabled(Verbosity::Verbose) {
            emit(&"[INFO]".cyan().to_string(), message);
        }
    }

    pub fn debug(&self, message: &str) {
        if self.enabled(Verbosity::Debug) {
            emit(&"[DEBUG]".dimmed().to_string(), message);
        }
    }

    /// Announce a step about to run
    pub fn step_start(&self, label: &str, command_line: &str) {
        if self.enabled(Verbosity::Normal) {
            emit(
                &"[RUN]".cyan().bold().to_string(),
                &format!("{}: {}", label.bold(), command_line),
            );
        }
    }

    /// Announce a step whose condition was false
    pub fn step_skip(&self, label: &str, condition: &str) {
        self.verbose(&format!("Skipping {} (condition false: {})", label, condition));
    }
}

fn emit(prefix: &str, message: &str) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "{} {}", prefix, message);
}

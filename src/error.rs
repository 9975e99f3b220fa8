//! Error types for jrebuild

use crate::runner::RunReport;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for jrebuild operations
pub type Result<T> = std::result::Result<T, BuildError>;

/// Main error type for jrebuild
#[derive(Error, Debug)]
pub enum BuildError {
    /// Pre-flight check failures
    #[error("Prerequisite error: {0}")]
    Prerequisite(#[from] PrerequisiteError),

    /// Plan file parsing and validation errors
    #[error("Plan validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A plan that stopped before its last step
    #[error("{0}")]
    Aborted(Box<PlanAborted>),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<PlanAborted> for BuildError {
    fn from(err: PlanAborted) -> Self {
        BuildError::Aborted(Box::new(err))
    }
}

/// Pre-flight check failures, raised before any plan activity
#[derive(Error, Debug)]
pub enum PrerequisiteError {
    #[error("You must set env var {0} to your JDK root")]
    MissingVariable(String),

    #[error("{name} not accessible at {}", .path.display())]
    ToolMissing { name: String, path: PathBuf },

    #[error("{name} not executable at {}", .path.display())]
    ToolNotExecutable { name: String, path: PathBuf },

    #[error("{name} not accessible at {}", .path.display())]
    DirectoryMissing { name: String, path: PathBuf },

    #[error("New JRE name '{name}' not of form {pattern}")]
    BadTargetName { name: String, pattern: String },

    #[error("Invalid target name pattern '{pattern}': {error}")]
    BadPattern { pattern: String, error: String },

    #[error("JRE target directory '{}' already exists.  Try -r switch", .0.display())]
    OutputExists(PathBuf),

    #[error("Failed to remove '{}': {error}", .path.display())]
    RemoveFailed { path: PathBuf, error: String },
}

/// Structural problems in a plan description
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Failed to read plan file '{}': {error}", .path.display())]
    Read { path: PathBuf, error: String },

    #[error("{source_name}: {error}")]
    Syntax { source_name: String, error: String },

    #[error("{0}: plan must be a list of step objects")]
    NotASequence(String),

    #[error("{0}: plan contains no steps")]
    EmptyPlan(String),

    #[error("{source_name}: step {index} has an empty 'cmd'")]
    EmptyArgv { source_name: String, index: usize },

    #[error("{source_name}: step {index} is invalid: {error}")]
    InvalidStep {
        source_name: String,
        index: usize,
        error: String,
    },
}

/// Guard expression failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConditionError {
    #[error("Variable '{0}' is not defined")]
    UndefinedVariable(String),

    #[error("Unknown predicate '{0}'")]
    UnknownPredicate(String),

    #[error("Syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("Condition is empty")]
    Empty,

    #[error("{0}")]
    Interpolation(#[from] InterpolationError),
}

/// Variable interpolation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpolationError {
    #[error("Variable '{0}' is not defined")]
    UndefinedVariable(String),

    #[error("Recursive interpolation detected")]
    RecursiveInterpolation,
}

/// The designated program could not be launched at all
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Working directory '{}' does not exist", .0.display())]
    WorkingDirectoryMissing(PathBuf),

    #[error("Program '{program}' not found: {error}")]
    NotFound { program: String, error: String },

    #[error("Failed to start '{}': {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to wait for '{}': {source}", .program.display())]
    Wait {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Empty command line")]
    EmptyArgv,
}

/// A step ran but violated its exit-code policy
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("{}{}", describe_exit(.code), format_tail(.stderr_tail))]
    NonZeroExit {
        code: Option<i32>,
        stderr_tail: String,
    },
}

/// Why a plan stopped early
#[derive(Error, Debug)]
pub enum AbortReason {
    #[error("condition failed: {0}")]
    Condition(#[from] ConditionError),

    #[error("{0}")]
    Interpolation(#[from] InterpolationError),

    #[error("{0}")]
    Runner(#[from] RunnerError),

    #[error("{0}")]
    Execution(#[from] ExecutionError),
}

/// A plan aborted at a step, with the report of everything up to that point
#[derive(Error, Debug)]
#[error("Plan aborted at step {index} ({label}): {reason}")]
pub struct PlanAborted {
    pub index: usize,
    pub label: String,
    #[source]
    pub reason: AbortReason,
    pub report: RunReport,
}

impl PlanAborted {
    /// Exit code of the failing step, when the abort came from one
    pub fn exit_code(&self) -> Option<i32> {
        match &self.reason {
            AbortReason::Execution(ExecutionError::NonZeroExit { code, .. }) => *code,
            _ => None,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with code {}", code),
        None => "terminated by signal".to_string(),
    }
}

fn format_tail(tail: &str) -> String {
    if tail.is_empty() {
        String::new()
    } else {
        format!("\n--- stderr (tail) ---\n{}", tail)
    }
}

/// Specialized result type for plan loading
pub type PlanResult<T> = std::result::Result<T, ValidationError>;

/// Specialized result type for pre-flight checks
pub type PrerequisiteResult<T> = std::result::Result<T, PrerequisiteError>;

/// Specialized result type for condition evaluation
pub type ConditionResult<T> = std::result::Result<T, ConditionError>;

/// Specialized result type for interpolation operations
pub type InterpolationResult<T> = std::result::Result<T, InterpolationError>;

/// Specialized result type for process launching
pub type RunnerResult<T> = std::result::Result<T, RunnerError>;

//! Run reports
//!
//! A [`RunReport`] is built fresh for each plan execution and handed back to the
//! caller, either directly or inside the abort error.

use crate::runner::ProcessOutput;
use std::time::Duration;

/// Result of one executed step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Succeeded,
    Failed,
}

/// Record of one executed (non-skipped) step
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub index: usize,
    pub label: String,
    pub status: StepStatus,
    /// Exit code; `None` when terminated by a signal
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
    /// Full stdout, captured whether or not it was displayed
    pub stdout: String,
    /// Full stderr, captured whether or not it was displayed
    pub stderr: String,
}

impl StepOutcome {
    pub fn from_output(index: usize, label: String, output: ProcessOutput) -> Self {
        let status = if output.success() {
            StepStatus::Succeeded
        } else {
            StepStatus::Failed
        };

        StepOutcome {
            index,
            label,
            status,
            exit_code: output.exit_code,
            elapsed: output.elapsed,
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == StepStatus::Succeeded
    }

    /// The last `lines` lines of captured stderr
    pub fn stderr_tail(&self, lines: usize) -> String {
        tail_lines(&self.stderr, lines)
    }
}

/// A step whose condition evaluated false
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedStep {
    pub index: usize,
    pub label: String,
}

/// Final state of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Still running; only seen while the executor is building the report
    InProgress,
    Completed,
    /// Stopped at the step with this index
    Aborted { index: usize },
}

/// Everything that happened during one plan execution
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub outcomes: Vec<StepOutcome>,
    pub skipped: Vec<SkippedStep>,
    pub elapsed: Duration,
    pub status: RunStatus,
}

impl RunReport {
    pub(crate) fn new() -> Self {
        RunReport {
            outcomes: Vec::new(),
            skipped: Vec::new(),
            elapsed: Duration::ZERO,
            status: RunStatus::InProgress,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Index of the step the plan stopped at, if it aborted
    pub fn aborted_at(&self) -> Option<usize> {
        match self.status {
            RunStatus::Aborted { index } => Some(index),
            _ => None,
        }
    }

    pub fn executed_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Executed steps that exited non-zero (including tolerated ones)
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded()).count()
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        let state = match self.status {
            RunStatus::InProgress => "in progress".to_string(),
            RunStatus::Completed => "completed".to_string(),
            RunStatus::Aborted { index } => format!("aborted at step {}", index),
        };
        format!(
            "{}: {} executed ({} non-zero), {} skipped in {:.3} s",
            state,
            self.executed_count(),
            self.failed_count(),
            self.skipped_count(),
            self.elapsed.as_secs_f64()
        )
    }
}

fn tail_lines(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}

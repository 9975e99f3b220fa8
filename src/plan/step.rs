//! Runtime plan representation
//!
//! This differs from [`StepSpec`] by applying defaults and recording each step's position.

use crate::error::PlanResult;
use crate::plan::schema::validate_steps;
use crate::plan::types::StepSpec;
use std::path::PathBuf;

/// One unit of work: a single external command plus its policy flags
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Zero-based position in the plan
    pub index: usize,

    /// Human-readable name
    pub label: Option<String>,

    /// Program and arguments
    pub argv: Vec<String>,

    /// Working directory, resolved against the context base directory when relative
    pub working_dir: Option<PathBuf>,

    /// Whether a non-zero exit aborts the plan
    pub require_zero_exit: bool,

    /// Stdout visibility; `None` falls back to the run-wide default
    pub show_stdout: Option<bool>,

    /// Stderr visibility; `None` falls back to the run-wide default
    pub show_stderr: Option<bool>,

    /// Guard expression
    pub condition: Option<String>,

    /// Inherit the terminal's stdin
    pub interactive: bool,
}

impl Step {
    /// Create a step that runs `argv` with default policy
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Step {
            index: 0,
            label: None,
            argv: argv.into_iter().map(Into::into).collect(),
            working_dir: None,
            require_zero_exit: true,
            show_stdout: None,
            show_stderr: None,
            condition: None,
            interactive: false,
        }
    }

    /// Create a step from its plan file entry
    pub fn from_spec(index: usize, spec: StepSpec) -> Self {
        Step {
            index,
            label: spec.label,
            argv: spec.cmd,
            working_dir: spec.cwd.map(PathBuf::from),
            require_zero_exit: spec.require0.unwrap_or(true),
            show_stdout: spec.std_out,
            show_stderr: spec.std_err,
            condition: spec.condition,
            interactive: spec.interactive.unwrap_or(false),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_require_zero_exit(mut self, require: bool) -> Self {
        self.require_zero_exit = require;
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_output(mut self, show_stdout: bool, show_stderr: bool) -> Self {
        self.show_stdout = Some(show_stdout);
        self.show_stderr = Some(show_stderr);
        self
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Label, or `step <index>` when the step has none
    pub fn display_label(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => format!("step {}", self.index),
        }
    }

    /// The command line as a single printable string
    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }
}

/// An ordered, validated, non-empty sequence of steps
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    source: String,
    steps: Vec<Step>,
}

impl Plan {
    /// Build a plan, renumbering the steps by position and validating them
    pub fn new(source: impl Into<String>, steps: Vec<Step>) -> PlanResult<Self> {
        let source = source.into();
        let steps: Vec<Step> = steps
            .into_iter()
            .enumerate()
            .map(|(index, mut step)| {
                step.index = index;
                step
            })
            .collect();

        validate_steps(&source, &steps)?;

        Ok(Plan { source, steps })
    }

    /// Where the plan came from (file path or `<inline>`)
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

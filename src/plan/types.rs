//! Plan file types
//!
//! This module defines the data structures that represent one entry of a plan file.
//! Field names follow the external schema (`cmd`, `require0`, `stdOut`, ...).

use serde::{Deserialize, Serialize};

/// One step as written in a plan file
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StepSpec {
    /// Human-readable name (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Program and arguments
    pub cmd: Vec<String>,

    /// Working directory for the command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,

    /// Whether a non-zero exit aborts the plan (defaults to true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require0: Option<bool>,

    /// Display captured stdout
    #[serde(rename = "stdOut", default, skip_serializing_if = "Option::is_none")]
    pub std_out: Option<bool>,

    /// Display captured stderr
    #[serde(rename = "stdErr", default, skip_serializing_if = "Option::is_none")]
    pub std_err: Option<bool>,

    /// Guard expression; the step is skipped when it evaluates false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    /// Hand the terminal's stdin to the command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive: Option<bool>,
}

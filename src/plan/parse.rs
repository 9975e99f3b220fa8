//! Plan file parsing

use crate::error::{PlanResult, ValidationError};
use crate::plan::step::{Plan, Step};
use crate::plan::types::StepSpec;
use std::fs;
use std::path::Path;

/// Source name used for plans that did not come from a file
pub const INLINE_SOURCE: &str = "<inline>";

/// Text formats a plan can be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanFormat {
    Json,
    Yaml,
}

impl PlanFormat {
    /// Pick the format from a file extension; anything but `.yml`/`.yaml` is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml") => {
                PlanFormat::Yaml
            }
            _ => PlanFormat::Json,
        }
    }
}

/// Parse a plan file from a path
pub fn parse_plan_file(path: &Path) -> PlanResult<Plan> {
    let contents = fs::read_to_string(path).map_err(|e| ValidationError::Read {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    parse_plan(
        &contents,
        PlanFormat::from_path(path),
        &path.display().to_string(),
    )
}

/// Parse a plan from a string
pub fn parse_plan(text: &str, format: PlanFormat, source: &str) -> PlanResult<Plan> {
    let specs = match format {
        PlanFormat::Json => parse_json_specs(text, source)?,
        PlanFormat::Yaml => parse_yaml_specs(text, source)?,
    };

    let steps = specs
        .into_iter()
        .enumerate()
        .map(|(index, spec)| Step::from_spec(index, spec))
        .collect();

    Plan::new(source, steps)
}

fn parse_json_specs(text: &str, source: &str) -> PlanResult<Vec<StepSpec>> {
    use serde_json::Value;

    let value: Value = serde_json::from_str(text).map_err(|e| ValidationError::Syntax {
        source_name: source.to_string(),
        error: e.to_string(),
    })?;

    let items = match value {
        Value::Array(items) => items,
        _ => return Err(ValidationError::NotASequence(source.to_string())),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<StepSpec>(item).map_err(|e| ValidationError::InvalidStep {
                source_name: source.to_string(),
                index,
                error: e.to_string(),
            })
        })
        .collect()
}

fn parse_yaml_specs(text: &str, source: &str) -> PlanResult<Vec<StepSpec>> {
    use serde_yaml::Value;

    let value: Value = serde_yaml::from_str(text).map_err(|e| ValidationError::Syntax {
        source_name: source.to_string(),
        error: e.to_string(),
    })?;

    let items = match value {
        Value::Sequence(items) => items,
        // An empty document is an empty plan, not a shape error
        Value::Null => Vec::new(),
        _ => return Err(ValidationError::NotASequence(source.to_string())),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_yaml::from_value::<StepSpec>(item).map_err(|e| ValidationError::InvalidStep {
                source_name: source.to_string(),
                index,
                error: e.to_string(),
            })
        })
        .collect()
}

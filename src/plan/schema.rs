//! Plan validation
//!
//! Structural rules checked once at load time. Working directories are not checked
//! here since an earlier step may create them.

use crate::error::{PlanResult, ValidationError};
use crate::plan::step::Step;

/// Validate a complete list of steps
pub fn validate_steps(source: &str, steps: &[Step]) -> PlanResult<()> {
    if steps.is_empty() {
        return Err(ValidationError::EmptyPlan(source.to_string()));
    }

    for step in steps {
        validate_step(source, step)?;
    }

    Ok(())
}

/// Validate a single step
pub fn validate_step(source: &str, step: &Step) -> PlanResult<()> {
    // The program name must be present and non-blank
    match step.argv.first() {
        Some(program) if !program.trim().is_empty() => {}
        _ => {
            return Err(ValidationError::EmptyArgv {
                source_name: source.to_string(),
                index: step.index,
            })
        }
    }

    if let Some(condition) = &step.condition {
        if condition.trim().is_empty() {
            return Err(ValidationError::InvalidStep {
                source_name: source.to_string(),
                index: step.index,
                error: "condition is empty".to_string(),
            });
        }
    }

    if let Some(label) = &step.label {
        if label.trim().is_empty() {
            return Err(ValidationError::InvalidStep {
                source_name: source.to_string(),
                index: step.index,
                error: "label is empty".to_string(),
            });
        }
    }

    Ok(())
}

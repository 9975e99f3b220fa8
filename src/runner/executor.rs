//! Plan execution
//!
//! The executor walks the plan strictly in order. Each step is fully resolved
//! (skipped, succeeded or failed) before the next one starts, and the first
//! unrecoverable failure aborts the plan with the partial report attached.

use crate::error::{AbortReason, ExecutionError, PlanAborted};
use crate::plan::{Plan, Step};
use crate::runner::{
    evaluate_expr, interpolate_list, interpolate_strict, parse_condition, ExecutionContext,
    Invocation, ProcessRunner, RunReport, RunStatus, SkippedStep, StepOutcome, SystemRunner,
};
use crate::ui::Logger;
use std::time::Instant;

/// Lines of captured stderr quoted in a non-zero exit error
pub const STDERR_TAIL_LINES: usize = 10;

/// Stream visibility for steps that do not set `stdOut` / `stdErr`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDefaults {
    pub show_stdout: bool,
    pub show_stderr: bool,
}

impl Default for StreamDefaults {
    fn default() -> Self {
        StreamDefaults {
            show_stdout: true,
            show_stderr: true,
        }
    }
}

/// Drives a plan through a [`ProcessRunner`]
pub struct Executor<R: ProcessRunner = SystemRunner> {
    runner: R,
    logger: Logger,
    defaults: StreamDefaults,
}

impl Executor<SystemRunner> {
    /// Executor that spawns real processes
    pub fn system(logger: Logger) -> Self {
        Executor::new(SystemRunner::new(logger), logger)
    }
}

impl<R: ProcessRunner> Executor<R> {
    pub fn new(runner: R, logger: Logger) -> Self {
        Executor {
            runner,
            logger,
            defaults: StreamDefaults::default(),
        }
    }

    /// Set stream visibility for steps without explicit flags
    pub fn with_stream_defaults(mut self, defaults: StreamDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Execute every step of `plan` in order
    pub fn run(&self, plan: &Plan, ctx: &ExecutionContext) -> Result<RunReport, PlanAborted> {
        let mut report = RunReport::new();
        let start = Instant::now();

        self.logger.debug(&format!(
            "Running {} ({} steps)",
            plan.source(),
            plan.len()
        ));

        for step in plan {
            if let Err(reason) = self.run_step(step, ctx, &mut report) {
                report.elapsed = start.elapsed();
                report.status = RunStatus::Aborted { index: step.index };
                return Err(PlanAborted {
                    index: step.index,
                    label: step.display_label(),
                    reason,
                    report,
                });
            }
        }

        report.elapsed = start.elapsed();
        report.status = RunStatus::Completed;
        self.logger.debug(&report.summary());

        Ok(report)
    }

    /// Execute a single step, recording it in `report`
    fn run_step(
        &self,
        step: &Step,
        ctx: &ExecutionContext,
        report: &mut RunReport,
    ) -> Result<(), AbortReason> {
        let label = step.display_label();

        // Check the guard
        if let Some(condition) = &step.condition {
            let guard = parse_condition(condition)?;
            self.logger.debug(&format!(
                "{} guard reads [{}]",
                label,
                guard.variables().join(", ")
            ));
            if !evaluate_expr(&guard, ctx)? {
                self.logger.step_skip(&label, condition);
                report.skipped.push(SkippedStep {
                    index: step.index,
                    label,
                });
                return Ok(());
            }
        }

        let argv = interpolate_list(&step.argv, ctx.vars())?;
        let working_dir = match &step.working_dir {
            Some(dir) => ctx.resolve(interpolate_strict(&dir.to_string_lossy(), ctx.vars())?),
            None => ctx.base_dir().to_path_buf(),
        };

        self.logger.step_start(&label, &argv.join(" "));

        let output = self.runner.run(&Invocation {
            argv: &argv,
            working_dir: &working_dir,
            env: ctx.vars(),
            interactive: step.interactive,
            show_stdout: step.show_stdout.unwrap_or(self.defaults.show_stdout),
            show_stderr: step.show_stderr.unwrap_or(self.defaults.show_stderr),
        })?;

        let outcome = StepOutcome::from_output(step.index, label, output);
        self.logger.verbose(&format!(
            "{} finished with {:?} in {:.3} s",
            outcome.label,
            outcome.exit_code,
            outcome.elapsed.as_secs_f64()
        ));

        let violation = if outcome.succeeded() {
            None
        } else if step.require_zero_exit {
            Some(ExecutionError::NonZeroExit {
                code: outcome.exit_code,
                stderr_tail: outcome.stderr_tail(STDERR_TAIL_LINES),
            })
        } else {
            self.logger.warn(&format!(
                "{} exited with {:?}; continuing (require0 is false)",
                outcome.label, outcome.exit_code
            ));
            None
        };

        report.outcomes.push(outcome);

        match violation {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}

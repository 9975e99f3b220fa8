//! Process execution
//!
//! `ProcessRunner` is the seam the executor drives. `SystemRunner` spawns real
//! processes; `MockRunner` records calls and replays preset results.

use crate::error::{RunnerError, RunnerResult};
use crate::ui::Logger;
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::env;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Everything needed to launch one command
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Program and arguments, already interpolated
    pub argv: &'a [String],
    /// Directory the command runs in
    pub working_dir: &'a Path,
    /// Variables layered over the inherited environment
    pub env: &'a BTreeMap<String, String>,
    /// Inherit the terminal's stdin instead of closing it
    pub interactive: bool,
    /// Pass captured stdout through to our stdout
    pub show_stdout: bool,
    /// Pass captured stderr through to our stderr
    pub show_stderr: bool,
}

/// What a finished process left behind
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutput {
    /// Exit code; `None` when terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Trait for launching one external command and waiting for it
pub trait ProcessRunner {
    fn run(&self, invocation: &Invocation<'_>) -> RunnerResult<ProcessOutput>;
}

/// Production runner backed by `std::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner {
    logger: Logger,
}

impl SystemRunner {
    pub fn new(logger: Logger) -> Self {
        SystemRunner { logger }
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation<'_>) -> RunnerResult<ProcessOutput> {
        let (program, args) = invocation
            .argv
            .split_first()
            .ok_or(RunnerError::EmptyArgv)?;

        if !invocation.working_dir.is_dir() {
            return Err(RunnerError::WorkingDirectoryMissing(
                invocation.working_dir.to_path_buf(),
            ));
        }

        let program = resolve_program(program, invocation.working_dir, invocation.env)?;
        self.logger.debug(&format!(
            "Resolved '{}' to {} (cwd {})",
            invocation.argv[0],
            program.display(),
            invocation.working_dir.display()
        ));

        let mut command = Command::new(&program);
        command
            .args(args)
            .current_dir(invocation.working_dir)
            .envs(invocation.env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if invocation.interactive {
            command.stdin(Stdio::inherit());
        } else {
            command.stdin(Stdio::null());
        }

        let start = Instant::now();
        let mut child = command.spawn().map_err(|source| RunnerError::Spawn {
            program: program.clone(),
            source,
        })?;

        let child_stdout = child.stdout.take();
        let child_stderr = child.stderr.take();
        let show_stdout = invocation.show_stdout;
        let show_stderr = invocation.show_stderr;

        let (stdout, stderr) = thread::scope(|scope| {
            let out = scope.spawn(move || pump(child_stdout, show_stdout.then(io::stdout)));
            let err = scope.spawn(move || pump(child_stderr, show_stderr.then(io::stderr)));
            (out.join().unwrap_or_default(), err.join().unwrap_or_default())
        });

        let status = child.wait().map_err(|source| RunnerError::Wait {
            program: program.clone(),
            source,
        })?;

        Ok(ProcessOutput {
            exit_code: status.code(),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            elapsed: start.elapsed(),
        })
    }
}

/// Resolve a program name the way a shell would, without a shell
///
/// Names containing a path separator are taken as paths (relative ones against
/// the working directory); bare names are looked up on `PATH`, preferring the
/// `PATH` from `env` over the inherited one.
pub fn resolve_program(
    program: &str,
    working_dir: &Path,
    env: &BTreeMap<String, String>,
) -> RunnerResult<PathBuf> {
    let path = Path::new(program);

    if path.is_absolute() || path.components().count() > 1 {
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else {
            working_dir.join(path)
        };
        if !resolved.exists() {
            return Err(RunnerError::NotFound {
                program: program.to_string(),
                error: format!("{} does not exist", resolved.display()),
            });
        }
        return Ok(resolved);
    }

    let search_path = env
        .get("PATH")
        .cloned()
        .or_else(|| env::var("PATH").ok());

    which::which_in(program, search_path, working_dir).map_err(|e| RunnerError::NotFound {
        program: program.to_string(),
        error: e.to_string(),
    })
}

/// Copy a child stream into a buffer, echoing to `sink` when given
fn pump<R: Read, W: Write>(source: Option<R>, mut sink: Option<W>) -> Vec<u8> {
    let mut captured = Vec::new();
    let Some(mut source) = source else {
        return captured;
    };

    let mut buf = [0u8; 8192];
    loop {
        match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                captured.extend_from_slice(&buf[..n]);
                if let Some(out) = sink.as_mut() {
                    // A closed terminal must not stop the capture
                    let _ = out.write_all(&buf[..n]).and_then(|_| out.flush());
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }

    captured
}

/// Preset result for one `MockRunner` call
#[derive(Debug, Clone, PartialEq)]
pub enum MockResponse {
    /// The process ran and exited
    Exit {
        code: i32,
        stdout: String,
        stderr: String,
    },
    /// The program could not be found
    NotFound,
}

impl MockResponse {
    pub fn exit(code: i32) -> Self {
        MockResponse::Exit {
            code,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn output(code: i32, stdout: &str, stderr: &str) -> Self {
        MockResponse::Exit {
            code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }
}

/// One call seen by `MockRunner`
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub argv: Vec<String>,
    pub working_dir: PathBuf,
    pub interactive: bool,
    pub show_stdout: bool,
    pub show_stderr: bool,
}

/// Test-double runner that records invocations and returns preset responses
///
/// Calls beyond the preset responses succeed with empty output.
#[derive(Debug, Default)]
pub struct MockRunner {
    responses: RefCell<VecDeque<MockResponse>>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: Vec<MockResponse>) -> Self {
        MockRunner {
            responses: RefCell::new(responses.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// The argv of every call, in order
    pub fn executed_commands(&self) -> Vec<Vec<String>> {
        self.calls.borrow().iter().map(|c| c.argv.clone()).collect()
    }
}

impl ProcessRunner for MockRunner {
    fn run(&self, invocation: &Invocation<'_>) -> RunnerResult<ProcessOutput> {
        self.calls.borrow_mut().push(RecordedCall {
            argv: invocation.argv.to_vec(),
            working_dir: invocation.working_dir.to_path_buf(),
            interactive: invocation.interactive,
            show_stdout: invocation.show_stdout,
            show_stderr: invocation.show_stderr,
        });

        let response = self
            .responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| MockResponse::exit(0));

        match response {
            MockResponse::Exit {
                code,
                stdout,
                stderr,
            } => Ok(ProcessOutput {
                exit_code: Some(code),
                stdout,
                stderr,
                elapsed: Duration::ZERO,
            }),
            MockResponse::NotFound => Err(RunnerError::NotFound {
                program: invocation.argv.first().cloned().unwrap_or_default(),
                error: "mock: not found".to_string(),
            }),
        }
    }
}

//! Main CLI application

use crate::cli::completion::print_completions;
use crate::error::BuildError;
use crate::plan::parse_plan_file;
use crate::preflight::{prepare_output, Prerequisites};
use crate::runner::{
    host_platform, ExecutionContext, Executor, StreamDefaults, HSQLDB_ROOT, JAVA_HOME,
    SRC_JRE_JMODS, TARGET_JRE_NAME, THIS_PLATFORM,
};
use crate::ui::{Logger, Verbosity};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Everything a build needs from the command line
#[derive(Debug, Clone, PartialEq)]
pub struct BuildArgs {
    pub jmods_dir: PathBuf,
    pub hsqldb_root: PathBuf,
    pub target_name: String,
    pub plan_file: PathBuf,
    pub verbosity: Verbosity,
    pub rebuild: bool,
    pub streams: StreamDefaults,
}

impl BuildArgs {
    /// Extract build arguments; `None` when a positional is missing
    pub fn from_matches(matches: &ArgMatches) -> Option<Self> {
        Some(BuildArgs {
            jmods_dir: matches.get_one::<PathBuf>("jmods_dir")?.clone(),
            hsqldb_root: matches.get_one::<PathBuf>("hsqldb_root")?.clone(),
            target_name: matches.get_one::<String>("new_jre_name")?.clone(),
            plan_file: matches.get_one::<PathBuf>("plan_file")?.clone(),
            verbosity: get_verbosity(matches),
            rebuild: matches.get_flag("rebuild"),
            streams: StreamDefaults {
                show_stdout: !matches.get_flag("hide_stdout"),
                show_stderr: !matches.get_flag("hide_stderr"),
            },
        })
    }
}

/// Build the clap command
pub fn build_command() -> Command {
    Command::new("jrebuild")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Build a custom JRE by running a plan of jlink and packaging steps")
        .arg(
            Arg::new("jmods_dir")
                .value_name("JMODS_DIR")
                .help("Directory holding the source JRE's jmods")
                .value_parser(value_parser!(PathBuf))
                .required_unless_present("completions"),
        )
        .arg(
            Arg::new("hsqldb_root")
                .value_name("HSQLDB_ROOT")
                .help("HyperSQL root directory (must contain lib/)")
                .value_parser(value_parser!(PathBuf))
                .required_unless_present("completions"),
        )
        .arg(
            Arg::new("new_jre_name")
                .value_name("NEW_JRE_NAME")
                .help("Name of the JRE directory to create, e.g. hsqldbjre.11")
                .required_unless_present("completions"),
        )
        .arg(
            Arg::new("plan_file")
                .value_name("PLAN_FILE")
                .help("JSON (or YAML) file listing the build steps")
                .value_parser(value_parser!(PathBuf))
                .required_unless_present("completions"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Print debug output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print warnings and errors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("rebuild")
                .short('r')
                .long("rebuild")
                .help("Delete an existing JRE of the same name first")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("hide_stderr")
                .short('E')
                .long("hide-stderr")
                .help("Don't show step stderr unless a step asks for it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("hide_stdout")
                .short('O')
                .long("hide-stdout")
                .help("Don't show step stdout unless a step asks for it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("completions")
                .long("completions")
                .value_name("SHELL")
                .help("Print a shell completion script and exit")
                .value_parser(value_parser!(Shell)),
        )
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("debug") {
        Verbosity::Debug
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else {
        Verbosity::Normal
    }
}

/// Host variables whose names and values are valid UTF-8
fn host_env() -> HashMap<String, String> {
    env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

/// Check the host, load the plan and run it
pub fn execute(args: &BuildArgs) -> Result<(), BuildError> {
    let logger = Logger::new(args.verbosity);
    let cwd = env::current_dir()?;
    let jmods_dir = cwd.join(&args.jmods_dir);
    let hsqldb_root = cwd.join(&args.hsqldb_root);

    let java_home = Prerequisites::for_jre_build(&jmods_dir, &hsqldb_root, &args.target_name)
        .check(&host_env())?;

    let target = cwd.join(&args.target_name);
    if args.rebuild && target.exists() {
        logger.verbose(&format!("Removing existing '{}'", target.display()));
    }
    prepare_output(&target, args.rebuild)?;

    logger.info(&format!(
        "Building '{}' with JDK '{}'",
        args.target_name,
        java_home.display()
    ));

    let plan = parse_plan_file(&args.plan_file)?;
    logger.debug(&format!(
        "Plan file '{}' validated successfully ({} steps)",
        plan.source(),
        plan.len()
    ));

    let ctx = ExecutionContext::new().with_base_dir(cwd).with_vars([
        (JAVA_HOME, java_home.display().to_string()),
        (HSQLDB_ROOT, hsqldb_root.display().to_string()),
        (TARGET_JRE_NAME, args.target_name.clone()),
        (SRC_JRE_JMODS, jmods_dir.display().to_string()),
        (THIS_PLATFORM, host_platform().to_string()),
    ]);

    let executor = Executor::system(logger).with_stream_defaults(args.streams);
    let report = executor.run(&plan, &ctx).map_err(|aborted| {
        logger.verbose(&aborted.report.summary());
        aborted
    })?;

    logger.info(&format!(
        "{} took {:.3} s.",
        plan.source(),
        report.elapsed.as_secs_f64()
    ));

    Ok(())
}

/// Run the CLI application with process arguments
pub fn run() -> Result<(), BuildError> {
    let matches = build_command().get_matches();

    if let Some(shell) = matches.get_one::<Shell>("completions") {
        print_completions(*shell, &mut build_command());
        return Ok(());
    }

    // Variables already in the environment win over .env
    let _ = dotenvy::dotenv();

    match BuildArgs::from_matches(&matches) {
        Some(args) => execute(&args),
        None => {
            build_command().print_help()?;
            println!();
            Ok(())
        }
    }
}

// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::default_config_path;
use crate::types::{BenchMode, RunKind};

/// Command-line arguments for `runwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "runwatch",
    version,
    about = "Build, launch and re-launch programs on the JVM, as linked scripts or as native binaries.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Runwatch.toml` in the current working directory.
    #[arg(long, global = true, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUNWATCH_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Build the project and run its main entry point.
    Run(RunArgs),
    /// Build the project and run its tests through the test runner.
    Test(RunArgs),
}

impl Command {
    pub fn kind(&self) -> RunKind {
        match self {
            Command::Run(_) => RunKind::Main,
            Command::Test(_) => RunKind::Test,
        }
    }

    pub fn args(&self) -> &RunArgs {
        match self {
            Command::Run(args) | Command::Test(args) => args,
        }
    }
}

/// Flags shared by `run` and `test`.
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Rebuild and re-run every time a watched file changes.
    #[arg(long, short = 'w')]
    pub watch: bool,

    /// Entry point to run, bypassing main-class discovery.
    #[arg(long, short = 'M', value_name = "NAME")]
    pub main_class: Option<String>,

    /// Link to a script and run it with the script runtime.
    #[arg(long)]
    pub js: bool,

    /// Compile to a native binary and run it directly.
    #[arg(long)]
    pub native: bool,

    /// Benchmark harness mode (off, run, preprocess-only).
    #[arg(long, value_name = "MODE")]
    pub bench: Option<BenchMode>,

    /// Launch through the runner bootstrap, passing the entry point as its
    /// first argument.
    #[arg(long)]
    pub add_runner_dependency: bool,

    /// Feed bytes piped on stdin to the build command.
    #[arg(long)]
    pub stdin: bool,

    /// Always spawn the program as a child instead of replacing this process.
    #[arg(long)]
    pub no_process_replace: bool,

    /// Load config, print the effective settings, but don't build or run.
    #[arg(long)]
    pub dry_run: bool,

    /// Arguments forwarded verbatim to the program (after `--`).
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

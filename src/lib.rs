// src/lib.rs

pub mod build;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod run;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use tracing::{debug, info, warn};

use crate::build::{
    capture_stdin, BuildInputs, BuildOptions, BuildOutcome, Builder, JavaOptions, ShellBuilder,
};
use crate::cli::{CliArgs, RunArgs};
use crate::config::{config_root_dir, load_and_validate, ConfigFile, LinkSection};
use crate::errors::{Result, RunwatchError};
use crate::exec::{CommandLinker, RealProcessExecutor};
use crate::run::{
    ConsoleReporter, Diagnostic, Dispatcher, Orchestrator, ProcessTerminator, Reporter, RunPlan,
    Terminator,
};
use crate::types::{Platform, RunKind};
use crate::watch::{start_watch, RunOnSuccess, WatchEvent};

/// Settings after CLI flags have been folded over the config file.
#[derive(Debug, Clone)]
pub struct EffectiveSettings {
    pub root: PathBuf,
    pub kind: RunKind,
    pub options: BuildOptions,
    pub explicit_entry: Option<String>,
    pub args: Vec<String>,
    pub watch: bool,
    pub allow_process_replace: bool,
}

/// Fold CLI overrides over the validated config.
pub fn effective_settings(
    cfg: &ConfigFile,
    root: &Path,
    kind: RunKind,
    cli: &RunArgs,
) -> Result<EffectiveSettings> {
    let run = cfg.run_section();
    let platform = Platform::from_flags(cli.js, cli.native).unwrap_or(run.platform);
    require_link_template(platform, cfg.link_section())?;

    let options = BuildOptions {
        platform,
        java: JavaOptions {
            command: run.java_cmd.clone(),
            options: run.java_opts.clone(),
        },
        node_cmd: run.node_cmd.clone(),
        add_runner_dependency: run.add_runner_dependency || cli.add_runner_dependency,
        bench: cli.bench.unwrap_or(run.bench),
        work_dir: root.join(&run.work_dir),
    };

    let mut args = run.args.clone();
    args.extend(cli.args.iter().cloned());

    Ok(EffectiveSettings {
        root: root.to_path_buf(),
        kind,
        options,
        explicit_entry: cli.main_class.clone().or_else(|| run.main_class.clone()),
        args,
        watch: cli.watch,
        allow_process_replace: !cli.no_process_replace,
    })
}

fn require_link_template(platform: Platform, link: &LinkSection) -> Result<()> {
    let missing = match platform {
        Platform::Jvm => None,
        Platform::Js if link.script_cmd.is_none() => Some("[link].script_cmd"),
        Platform::Native if link.native_cmd.is_none() => Some("[link].native_cmd"),
        Platform::Js | Platform::Native => None,
    };
    match missing {
        Some(key) => Err(RunwatchError::ConfigError(format!(
            "platform {platform} requires {key}"
        ))),
        None => Ok(()),
    }
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the shell builder, linker and process executor
/// - the run orchestrator
/// - (optional) the watch session and Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone();
    let cfg = load_and_validate(&config_path)?;
    let root = config_root_dir(&config_path);

    let kind = args.command.kind();
    let run_args = args.command.args();
    let settings = effective_settings(&cfg, &root, kind, run_args)?;

    if run_args.dry_run {
        print_dry_run(&cfg, &settings);
        return Ok(());
    }

    let inputs = BuildInputs {
        stdin: if run_args.stdin {
            tokio::task::spawn_blocking(capture_stdin)
                .await
                .map_err(|e| anyhow!("stdin capture task failed: {e}"))??
        } else {
            None
        },
    };

    let builder = ShellBuilder::new(&root, cfg.build_section(), settings.options.clone())?;
    let linker = Arc::new(CommandLinker::new(&root, cfg.link_section()));
    let executor = Arc::new(RealProcessExecutor::new());
    let reporter: Arc<dyn Reporter> = Arc::new(ConsoleReporter::new());
    let terminator: Arc<dyn Terminator> = Arc::new(ProcessTerminator);
    let orchestrator = Orchestrator::new(
        Dispatcher::new(executor, linker),
        reporter.clone(),
        terminator.clone(),
    );

    let mut plan = RunPlan::single_shot(kind, settings.explicit_entry.clone(), settings.args.clone());
    plan.allow_process_replace = settings.allow_process_replace;

    if settings.watch {
        return run_watch(&settings, &cfg, &builder, &inputs, orchestrator, &plan).await;
    }

    match builder.build(&inputs).await? {
        BuildOutcome::Failed => {
            reporter.report(&Diagnostic::CompilationFailed);
            terminator.terminate(1);
            Ok(())
        }
        BuildOutcome::Successful(build) => {
            let end = orchestrator.run_build(&plan, &build).await?;
            info!(?end, "run finished");
            Ok(())
        }
    }
}

async fn run_watch(
    settings: &EffectiveSettings,
    cfg: &ConfigFile,
    builder: &dyn Builder,
    inputs: &BuildInputs,
    orchestrator: Orchestrator,
    plan: &RunPlan,
) -> Result<()> {
    let (session, tx) = start_watch(
        &settings.root,
        cfg.watch_section(),
        &settings.options.work_dir,
    )?;

    // Ctrl-C -> stop the session.
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = tx.send(WatchEvent::Interrupted).await;
    });

    let mut handler = RunOnSuccess::new(orchestrator, plan);
    session.run(builder, inputs, &mut handler).await
}

/// Print the effective settings without building or running anything.
fn print_dry_run(cfg: &ConfigFile, settings: &EffectiveSettings) {
    let build = cfg.build_section();
    let link = cfg.link_section();
    let watch = cfg.watch_section();

    println!("runwatch dry-run");
    println!("  root = {:?}", settings.root);
    println!("  kind = {:?}", settings.kind);
    println!();

    println!("build:");
    println!("  cmd: {}", build.cmd);
    if !build.classpath.is_empty() {
        println!("  classpath: {:?}", build.classpath);
    }
    if !build.main_classes.is_empty() {
        println!("  main_classes: {:?}", build.main_classes);
    }
    if let Some(ref pattern) = build.main_class_pattern {
        println!("  main_class_pattern: {pattern}");
    }

    println!("run:");
    println!("  platform: {}", settings.options.platform);
    if let Some(ref entry) = settings.explicit_entry {
        println!("  main_class: {entry}");
    }
    if !settings.args.is_empty() {
        println!("  args: {:?}", settings.args);
    }
    println!("  bench: {:?}", settings.options.bench);
    if settings.options.add_runner_dependency {
        println!("  add_runner_dependency: true");
    }
    println!("  work_dir: {:?}", settings.options.work_dir);
    println!("  process_replace: {}", settings.allow_process_replace && !settings.watch);

    if let Some(ref cmd) = link.script_cmd {
        println!("link.script_cmd: {cmd}");
    }
    if let Some(ref cmd) = link.native_cmd {
        println!("link.native_cmd: {cmd}");
    }

    if settings.watch {
        println!("watch:");
        println!("  paths: {:?}", watch.paths);
        if !watch.exclude.is_empty() {
            println!("  exclude: {:?}", watch.exclude);
        }
        println!("  use_hash: {}", watch.use_hash);
        println!("  debounce_ms: {}", watch.debounce_ms);
    }

    debug!("dry-run complete (no execution)");
}

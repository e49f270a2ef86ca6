// src/run/dispatcher.rs

//! Backend dispatch: turn a run request plus a target into a launched
//! process.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::build::SuccessfulBuild;
use crate::errors::Result;
use crate::exec::{
    BinaryCommand, Linker, ManagedCommand, ProcessExecutor, ProcessExit, ScriptCommand,
};
use crate::types::RunKind;

use super::entry::RUNNER_BOOTSTRAP_ENTRY;
use super::launcher::{with_launcher, LauncherKind};
use super::target::ExecutionTarget;

/// One execution of one entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub entry: String,
    /// Forwarded verbatim to the program.
    pub args: Vec<String>,
    /// Replace this process with the program when the platform allows it.
    pub allow_process_replace: bool,
    /// Terminate this process with the program's code when it fails.
    pub exit_on_error: bool,
    pub kind: RunKind,
}

/// Launches requests through the executor and linker collaborators.
#[derive(Clone)]
pub struct Dispatcher {
    executor: Arc<dyn ProcessExecutor>,
    linker: Arc<dyn Linker>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(executor: Arc<dyn ProcessExecutor>, linker: Arc<dyn Linker>) -> Self {
        Self { executor, linker }
    }

    /// Launch `request` using the strategy `target` selects and return how
    /// the program ended.
    ///
    /// Process replacement is only ever requested for the managed runtime:
    /// the script and native strategies own a launcher artifact that has to
    /// be removed after the program exits, which a replaced process would
    /// never do.
    pub async fn dispatch(
        &self,
        request: &RunRequest,
        build: &SuccessfulBuild,
        target: &ExecutionTarget,
    ) -> Result<ProcessExit> {
        info!(
            target = target.label(),
            entry = %request.entry,
            args = ?request.args,
            allow_process_replace = request.allow_process_replace,
            "dispatching run"
        );

        match target {
            ExecutionTarget::ManagedRuntime { classpath } => {
                let command = managed_command(request, build, classpath);
                self.executor
                    .run_managed(command, request.allow_process_replace)
                    .await
            }
            ExecutionTarget::LinkedScript { work_dir } => {
                log_replace_downgrade(request, target);
                with_launcher(
                    self.linker.as_ref(),
                    build,
                    LauncherKind::Script,
                    &request.entry,
                    request.kind.is_test(),
                    work_dir,
                    async |script: &Path| {
                        let command = ScriptCommand {
                            runtime_cmd: build.options.node_cmd.clone(),
                            script: script.to_path_buf(),
                            args: request.args.clone(),
                        };
                        self.executor.run_script(command, false).await
                    },
                )
                .await
            }
            ExecutionTarget::NativeBinary { work_dir } => {
                log_replace_downgrade(request, target);
                with_launcher(
                    self.linker.as_ref(),
                    build,
                    LauncherKind::Native,
                    &request.entry,
                    request.kind.is_test(),
                    work_dir,
                    async |binary: &Path| {
                        let command = BinaryCommand {
                            binary: binary.to_path_buf(),
                            args: request.args.clone(),
                        };
                        self.executor.run_binary(command, false).await
                    },
                )
                .await
            }
        }
    }
}

fn log_replace_downgrade(request: &RunRequest, target: &ExecutionTarget) {
    if request.allow_process_replace {
        debug!(
            target = target.label(),
            "launcher artifact must outlive the program; spawning instead of replacing"
        );
    }
}

/// Managed-runtime command for `request`.
///
/// In runner-dependency mode the bootstrap entry is launched and the real
/// entry point becomes its first argument.
pub fn managed_command(
    request: &RunRequest,
    build: &SuccessfulBuild,
    classpath: &[std::path::PathBuf],
) -> ManagedCommand {
    let (entry, args) = if build.options.add_runner_dependency {
        let mut args = Vec::with_capacity(request.args.len() + 1);
        args.push(request.entry.clone());
        args.extend(request.args.iter().cloned());
        (RUNNER_BOOTSTRAP_ENTRY.to_string(), args)
    } else {
        (request.entry.clone(), request.args.clone())
    };

    ManagedCommand {
        runtime_cmd: build.options.java.command.clone(),
        options: build.options.java.options.clone(),
        classpath: classpath.to_vec(),
        entry,
        args,
    }
}

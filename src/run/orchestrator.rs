// src/run/orchestrator.rs

//! Single-execution orchestration and the exit/report policy.
//!
//! ```text
//! Idle -> Resolving -> Dispatching -> { Reported, Terminated }
//!   ^         |
//!   +---------+  (no entry point: nothing runs)
//! ```

use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::build::SuccessfulBuild;
use crate::errors::Result;
use crate::exec::ProcessExit;
use crate::types::RunKind;

use super::dispatcher::{Dispatcher, RunRequest};
use super::entry::{resolve_entry, TEST_RUNNER_ENTRY};
use super::report::{Diagnostic, Reporter};
use super::target::ExecutionTarget;

/// Ends the current process. Production uses [`ProcessTerminator`].
pub trait Terminator: Send + Sync {
    fn terminate(&self, code: i32);
}

/// Calls `std::process::exit`; never returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessTerminator;

impl Terminator for ProcessTerminator {
    fn terminate(&self, code: i32) {
        std::process::exit(code);
    }
}

/// Where a run ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    /// No entry point resolved; nothing was launched.
    NoEntry,
    /// The program exited with status 0.
    Succeeded,
    /// The process image was replaced by the program.
    Replaced,
    /// Nonzero exit, reported and handed back to the caller.
    Reported(i32),
    /// Nonzero exit, the process was asked to terminate with it.
    Terminated(i32),
}

impl RunEnd {
    /// `false` only when the program itself failed.
    pub fn is_success(self) -> bool {
        matches!(self, RunEnd::NoEntry | RunEnd::Succeeded | RunEnd::Replaced)
    }
}

/// Exit policy, without side effects.
pub fn decide(exit: ProcessExit, exit_on_error: bool) -> RunEnd {
    match exit {
        ProcessExit::Replaced => RunEnd::Replaced,
        ProcessExit::Code(0) => RunEnd::Succeeded,
        ProcessExit::Code(code) if exit_on_error => RunEnd::Terminated(code),
        ProcessExit::Code(code) => RunEnd::Reported(code),
    }
}

/// What to run for each successful build, independent of the build itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub kind: RunKind,
    pub explicit_entry: Option<String>,
    pub args: Vec<String>,
    pub allow_process_replace: bool,
    pub exit_on_error: bool,
}

impl RunPlan {
    /// Single-shot plan: replacement allowed (unless disabled), failures end
    /// the process.
    pub fn single_shot(kind: RunKind, explicit_entry: Option<String>, args: Vec<String>) -> Self {
        Self {
            kind,
            explicit_entry,
            args,
            allow_process_replace: true,
            exit_on_error: true,
        }
    }

    /// The same plan as used by the watch loop: never replace, never exit.
    pub fn for_watch(&self) -> Self {
        Self {
            allow_process_replace: false,
            exit_on_error: false,
            ..self.clone()
        }
    }

    pub fn request(&self, entry: String) -> RunRequest {
        RunRequest {
            entry,
            args: self.args.clone(),
            allow_process_replace: self.allow_process_replace,
            exit_on_error: self.exit_on_error,
            kind: self.kind,
        }
    }
}

/// Ties entry resolution, dispatch and the exit policy together.
#[derive(Clone)]
pub struct Orchestrator {
    dispatcher: Dispatcher,
    reporter: Arc<dyn Reporter>,
    terminator: Arc<dyn Terminator>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(
        dispatcher: Dispatcher,
        reporter: Arc<dyn Reporter>,
        terminator: Arc<dyn Terminator>,
    ) -> Self {
        Self {
            dispatcher,
            reporter,
            terminator,
        }
    }

    pub fn reporter(&self) -> &dyn Reporter {
        self.reporter.as_ref()
    }

    /// Entry point `plan` runs for `build`, if any.
    pub fn resolve(&self, plan: &RunPlan, build: &SuccessfulBuild) -> Option<String> {
        match plan.kind {
            RunKind::Test => Some(TEST_RUNNER_ENTRY.to_string()),
            RunKind::Main => resolve_entry(
                plan.explicit_entry.as_deref(),
                build.options.bench,
                &build.retained_main_classes,
                self.reporter.as_ref(),
            ),
        }
    }

    /// Resolve, dispatch and settle one run of a successful build.
    pub async fn run_build(&self, plan: &RunPlan, build: &SuccessfulBuild) -> Result<RunEnd> {
        trace!(state = "resolving", kind = ?plan.kind);
        let Some(entry) = self.resolve(plan, build) else {
            debug!(state = "idle", "no entry point; skipping run");
            return Ok(RunEnd::NoEntry);
        };

        let target = ExecutionTarget::select(build);
        let request = plan.request(entry);
        self.run_request(&request, build, &target).await
    }

    /// Run an already resolved request. `true` iff the program exited with 0.
    pub async fn run_once(
        &self,
        request: &RunRequest,
        build: &SuccessfulBuild,
        target: &ExecutionTarget,
    ) -> Result<bool> {
        Ok(self.run_request(request, build, target).await?.is_success())
    }

    async fn run_request(
        &self,
        request: &RunRequest,
        build: &SuccessfulBuild,
        target: &ExecutionTarget,
    ) -> Result<RunEnd> {
        trace!(state = "dispatching", entry = %request.entry);
        let exit = self.dispatcher.dispatch(request, build, target).await?;
        Ok(self.settle(exit, request.exit_on_error))
    }

    fn settle(&self, exit: ProcessExit, exit_on_error: bool) -> RunEnd {
        let end = decide(exit, exit_on_error);
        match end {
            RunEnd::Terminated(code) => {
                info!(exit_code = code, state = "terminated", "program failed; exiting with its code");
                self.terminator.terminate(code);
            }
            RunEnd::Reported(code) => {
                info!(exit_code = code, state = "reported", "program failed");
                self.reporter.report(&Diagnostic::NonZeroExit(code));
            }
            RunEnd::Succeeded | RunEnd::Replaced | RunEnd::NoEntry => {
                debug!(?end, "run finished");
            }
        }
        end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_policy_table() {
        assert_eq!(decide(ProcessExit::Code(0), true), RunEnd::Succeeded);
        assert_eq!(decide(ProcessExit::Code(0), false), RunEnd::Succeeded);
        assert_eq!(decide(ProcessExit::Code(3), true), RunEnd::Terminated(3));
        assert_eq!(decide(ProcessExit::Code(3), false), RunEnd::Reported(3));
        assert_eq!(decide(ProcessExit::Replaced, true), RunEnd::Replaced);
    }

    #[test]
    fn watch_plan_never_replaces_or_exits() {
        let plan = RunPlan::single_shot(RunKind::Main, Some("Main".to_string()), vec![]);
        let watched = plan.for_watch();
        assert!(plan.allow_process_replace && plan.exit_on_error);
        assert!(!watched.allow_process_replace && !watched.exit_on_error);
        assert_eq!(watched.explicit_entry, plan.explicit_entry);
    }

    #[test]
    fn only_program_failures_are_unsuccessful() {
        assert!(RunEnd::NoEntry.is_success());
        assert!(RunEnd::Replaced.is_success());
        assert!(!RunEnd::Reported(1).is_success());
        assert!(!RunEnd::Terminated(1).is_success());
    }
}

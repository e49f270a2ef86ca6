//! Recording fakes for the collaborator traits.
//!
//! Every fake hands out `Arc` handles to its recorded state so a test can keep
//! inspecting it after the fake itself has been moved into the code under
//! test.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use runwatch::build::{BuildInputs, BuildOutcome, Builder, SuccessfulBuild};
use runwatch::errors::{Result, RunwatchError};
use runwatch::exec::{
    BinaryCommand, BoxFuture, Linker, ManagedCommand, ProcessExecutor, ProcessExit,
    ScriptCommand,
};
use runwatch::run::report::format_diagnostic;
use runwatch::run::{Diagnostic, Reporter, Terminator};
use runwatch::watch::NotifierHandle;

/// One launch seen by [`FakeExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launch {
    Managed {
        command: ManagedCommand,
        allow_replace: bool,
    },
    Script {
        command: ScriptCommand,
        allow_replace: bool,
        /// Whether the script file existed while the program "ran".
        artifact_present: bool,
    },
    Binary {
        command: BinaryCommand,
        allow_replace: bool,
        artifact_present: bool,
    },
}

impl Launch {
    pub fn artifact(&self) -> Option<&Path> {
        match self {
            Launch::Managed { .. } => None,
            Launch::Script { command, .. } => Some(&command.script),
            Launch::Binary { command, .. } => Some(&command.binary),
        }
    }
}

/// A fake executor that:
/// - records every launch
/// - returns scripted exits in order, then `Code(0)`
/// - fails the launch instead when `fail_with` is set.
#[derive(Default)]
pub struct FakeExecutor {
    launches: Arc<Mutex<Vec<Launch>>>,
    exits: Mutex<VecDeque<ProcessExit>>,
    fail_with: Option<String>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exits(exits: impl IntoIterator<Item = ProcessExit>) -> Self {
        Self {
            exits: Mutex::new(exits.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn launches(&self) -> Arc<Mutex<Vec<Launch>>> {
        Arc::clone(&self.launches)
    }

    fn record(&self, launch: Launch) -> Result<ProcessExit> {
        self.launches.lock().unwrap().push(launch);
        if let Some(ref msg) = self.fail_with {
            return Err(RunwatchError::Other(anyhow::anyhow!("{msg}")));
        }
        Ok(self
            .exits
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ProcessExit::Code(0)))
    }
}

impl ProcessExecutor for FakeExecutor {
    fn run_managed(
        &self,
        command: ManagedCommand,
        allow_replace: bool,
    ) -> BoxFuture<'_, Result<ProcessExit>> {
        let result = self.record(Launch::Managed {
            command,
            allow_replace,
        });
        Box::pin(async move { result })
    }

    fn run_script(
        &self,
        command: ScriptCommand,
        allow_replace: bool,
    ) -> BoxFuture<'_, Result<ProcessExit>> {
        let artifact_present = command.script.is_file();
        let result = self.record(Launch::Script {
            command,
            allow_replace,
            artifact_present,
        });
        Box::pin(async move { result })
    }

    fn run_binary(
        &self,
        command: BinaryCommand,
        allow_replace: bool,
    ) -> BoxFuture<'_, Result<ProcessExit>> {
        let artifact_present = command.binary.is_file();
        let result = self.record(Launch::Binary {
            command,
            allow_replace,
            artifact_present,
        });
        Box::pin(async move { result })
    }
}

/// A fake linker that writes a marker into `dest`, or fails.
#[derive(Default)]
pub struct FakeLinker {
    destinations: Arc<Mutex<Vec<PathBuf>>>,
    fail: bool,
}

impl FakeLinker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A linker whose every step fails after touching `dest`.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Every path handed to the linker, in call order.
    pub fn destinations(&self) -> Arc<Mutex<Vec<PathBuf>>> {
        Arc::clone(&self.destinations)
    }

    fn populate(&self, dest: &Path, content: &str) -> Result<()> {
        self.destinations.lock().unwrap().push(dest.to_path_buf());
        std::fs::write(dest, content)?;
        if self.fail {
            return Err(RunwatchError::Launcher("link step exited with code 1".to_string()));
        }
        Ok(())
    }
}

impl Linker for FakeLinker {
    fn link_script<'a>(
        &'a self,
        _build: &'a SuccessfulBuild,
        dest: &'a Path,
        entry: &'a str,
        test_mode: bool,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.populate(dest, &format!("// entry={entry} test={test_mode}\n"))
        })
    }

    fn compile_native<'a>(
        &'a self,
        _build: &'a SuccessfulBuild,
        entry: &'a str,
        dest: &'a Path,
        _work_dir: &'a Path,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move { self.populate(dest, &format!("#!/bin/sh\n# entry={entry}\n")) })
    }
}

/// One scripted answer of [`ScriptedBuilder`].
#[derive(Debug, Clone)]
pub enum BuildStep {
    Outcome(BuildOutcome),
    /// The build could not be attempted at all.
    Error(String),
}

/// A builder that replays scripted steps, then keeps answering `Failed`.
#[derive(Default)]
pub struct ScriptedBuilder {
    steps: Mutex<VecDeque<BuildStep>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedBuilder {
    pub fn new(steps: impl IntoIterator<Item = BuildStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl Builder for ScriptedBuilder {
    fn build<'a>(&'a self, _inputs: &'a BuildInputs) -> BoxFuture<'a, Result<BuildOutcome>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();
        Box::pin(async move {
            match step {
                Some(BuildStep::Outcome(outcome)) => Ok(outcome),
                Some(BuildStep::Error(msg)) => Err(RunwatchError::InputResolution(msg)),
                None => Ok(BuildOutcome::Failed),
            }
        })
    }
}

/// Reporter that keeps every diagnostic (and its rendered text).
#[derive(Debug, Default)]
pub struct RecordingReporter {
    seen: Arc<Mutex<Vec<Diagnostic>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Arc<Mutex<Vec<Diagnostic>>> {
        Arc::clone(&self.seen)
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, diagnostic: &Diagnostic) {
        tracing::debug!(text = %format_diagnostic(diagnostic), "recorded diagnostic");
        self.seen.lock().unwrap().push(diagnostic.clone());
    }
}

/// Terminator that records the requested exit codes instead of exiting.
#[derive(Debug, Default)]
pub struct RecordingTerminator {
    codes: Arc<Mutex<Vec<i32>>>,
}

impl RecordingTerminator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn codes(&self) -> Arc<Mutex<Vec<i32>>> {
        Arc::clone(&self.codes)
    }
}

impl Terminator for RecordingTerminator {
    fn terminate(&self, code: i32) {
        self.codes.lock().unwrap().push(code);
    }
}

/// Notifier handle that counts how often it was disposed.
#[derive(Debug, Clone, Default)]
pub struct CountingNotifierHandle {
    disposals: Arc<AtomicUsize>,
}

impl CountingNotifierHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disposals(&self) -> usize {
        self.disposals.load(Ordering::SeqCst)
    }
}

impl NotifierHandle for CountingNotifierHandle {
    fn dispose(self: Box<Self>) {
        self.disposals.fetch_add(1, Ordering::SeqCst);
    }
}

// src/run/mod.rs

//! Run dispatch and the exit/report policy.
//!
//! - [`entry`] picks the symbol to execute.
//! - [`target`] derives the one execution strategy a build uses.
//! - [`launcher`] scopes the temporary artifacts the script and native
//!   strategies need.
//! - [`dispatcher`] launches a request through the executor/linker
//!   collaborators.
//! - [`orchestrator`] ties the above together and decides whether a failing
//!   program ends this process or is reported.
//! - [`report`] formats diagnostics and defines the output sink.

pub mod dispatcher;
pub mod entry;
pub mod launcher;
pub mod orchestrator;
pub mod report;
pub mod target;

pub use dispatcher::{Dispatcher, RunRequest};
pub use entry::{resolve_entry, BENCHMARK_ENTRY, RUNNER_BOOTSTRAP_ENTRY, TEST_RUNNER_ENTRY};
pub use launcher::{with_launcher, LauncherArtifact, LauncherKind};
pub use orchestrator::{Orchestrator, ProcessTerminator, RunEnd, RunPlan, Terminator};
pub use report::{ConsoleReporter, Diagnostic, Reporter};
pub use target::ExecutionTarget;

// src/exec/mod.rs

//! Process execution layer.
//!
//! The run orchestration never touches `std::process` directly. It talks to
//! two collaborator traits:
//!
//! - [`ProcessExecutor`] launches the managed runtime, a linked script, or a
//!   native binary and reports how the process ended.
//! - [`Linker`](link::Linker) produces launcher artifacts (linked scripts,
//!   native binaries) into a path it is handed.
//!
//! Production implementations live in [`process`] and [`link`]; tests swap in
//! fakes that record calls and return scripted exit codes.

pub mod link;
pub mod process;
pub mod template;

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::errors::Result;

pub use link::{CommandLinker, Linker};
pub use process::RealProcessExecutor;

/// Boxed `Send` future returned by the collaborator traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// How a launched program ended, from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// The child exited (or was killed) with this status.
    Code(i32),
    /// The current process image was replaced by the program.
    ///
    /// A real executor never returns this: a successful replacement does not
    /// come back. Fakes use it to model that path.
    Replaced,
}

/// Managed-runtime launch: `<runtime> <options..> -cp <classpath> <entry> <args..>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedCommand {
    pub runtime_cmd: String,
    pub options: Vec<String>,
    pub classpath: Vec<PathBuf>,
    pub entry: String,
    pub args: Vec<String>,
}

/// Linked-script launch: `<runtime> <script> <args..>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCommand {
    pub runtime_cmd: String,
    pub script: PathBuf,
    pub args: Vec<String>,
}

/// Native-binary launch: `<binary> <args..>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryCommand {
    pub binary: PathBuf,
    pub args: Vec<String>,
}

/// Trait abstracting how programs are launched.
///
/// `allow_replace = true` asks the implementation to replace the current
/// process image when the platform supports it. Callers must have finished
/// all cleanup before making such a call: nothing after a successful
/// replacement runs.
pub trait ProcessExecutor: Send + Sync {
    fn run_managed(
        &self,
        command: ManagedCommand,
        allow_replace: bool,
    ) -> BoxFuture<'_, Result<ProcessExit>>;

    fn run_script(
        &self,
        command: ScriptCommand,
        allow_replace: bool,
    ) -> BoxFuture<'_, Result<ProcessExit>>;

    fn run_binary(
        &self,
        command: BinaryCommand,
        allow_replace: bool,
    ) -> BoxFuture<'_, Result<ProcessExit>>;
}

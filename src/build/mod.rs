// src/build/mod.rs

//! Build outcomes and the build collaborator interface.
//!
//! Compilation itself is external. This module only defines what a build
//! hands to the run layer ([`BuildOutcome`]) and the [`Builder`] trait that
//! produces it. [`shell::ShellBuilder`] is the production adapter that runs
//! the configured build command; [`stdin`] captures piped input that seeds
//! [`BuildInputs`].

pub mod shell;
pub mod stdin;

use std::path::PathBuf;

use crate::errors::Result;
use crate::exec::BoxFuture;
use crate::types::{BenchMode, Platform};

pub use shell::ShellBuilder;
pub use stdin::capture_stdin;

/// Inputs handed to every build invocation.
#[derive(Debug, Clone, Default)]
pub struct BuildInputs {
    /// Bytes captured from stdin, fed to the build command.
    pub stdin: Option<Vec<u8>>,
}

/// Files produced by a successful build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts {
    pub classpath: Vec<PathBuf>,
}

/// Managed-runtime launch settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaOptions {
    pub command: String,
    pub options: Vec<String>,
}

impl Default for JavaOptions {
    fn default() -> Self {
        Self {
            command: "java".to_string(),
            options: Vec::new(),
        }
    }
}

/// Options the build was made with; they decide how it is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub platform: Platform,
    pub java: JavaOptions,
    pub node_cmd: String,
    pub add_runner_dependency: bool,
    pub bench: BenchMode,
    /// Directory launcher artifacts are created in.
    pub work_dir: PathBuf,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            platform: Platform::default(),
            java: JavaOptions::default(),
            node_cmd: "node".to_string(),
            add_runner_dependency: false,
            bench: BenchMode::default(),
            work_dir: PathBuf::from(".runwatch"),
        }
    }
}

/// Everything the run layer needs from a successful build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuccessfulBuild {
    pub artifacts: Artifacts,
    pub options: BuildOptions,
    /// Entry points found eligible by the build, in discovery order.
    pub retained_main_classes: Vec<String>,
}

/// Result of one compilation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Successful(SuccessfulBuild),
    Failed,
}

/// The build collaborator.
///
/// `Err` means the build could not be attempted at all (e.g. the build
/// command failed to spawn); a build that ran and failed is
/// `Ok(BuildOutcome::Failed)`.
pub trait Builder: Send + Sync {
    fn build<'a>(&'a self, inputs: &'a BuildInputs) -> BoxFuture<'a, Result<BuildOutcome>>;
}

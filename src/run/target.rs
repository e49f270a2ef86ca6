// src/run/target.rs

use std::path::PathBuf;

use crate::build::SuccessfulBuild;
use crate::types::Platform;

/// How a successful build gets executed. Exactly one per build.
///
/// The script and native variants carry the directory their launcher
/// artifact is created in; the artifact path itself only exists inside the
/// launcher scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionTarget {
    ManagedRuntime { classpath: Vec<PathBuf> },
    LinkedScript { work_dir: PathBuf },
    NativeBinary { work_dir: PathBuf },
}

impl ExecutionTarget {
    /// Derive the target from the build's platform.
    pub fn select(build: &SuccessfulBuild) -> Self {
        let work_dir = build.options.work_dir.clone();
        match build.options.platform {
            Platform::Js => ExecutionTarget::LinkedScript { work_dir },
            Platform::Native => ExecutionTarget::NativeBinary { work_dir },
            Platform::Jvm => ExecutionTarget::ManagedRuntime {
                classpath: build.artifacts.classpath.clone(),
            },
        }
    }

    /// Short name used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            ExecutionTarget::ManagedRuntime { .. } => "managed-runtime",
            ExecutionTarget::LinkedScript { .. } => "linked-script",
            ExecutionTarget::NativeBinary { .. } => "native-binary",
        }
    }
}

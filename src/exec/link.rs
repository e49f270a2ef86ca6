// src/exec/link.rs

//! Launcher-artifact producers (script linking, native compilation).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::Context;
use tracing::{debug, info};

use crate::build::SuccessfulBuild;
use crate::config::LinkSection;
use crate::errors::{Result, RunwatchError};

use super::BoxFuture;
use super::process::shell_command;
use super::template::expand;

/// Collaborator that writes a runnable artifact to `dest`.
///
/// `dest` already exists (an empty, uniquely named file owned by the caller);
/// implementations overwrite it.
pub trait Linker: Send + Sync {
    /// Link the build into a script whose entry is `entry`. `test_mode`
    /// selects the test initializer instead of the main initializer.
    fn link_script<'a>(
        &'a self,
        build: &'a SuccessfulBuild,
        dest: &'a Path,
        entry: &'a str,
        test_mode: bool,
    ) -> BoxFuture<'a, Result<()>>;

    /// Compile the build into a native binary whose entry is `entry`.
    fn compile_native<'a>(
        &'a self,
        build: &'a SuccessfulBuild,
        entry: &'a str,
        dest: &'a Path,
        work_dir: &'a Path,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Linker that runs the `[link]` command templates through the shell.
#[derive(Debug, Clone)]
pub struct CommandLinker {
    root: PathBuf,
    script_cmd: Option<String>,
    native_cmd: Option<String>,
}

impl CommandLinker {
    pub fn new(root: impl Into<PathBuf>, link: &LinkSection) -> Self {
        Self {
            root: root.into(),
            script_cmd: link.script_cmd.clone(),
            native_cmd: link.native_cmd.clone(),
        }
    }

    async fn run_template(&self, step: &str, template: &str, values: HashMap<&str, String>) -> Result<()> {
        let line = expand(template, &values)
            .with_context(|| format!("expanding {step} command"))?;

        info!(step, cmd = %line, "producing launcher artifact");

        let status = shell_command(&line)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .with_context(|| format!("spawning {step} command"))?;

        if !status.success() {
            return Err(RunwatchError::Launcher(format!(
                "{step} command exited with {}",
                status
                    .code()
                    .map_or_else(|| "a signal".to_string(), |c| format!("code {c}"))
            )));
        }

        debug!(step, "launcher artifact ready");
        Ok(())
    }
}

fn classpath_value(build: &SuccessfulBuild) -> Result<String> {
    let joined = std::env::join_paths(&build.artifacts.classpath)
        .map_err(|e| RunwatchError::Launcher(format!("invalid classpath entry: {e}")))?;
    Ok(joined.to_string_lossy().into_owned())
}

impl Linker for CommandLinker {
    fn link_script<'a>(
        &'a self,
        build: &'a SuccessfulBuild,
        dest: &'a Path,
        entry: &'a str,
        test_mode: bool,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let template = self.script_cmd.as_deref().ok_or_else(|| {
                RunwatchError::ConfigError("script linking requires [link].script_cmd".to_string())
            })?;

            let mut values = HashMap::new();
            values.insert("entry", entry.to_string());
            values.insert("dest", dest.display().to_string());
            values.insert("classpath", classpath_value(build)?);
            values.insert("mode", if test_mode { "test" } else { "main" }.to_string());
            values.insert("work_dir", build.options.work_dir.display().to_string());

            self.run_template("script link", template, values).await
        })
    }

    fn compile_native<'a>(
        &'a self,
        build: &'a SuccessfulBuild,
        entry: &'a str,
        dest: &'a Path,
        work_dir: &'a Path,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let template = self.native_cmd.as_deref().ok_or_else(|| {
                RunwatchError::ConfigError("native compilation requires [link].native_cmd".to_string())
            })?;

            let mut values = HashMap::new();
            values.insert("entry", entry.to_string());
            values.insert("dest", dest.display().to_string());
            values.insert("classpath", classpath_value(build)?);
            values.insert("mode", "main".to_string());
            values.insert("work_dir", work_dir.display().to_string());

            self.run_template("native compile", template, values).await
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn script_template_writes_into_dest() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("launcher.js");
        let linker = CommandLinker::new(
            dir.path(),
            &LinkSection {
                script_cmd: Some("echo {entry} {mode} > {dest}".to_string()),
                native_cmd: None,
            },
        );

        linker
            .link_script(&SuccessfulBuild::default(), &dest, "Main", true)
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "Main test\n");
    }

    #[tokio::test]
    async fn failing_template_is_a_launcher_error() {
        let dir = tempfile::tempdir().unwrap();
        let linker = CommandLinker::new(
            dir.path(),
            &LinkSection {
                script_cmd: None,
                native_cmd: Some("exit 7".to_string()),
            },
        );

        let err = linker
            .compile_native(&SuccessfulBuild::default(), "Main", &dir.path().join("bin"), dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, RunwatchError::Launcher(ref m) if m.contains("code 7")), "{err}");
    }

    #[tokio::test]
    async fn missing_template_is_a_config_error() {
        let linker = CommandLinker::new(".", &LinkSection::default());
        let err = linker
            .link_script(&SuccessfulBuild::default(), Path::new("x.js"), "Main", false)
            .await
            .unwrap_err();
        assert!(matches!(err, RunwatchError::ConfigError(_)));
    }
}

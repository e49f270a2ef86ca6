// src/build/shell.rs

//! Build collaborator backed by a shell command.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::Context;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::config::BuildSection;
use crate::errors::{Result, RunwatchError};
use crate::exec::BoxFuture;
use crate::exec::process::shell_command;

use super::{Artifacts, BuildInputs, BuildOptions, BuildOutcome, Builder, SuccessfulBuild};

/// Runs `[build].cmd` in the project root and turns its exit status into a
/// [`BuildOutcome`].
///
/// - stdout is forwarded line by line and scanned with
///   `[build].main_class_pattern` for retained entry points;
/// - stderr is inherited;
/// - captured stdin bytes (if any) are written to the command's stdin.
#[derive(Debug, Clone)]
pub struct ShellBuilder {
    root: PathBuf,
    cmd: String,
    classpath: Vec<PathBuf>,
    main_classes: Vec<String>,
    main_class_pattern: Option<Regex>,
    options: BuildOptions,
}

impl ShellBuilder {
    pub fn new(root: impl Into<PathBuf>, build: &BuildSection, options: BuildOptions) -> Result<Self> {
        let root = root.into();
        let main_class_pattern = build
            .main_class_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| RunwatchError::ConfigError(format!("main_class_pattern: {e}")))?;

        Ok(Self {
            classpath: build.classpath.iter().map(|p| root.join(p)).collect(),
            root,
            cmd: build.cmd.clone(),
            main_classes: build.main_classes.clone(),
            main_class_pattern,
            options,
        })
    }

    async fn run_build(&self, inputs: &BuildInputs) -> Result<BuildOutcome> {
        info!(cmd = %self.cmd, root = ?self.root, "running build command");

        let mut cmd = shell_command(&self.cmd);
        cmd.current_dir(&self.root)
            .stdin(if inputs.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            RunwatchError::InputResolution(format!(
                "cannot start build command '{}': {e}",
                self.cmd
            ))
        })?;

        if let (Some(bytes), Some(mut stdin)) = (inputs.stdin.clone(), child.stdin.take()) {
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&bytes).await {
                    warn!(error = %e, "failed to feed captured stdin to build command");
                }
                // Dropping `stdin` closes the pipe so the build sees EOF.
            });
        }

        let mut discovered = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines
                .next_line()
                .await
                .context("reading build command stdout")?
            {
                println!("{line}");
                if let Some(class) = self.scan_line(&line) {
                    debug!(main_class = %class, "build reported an entry point");
                    discovered.push(class);
                }
            }
        }

        let status = child.wait().await.context("waiting for build command")?;

        if !status.success() {
            info!(exit_code = ?status.code(), "build command failed");
            return Ok(BuildOutcome::Failed);
        }

        let retained_main_classes = merge_main_classes(&self.main_classes, discovered);
        info!(?retained_main_classes, "build succeeded");

        Ok(BuildOutcome::Successful(SuccessfulBuild {
            artifacts: Artifacts {
                classpath: self.classpath.clone(),
            },
            options: self.options.clone(),
            retained_main_classes,
        }))
    }

    fn scan_line(&self, line: &str) -> Option<String> {
        let re = self.main_class_pattern.as_ref()?;
        let caps = re.captures(line)?;
        caps.get(1).map(|m| m.as_str().to_string())
    }
}

impl Builder for ShellBuilder {
    fn build<'a>(&'a self, inputs: &'a BuildInputs) -> BoxFuture<'a, Result<BuildOutcome>> {
        Box::pin(self.run_build(inputs))
    }
}

/// Statically configured classes first, then discovered ones, without
/// duplicates.
fn merge_main_classes(configured: &[String], discovered: Vec<String>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(configured.len() + discovered.len());
    for class in configured.iter().cloned().chain(discovered) {
        if !merged.contains(&class) {
            merged.push(class);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(cmd: &str, pattern: Option<&str>) -> BuildSection {
        BuildSection {
            cmd: cmd.to_string(),
            classpath: vec![PathBuf::from("out/classes")],
            main_classes: vec!["app.Main".to_string()],
            main_class_pattern: pattern.map(str::to_string),
        }
    }

    #[test]
    fn merge_keeps_order_and_drops_duplicates() {
        let merged = merge_main_classes(
            &["a.Main".to_string(), "b.Main".to_string()],
            vec!["b.Main".to_string(), "c.Main".to_string(), "c.Main".to_string()],
        );
        assert_eq!(merged, vec!["a.Main", "b.Main", "c.Main"]);
    }

    #[test]
    fn scan_line_uses_first_capture_group() {
        let builder = ShellBuilder::new(
            "/project",
            &section("make", Some(r"^main-class: (\S+)$")),
            BuildOptions::default(),
        )
        .unwrap();
        assert_eq!(builder.scan_line("main-class: demo.App"), Some("demo.App".to_string()));
        assert_eq!(builder.scan_line("compiling 3 files"), None);
    }

    #[test]
    fn classpath_is_resolved_against_root() {
        let builder =
            ShellBuilder::new("/project", &section("make", None), BuildOptions::default()).unwrap();
        assert_eq!(builder.classpath, vec![PathBuf::from("/project/out/classes")]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_command_reports_discovered_classes() {
        let dir = tempfile::tempdir().unwrap();
        let builder = ShellBuilder::new(
            dir.path(),
            &section("echo 'main-class: demo.App'", Some(r"^main-class: (\S+)$")),
            BuildOptions::default(),
        )
        .unwrap();

        let outcome = builder.build(&BuildInputs::default()).await.unwrap();
        match outcome {
            BuildOutcome::Successful(build) => {
                assert_eq!(build.retained_main_classes, vec!["app.Main", "demo.App"]);
            }
            BuildOutcome::Failed => panic!("expected a successful build"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_command_is_a_failed_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let builder =
            ShellBuilder::new(dir.path(), &section("exit 4", None), BuildOptions::default())
                .unwrap();
        let outcome = builder.build(&BuildInputs::default()).await.unwrap();
        assert_eq!(outcome, BuildOutcome::Failed);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captured_stdin_reaches_the_build_command() {
        let dir = tempfile::tempdir().unwrap();
        let builder = ShellBuilder::new(
            dir.path(),
            &section("read line; echo \"main-class: $line\"", Some(r"^main-class: (\S+)$")),
            BuildOptions::default(),
        )
        .unwrap();
        let inputs = BuildInputs {
            stdin: Some(b"from.Stdin\n".to_vec()),
        };

        let outcome = builder.build(&inputs).await.unwrap();
        let BuildOutcome::Successful(build) = outcome else {
            panic!("expected a successful build");
        };
        assert!(build.retained_main_classes.contains(&"from.Stdin".to_string()));
    }
}

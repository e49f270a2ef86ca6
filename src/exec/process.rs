// src/exec/process.rs

//! Real process launching on top of `tokio::process`.

use std::process::{Command as StdCommand, ExitStatus};

use anyhow::{Context, anyhow};
use tracing::{debug, info};

use crate::errors::Result;

use super::{BinaryCommand, BoxFuture, ManagedCommand, ProcessExecutor, ProcessExit, ScriptCommand};

/// Executor used in production.
///
/// Children inherit stdin/stdout/stderr so the program talks to the terminal
/// directly, and are killed if the waiting future is dropped.
#[derive(Debug, Clone, Default)]
pub struct RealProcessExecutor;

impl RealProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessExecutor for RealProcessExecutor {
    fn run_managed(
        &self,
        command: ManagedCommand,
        allow_replace: bool,
    ) -> BoxFuture<'_, Result<ProcessExit>> {
        Box::pin(async move {
            let cmd = managed_command_line(&command)?;
            launch(cmd, allow_replace).await
        })
    }

    fn run_script(
        &self,
        command: ScriptCommand,
        allow_replace: bool,
    ) -> BoxFuture<'_, Result<ProcessExit>> {
        Box::pin(async move {
            let mut cmd = StdCommand::new(&command.runtime_cmd);
            cmd.arg(&command.script).args(&command.args);
            launch(cmd, allow_replace).await
        })
    }

    fn run_binary(
        &self,
        command: BinaryCommand,
        allow_replace: bool,
    ) -> BoxFuture<'_, Result<ProcessExit>> {
        Box::pin(async move {
            let mut cmd = StdCommand::new(&command.binary);
            cmd.args(&command.args);
            launch(cmd, allow_replace).await
        })
    }
}

/// Build a shell command appropriate for the platform (`sh -c` / `cmd /C`).
pub fn shell_command(line: &str) -> tokio::process::Command {
    if cfg!(windows) {
        let mut c = tokio::process::Command::new("cmd");
        c.arg("/C").arg(line);
        c
    } else {
        let mut c = tokio::process::Command::new("sh");
        c.arg("-c").arg(line);
        c
    }
}

/// Build the managed-runtime command line.
///
/// Classpath entries are joined with the platform path separator and passed
/// through `-cp`; an empty classpath omits the flag.
pub fn managed_command_line(command: &ManagedCommand) -> anyhow::Result<StdCommand> {
    let mut cmd = StdCommand::new(&command.runtime_cmd);
    cmd.args(&command.options);

    if !command.classpath.is_empty() {
        let classpath = std::env::join_paths(&command.classpath)
            .map_err(|e| anyhow!("invalid classpath entry: {e}"))?;
        cmd.arg("-cp").arg(classpath);
    }

    cmd.arg(&command.entry).args(&command.args);
    Ok(cmd)
}

async fn launch(mut command: StdCommand, allow_replace: bool) -> Result<ProcessExit> {
    let program = command.get_program().to_string_lossy().into_owned();

    if allow_replace {
        if let Some(err) = replace_current_process(&mut command) {
            return Err(anyhow::Error::new(err)
                .context(format!("replacing current process with '{program}'"))
                .into());
        }
        debug!(program = %program, "process replacement unsupported; spawning instead");
    }

    info!(program = %program, "starting program");

    let mut child = tokio::process::Command::from(command);
    child.kill_on_drop(true);

    let status = child
        .status()
        .await
        .with_context(|| format!("running '{program}'"))?;

    let code = exit_code(status);
    info!(program = %program, exit_code = code, success = status.success(), "program exited");

    Ok(ProcessExit::Code(code))
}

/// Replace the current process image. Only returns on failure.
#[cfg(unix)]
fn replace_current_process(command: &mut StdCommand) -> Option<std::io::Error> {
    use std::os::unix::process::CommandExt;
    Some(command.exec())
}

#[cfg(not(unix))]
fn replace_current_process(_command: &mut StdCommand) -> Option<std::io::Error> {
    None
}

/// Exit status as seen by a shell: the code, or `128 + signal` for a
/// signal death on unix.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn managed_command_line_puts_classpath_before_entry() {
        let command = ManagedCommand {
            runtime_cmd: "java".to_string(),
            options: vec!["-Xmx1g".to_string()],
            classpath: vec![PathBuf::from("out/classes"), PathBuf::from("lib/dep.jar")],
            entry: "Main".to_string(),
            args: vec!["a".to_string(), "b".to_string()],
        };

        let cmd = managed_command_line(&command).unwrap();
        let args: Vec<&OsStr> = cmd.get_args().collect();
        let joined = std::env::join_paths(&command.classpath).unwrap();

        assert_eq!(cmd.get_program(), "java");
        assert_eq!(
            args,
            vec![
                OsStr::new("-Xmx1g"),
                OsStr::new("-cp"),
                joined.as_os_str(),
                OsStr::new("Main"),
                OsStr::new("a"),
                OsStr::new("b"),
            ]
        );
    }

    #[test]
    fn empty_classpath_omits_flag() {
        let command = ManagedCommand {
            runtime_cmd: "java".to_string(),
            options: Vec::new(),
            classpath: Vec::new(),
            entry: "Main".to_string(),
            args: Vec::new(),
        };
        let cmd = managed_command_line(&command).unwrap();
        assert_eq!(cmd.get_args().collect::<Vec<_>>(), vec![OsStr::new("Main")]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn spawned_child_reports_its_exit_code() {
        let executor = RealProcessExecutor::new();
        let exit = executor
            .run_binary(
                BinaryCommand {
                    binary: PathBuf::from("sh"),
                    args: vec!["-c".to_string(), "exit 3".to_string()],
                },
                false,
            )
            .await
            .unwrap();
        assert_eq!(exit, ProcessExit::Code(3));
    }
}

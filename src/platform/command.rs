use std::{process::Stdio, time::Duration};

use async_trait::async_trait;
use tokio::{io::AsyncWriteExt, process::Command};

#[cfg(test)]
use mockall::automock;

use crate::error::CommandError;

/// Default bound for non-interactive commands
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Captured result of a finished command
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    #[cfg(test)]
    pub fn ok(stdout: &str) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    #[cfg(test)]
    pub fn failed(status: i32, stderr: &str) -> Self {
        Self {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

/// Runs external programs; every shell-out in the crate goes through this
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync + 'static {
    async fn run(
        &self,
        program: &str,
        args: Vec<String>,
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError>;

    /// Like [`CommandRunner::run`], with `input` written to the child's stdin
    async fn run_with_input(
        &self,
        program: &str,
        args: Vec<String>,
        input: Vec<u8>,
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError>;
}

/// Production runner backed by `tokio::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(
        &self,
        program: &str,
        args: Vec<String>,
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError> {
        execute(program, args, None, timeout).await
    }

    async fn run_with_input(
        &self,
        program: &str,
        args: Vec<String>,
        input: Vec<u8>,
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError> {
        execute(program, args, Some(input), timeout).await
    }
}

async fn execute(
    program: &str,
    args: Vec<String>,
    input: Option<Vec<u8>>,
    timeout: Duration,
) -> Result<CommandOutput, CommandError> {
    log::debug!("running {} {:?}", program, args);
    let spawn_err = |source| CommandError::Spawn {
        program: program.to_string(),
        source,
    };

    let mut child = Command::new(program)
        .args(&args)
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(spawn_err)?;

    let stdin = child.stdin.take();
    let feed = async move {
        match (stdin, input) {
            (Some(mut stdin), Some(input)) => {
                stdin.write_all(&input).await?;
                stdin.shutdown().await
                // stdin drops here; the child reads EOF
            }
            _ => Ok(()),
        }
    };

    // Dropping the wait future on timeout drops the child, which kills it
    let (fed, output) = tokio::time::timeout(timeout, async {
        tokio::join!(feed, child.wait_with_output())
    })
    .await
    .map_err(|_| CommandError::TimedOut {
        program: program.to_string(),
        timeout,
    })?;
    let output = output.map_err(spawn_err)?;
    fed.map_err(|source| CommandError::Input {
        program: program.to_string(),
        source,
    })?;

    Ok(CommandOutput {
        status: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::{error::ElevationError, platform::CommandRunner};

/// Default time the user gets to answer an authorization prompt
pub const DEFAULT_ELEVATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs a shell script as root behind an interactive authorization prompt
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Elevator: Send + Sync + 'static {
    async fn run_elevated(&self, script: &str) -> Result<(), ElevationError>;
}

/// How the system elevator asks for authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevationMethod {
    /// `osascript` with `with administrator privileges` (macOS)
    AppleScript,
    /// polkit `pkexec /bin/sh -c` (Linux desktops)
    Pkexec,
}

impl ElevationMethod {
    pub fn native() -> Self {
        if cfg!(target_os = "macos") {
            ElevationMethod::AppleScript
        } else {
            ElevationMethod::Pkexec
        }
    }
}

pub struct SystemElevator {
    runner: Arc<dyn CommandRunner>,
    method: ElevationMethod,
    timeout: Duration,
}

impl SystemElevator {
    pub fn new(runner: Arc<dyn CommandRunner>, method: ElevationMethod, timeout: Duration) -> Self {
        Self {
            runner,
            method,
            timeout,
        }
    }

    fn command(&self, script: &str) -> (&'static str, Vec<String>) {
        match self.method {
            ElevationMethod::AppleScript => (
                "osascript",
                vec![
                    "-e".to_string(),
                    format!(
                        "do shell script \"{}\" with administrator privileges",
                        escape_applescript(script)
                    ),
                ],
            ),
            ElevationMethod::Pkexec => (
                "pkexec",
                vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()],
            ),
        }
    }

    fn is_denial(&self, status: Option<i32>, stderr: &str) -> bool {
        match self.method {
            // "User canceled. (-128)"
            ElevationMethod::AppleScript => stderr.contains("(-128)"),
            // 126: dialog dismissed, 127: not authorized
            ElevationMethod::Pkexec => matches!(status, Some(126) | Some(127)),
        }
    }
}

#[async_trait]
impl Elevator for SystemElevator {
    async fn run_elevated(&self, script: &str) -> Result<(), ElevationError> {
        let (program, args) = self.command(script);
        log::info!("requesting administrator authorization via {}", program);

        let output = self.runner.run(program, args, self.timeout).await?;
        if output.success() {
            return Ok(());
        }
        if self.is_denial(output.status, &output.stderr) {
            log::warn!("authorization via {} was denied", program);
            return Err(ElevationError::Denied);
        }
        Err(ElevationError::Failed {
            status: output.status,
            stderr: output.stderr,
        })
    }
}

/// Escape a string for an AppleScript string literal
fn escape_applescript(value: &str) -> String {
    // Backslashes and double quotes are the only characters needing escapes
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

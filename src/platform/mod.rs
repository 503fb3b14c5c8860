pub mod command;
mod linux;
mod macos;
mod ps;

use std::sync::Arc;

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::error::PlatformError;

pub use command::{CommandOutput, CommandRunner, SystemCommandRunner};
pub use linux::LinuxPlatform;
pub use macos::MacPlatform;

/// One row of a process snapshot
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    /// Full command line as reported by the OS
    pub command: String,
}

/// OS capabilities the blocker needs, one implementation per target
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Platform: Send + Sync + 'static {
    /// Snapshot of all running processes
    async fn list_processes(&self) -> Result<Vec<ProcessInfo>, PlatformError>;

    /// Forcibly terminate a process
    fn terminate(&self, pid: u32) -> Result<(), PlatformError>;

    /// Best-effort flush of the name-resolution cache with current privileges
    async fn flush_dns_cache(&self) -> Result<(), PlatformError>;

    /// Shell fragment flushing the name-resolution cache, run as root
    fn flush_script(&self) -> &'static str;

    /// Group owning root-installed files
    fn admin_group(&self) -> &'static str;
}

/// Send SIGKILL to `pid`
pub(crate) fn kill_pid(pid: u32) -> Result<(), PlatformError> {
    use nix::{
        sys::signal::{Signal, kill},
        unistd::Pid,
    };

    let raw = i32::try_from(pid).map_err(|_| PlatformError::Terminate {
        pid,
        source: nix::Error::EINVAL,
    })?;
    kill(Pid::from_raw(raw), Signal::SIGKILL).map_err(|source| PlatformError::Terminate { pid, source })
}

/// Platform implementation for the running OS
pub fn native_platform(runner: Arc<dyn CommandRunner>) -> Arc<dyn Platform> {
    #[cfg(target_os = "macos")]
    {
        Arc::new(MacPlatform::new(runner))
    }

    #[cfg(not(target_os = "macos"))]
    {
        Arc::new(LinuxPlatform::new(runner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kill_rejects_out_of_range_pid() {
        let err = kill_pid(u32::MAX).unwrap_err();
        assert!(matches!(err, PlatformError::Terminate { pid: u32::MAX, .. }));
    }

    #[tokio::test]
    async fn test_kill_terminates_child() {
        let mut child = tokio::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .unwrap();
        let pid = child.id().unwrap();

        kill_pid(pid).unwrap();

        let status = child.wait().await.unwrap();
        assert!(!status.success());
    }
}

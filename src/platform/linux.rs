use std::sync::Arc;

use async_trait::async_trait;

use super::{CommandRunner, Platform, ProcessInfo, command::DEFAULT_COMMAND_TIMEOUT, kill_pid, ps};
use crate::error::PlatformError;

const FLUSH_SCRIPT: &str =
    "resolvectl flush-caches 2>/dev/null || nscd -i hosts 2>/dev/null || true";

/// Linux: procps `ps`, systemd-resolved (or nscd) cache flush
pub struct LinuxPlatform {
    runner: Arc<dyn CommandRunner>,
}

impl LinuxPlatform {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Platform for LinuxPlatform {
    async fn list_processes(&self) -> Result<Vec<ProcessInfo>, PlatformError> {
        ps::snapshot(self.runner.as_ref()).await
    }

    fn terminate(&self, pid: u32) -> Result<(), PlatformError> {
        kill_pid(pid)
    }

    async fn flush_dns_cache(&self) -> Result<(), PlatformError> {
        // Hosts edits are read on every lookup unless a caching resolver sits in front
        let output = self
            .runner
            .run(
                "resolvectl",
                vec!["flush-caches".to_string()],
                DEFAULT_COMMAND_TIMEOUT,
            )
            .await?;
        if output.success() {
            return Ok(());
        }
        Err(PlatformError::CommandFailed {
            program: "resolvectl".to_string(),
            status: output.status,
            stderr: output.stderr,
        })
    }

    fn flush_script(&self) -> &'static str {
        FLUSH_SCRIPT
    }

    fn admin_group(&self) -> &'static str {
        "root"
    }
}

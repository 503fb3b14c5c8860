use std::sync::Arc;

use async_trait::async_trait;

use super::{CommandRunner, Platform, ProcessInfo, command::DEFAULT_COMMAND_TIMEOUT, kill_pid, ps};
use crate::error::PlatformError;

const FLUSH_SCRIPT: &str =
    "dscacheutil -flushcache 2>/dev/null || true; killall -HUP mDNSResponder 2>/dev/null || true";

/// macOS: BSD `ps`, Directory Services + mDNSResponder cache flush
pub struct MacPlatform {
    runner: Arc<dyn CommandRunner>,
}

impl MacPlatform {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Platform for MacPlatform {
    async fn list_processes(&self) -> Result<Vec<ProcessInfo>, PlatformError> {
        ps::snapshot(self.runner.as_ref()).await
    }

    fn terminate(&self, pid: u32) -> Result<(), PlatformError> {
        kill_pid(pid)
    }

    async fn flush_dns_cache(&self) -> Result<(), PlatformError> {
        // Without root only the Directory Services cache can be flushed;
        // mDNSResponder needs the privileged flush script.
        let output = self
            .runner
            .run(
                "dscacheutil",
                vec!["-flushcache".to_string()],
                DEFAULT_COMMAND_TIMEOUT,
            )
            .await?;
        if output.success() {
            return Ok(());
        }
        Err(PlatformError::CommandFailed {
            program: "dscacheutil".to_string(),
            status: output.status,
            stderr: output.stderr,
        })
    }

    fn flush_script(&self) -> &'static str {
        FLUSH_SCRIPT
    }

    fn admin_group(&self) -> &'static str {
        "wheel"
    }
}

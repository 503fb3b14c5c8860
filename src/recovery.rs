use crate::{error::SweepError, hosts::HostsEditor, hosts::region};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    /// No managed region was found; the hosts file was not written
    Clean,
    /// A region left by an earlier run was removed
    Repaired { domains: Vec<String> },
}

/// Remove any managed region left behind by a run that never cleaned up
///
/// Runs regardless of in-memory state, so call it before the first
/// `start_blocking` of a process.
pub async fn sweep(editor: &HostsEditor) -> Result<SweepOutcome, SweepError> {
    let content = editor.read().await?;
    if !region::has_region(&content) {
        log::debug!("no leftover block in {}", editor.hosts_path().display());
        return Ok(SweepOutcome::Clean);
    }

    let domains = region::managed_domains(&content);
    log::warn!(
        "removing {} domain(s) left blocked in {} by a previous run",
        domains.len(),
        editor.hosts_path().display()
    );
    editor.clear().await?;
    Ok(SweepOutcome::Repaired { domains })
}

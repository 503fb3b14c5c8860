use crate::platform::ProcessInfo;

/// Processes whose command line contains a configured app name
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Matches {
    /// Configured app names with at least one live process, in configured order
    pub apps: Vec<String>,
    /// Every matching pid
    pub pids: Vec<u32>,
}

/// Case-insensitive substring match of `apps` against `processes`
///
/// `own_pid` is never matched so the blocker cannot kill itself when an app
/// name happens to appear in its own command line.
pub fn find_matches(apps: &[String], processes: &[ProcessInfo], own_pid: u32) -> Matches {
    let lowered: Vec<(usize, String)> = processes
        .iter()
        .enumerate()
        .filter(|(_, process)| process.pid != own_pid)
        .map(|(idx, process)| (idx, process.command.to_lowercase()))
        .collect();

    let mut matches = Matches::default();
    for app in apps {
        let needle = app.to_lowercase();
        if needle.is_empty() {
            continue;
        }
        let mut found = false;
        for (idx, command) in &lowered {
            if command.contains(&needle) {
                found = true;
                let pid = processes[*idx].pid;
                if !matches.pids.contains(&pid) {
                    matches.pids.push(pid);
                }
            }
        }
        if found {
            matches.apps.push(app.clone());
        }
    }
    matches
}

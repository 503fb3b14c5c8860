use super::{CommandRunner, ProcessInfo, command::DEFAULT_COMMAND_TIMEOUT};
use crate::error::PlatformError;

/// Take a process snapshot with `ps`
///
/// Both BSD (macOS) and procps (Linux) `ps` accept `-axo pid=,command=`;
/// the trailing `=` suppresses the header row.
pub(super) async fn snapshot(runner: &dyn CommandRunner) -> Result<Vec<ProcessInfo>, PlatformError> {
    let args = vec!["-axo".to_string(), "pid=,command=".to_string()];
    let output = runner.run("ps", args, DEFAULT_COMMAND_TIMEOUT).await?;
    if !output.success() {
        return Err(PlatformError::CommandFailed {
            program: "ps".to_string(),
            status: output.status,
            stderr: output.stderr,
        });
    }
    Ok(parse_snapshot(&output.stdout))
}

/// Parse `ps -axo pid=,command=` output
///
/// Lines that do not start with a numeric pid are skipped. Processes with
/// an empty command (kernel threads on some systems) are kept with an empty
/// string so callers can still see the pid.
pub(super) fn parse_snapshot(stdout: &str) -> Vec<ProcessInfo> {
    stdout
        .lines()
        .filter_map(|line| {
            let line = line.trim_start();
            if line.is_empty() {
                return None;
            }
            let (pid, command) = match line.split_once(char::is_whitespace) {
                Some((pid, rest)) => (pid, rest.trim()),
                None => (line, ""),
            };
            let pid = pid.parse::<u32>().ok()?;
            Some(ProcessInfo {
                pid,
                command: command.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_typical_macos_output() {
        let stdout = "    1 /sbin/launchd\n  412 /Applications/Discord.app/Contents/MacOS/Discord --type=renderer\n 9001 -zsh\n";
        let processes = parse_snapshot(stdout);

        assert_eq!(
            processes,
            vec![
                ProcessInfo {
                    pid: 1,
                    command: "/sbin/launchd".to_string(),
                },
                ProcessInfo {
                    pid: 412,
                    command: "/Applications/Discord.app/Contents/MacOS/Discord --type=renderer"
                        .to_string(),
                },
                ProcessInfo {
                    pid: 9001,
                    command: "-zsh".to_string(),
                },
            ]
        );
    }

    #[rstest]
    #[case("", 0, "empty output")]
    #[case("PID COMMAND\n", 0, "header row is skipped")]
    #[case("  2\n", 1, "pid without command")]
    #[case("abc /bin/sh\n 7 /bin/sh\n", 1, "garbage line skipped")]
    #[case("\n\n  8 /usr/bin/top\n\n", 1, "blank lines skipped")]
    fn test_parse_edge_cases(
        #[case] stdout: &str,
        #[case] expected: usize,
        #[case] description: &str,
    ) {
        assert_eq!(parse_snapshot(stdout).len(), expected, "{}", description);
    }
}

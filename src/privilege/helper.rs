//! Rendering of the privileged artifacts and the shell snippets that install them.
//!
//! Everything that ends up executed as root is produced here, so the quoting
//! and path rules live in one place.

use std::path::Path;

use crate::error::BootstrapError;

/// Suffix of the sibling file a new hosts file is written to before the rename
pub const STAGING_SUFFIX: &str = ".focusguard-new";

/// Exit code of the helper for an unknown verb (EX_USAGE)
pub const USAGE_EXIT_CODE: i32 = 64;

/// Quote `value` for POSIX `sh` as a single-quoted word
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Sibling path used for the copy-then-rename install
pub fn staging_sibling(target: &Path) -> String {
    format!("{}{}", target.display(), STAGING_SUFFIX)
}

/// Ensure `path` can be named exactly in a sudoers rule
///
/// Sudoers treats whitespace, wildcards and a few punctuation characters
/// specially; a rule naming such a path could authorize more than one
/// binary.
pub fn validate_rule_path(path: &Path) -> Result<(), BootstrapError> {
    let unsafe_path = |reason: &str| BootstrapError::UnsafePath {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    if !path.is_absolute() {
        return Err(unsafe_path("path must be absolute"));
    }
    let text = path
        .to_str()
        .ok_or_else(|| unsafe_path("path must be valid UTF-8"))?;
    if let Some(c) = text
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || "*?[]\\,:=!\"'#".contains(*c))
    {
        return Err(unsafe_path(&format!("character {:?} is not allowed", c)));
    }
    if text.split('/').any(|part| part == "..") {
        return Err(unsafe_path("path must not contain '..'"));
    }
    Ok(())
}

/// Ensure `name` is a plain POSIX user name
pub fn validate_user_name(name: &str) -> Result<(), BootstrapError> {
    let plain = !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if plain {
        Ok(())
    } else {
        Err(BootstrapError::UnsafeUserName {
            name: name.to_string(),
        })
    }
}

/// Sudoers fragment letting `user` run exactly `helper` as root without a password
pub fn render_sudoers_rule(user: &str, helper: &Path) -> String {
    format!("{} ALL=(root) NOPASSWD: {}\n", user, helper.display())
}

/// The helper script installed at the trusted helper path
///
/// It only ever writes `hosts`. `install <size>` reads the new content from
/// stdin into the sibling staging file, refuses it unless exactly `size`
/// bytes arrived, then renames it over the hosts file. Root never opens a
/// path chosen by the caller.
pub fn render_helper_script(hosts: &Path, flush_script: &str) -> String {
    let hosts_q = shell_quote(&hosts.display().to_string());
    let staging_q = shell_quote(&staging_sibling(hosts));
    format!(
        r#"#!/bin/sh
# focusguard hosts helper: replaces {hosts} with content read from stdin.
set -eu

HOSTS_PATH={hosts_q}
STAGING_PATH={staging_q}

usage() {{
  echo "usage: $0 {{install <size> < content|flush}}" >&2
  exit {usage}
}}

case "${{1:-}}" in
  install)
    SIZE="${{2:-}}"
    [ "$#" -eq 2 ] || usage
    case "$SIZE" in
      ''|*[!0-9]*) usage ;;
    esac
    umask 022
    rm -f "$STAGING_PATH"
    cat > "$STAGING_PATH"
    if [ "$(wc -c < "$STAGING_PATH" | tr -d ' ')" != "$SIZE" ]; then
      rm -f "$STAGING_PATH"
      echo "expected $SIZE bytes of hosts content on stdin" >&2
      exit 1
    fi
    chmod 644 "$STAGING_PATH"
    mv -f "$STAGING_PATH" "$HOSTS_PATH"
    ;;
  flush)
    {flush_script}
    ;;
  *)
    usage
    ;;
esac
"#,
        hosts = hosts.display(),
        hosts_q = hosts_q,
        staging_q = staging_q,
        flush_script = flush_script,
        usage = USAGE_EXIT_CODE,
    )
}

/// Root shell replacing `target` with `content` via write-then-rename
///
/// The content travels inside the script as a quoted here-document, so the
/// root shell reads nothing from the caller's file system.
pub fn render_install_script(content: &str, target: &Path) -> String {
    let staging = shell_quote(&staging_sibling(target));
    let delimiter = heredoc_delimiter(content);
    let newline = if content.is_empty() || content.ends_with('\n') {
        ""
    } else {
        "\n"
    };
    format!(
        "umask 022 && cat > {tmp} <<'{delimiter}' && chmod 644 {tmp} && mv -f {tmp} {dst}\n{content}{newline}{delimiter}\n",
        tmp = staging,
        dst = shell_quote(&target.display().to_string()),
    )
}

/// A here-document terminator that no line of `content` equals
fn heredoc_delimiter(content: &str) -> String {
    let mut delimiter = String::from("FOCUSGUARD_HOSTS_EOF");
    while content.lines().any(|line| line == delimiter) {
        delimiter.push('_');
    }
    delimiter
}

/// Root shell installing the staged helper and sudoers fragment in one go
///
/// The fragment is checked with `visudo -cf` before it is moved into
/// place; a malformed file in `sudoers.d` disables sudo entirely.
pub fn render_bootstrap_script(
    staged_helper: &Path,
    helper: &Path,
    staged_sudoers: &Path,
    sudoers: &Path,
    group: &str,
) -> String {
    let dir_of = |path: &Path| {
        shell_quote(
            &path
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "/".to_string()),
        )
    };
    let q = |path: &Path| shell_quote(&path.display().to_string());

    [
        format!("mkdir -p {} {}", dir_of(helper), dir_of(sudoers)),
        format!(
            "install -m 0755 -o root -g {} {} {}",
            group,
            q(staged_helper),
            q(helper)
        ),
        format!("visudo -cf {} >/dev/null", q(staged_sudoers)),
        format!(
            "install -m 0440 -o root -g {} {} {}",
            group,
            q(staged_sudoers),
            q(sudoers)
        ),
    ]
    .join(" && ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::PathBuf;

    #[rstest]
    #[case("plain", "'plain'")]
    #[case("with space", "'with space'")]
    #[case("it's", r"'it'\''s'")]
    #[case("", "''")]
    fn test_shell_quote(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(shell_quote(input), expected);
    }

    #[rstest]
    #[case("/usr/local/bin/focusguard-hosts-helper", true)]
    #[case("/etc/sudoers.d/focusguard", true)]
    #[case("relative/helper", false)]
    #[case("/usr/local/bin/*", false)]
    #[case("/usr/local/bin/helper ALL", false)]
    #[case("/usr/local/bin/../../bin/sh", false)]
    #[case("/opt/a,b", false)]
    #[case("/opt/helper\n", false)]
    fn test_validate_rule_path(#[case] path: &str, #[case] ok: bool) {
        assert_eq!(validate_rule_path(Path::new(path)).is_ok(), ok, "{}", path);
    }

    #[rstest]
    #[case("alice", true)]
    #[case("first.last", true)]
    #[case("svc_user-2", true)]
    #[case("", false)]
    #[case("-rf", false)]
    #[case("alice ALL=(ALL) ALL", false)]
    #[case("bob\nroot", false)]
    fn test_validate_user_name(#[case] name: &str, #[case] ok: bool) {
        assert_eq!(validate_user_name(name).is_ok(), ok, "{:?}", name);
    }

    #[test]
    fn test_sudoers_rule_names_exact_helper() {
        let rule = render_sudoers_rule("alice", Path::new("/usr/local/bin/focusguard-hosts-helper"));
        assert_eq!(
            rule,
            "alice ALL=(root) NOPASSWD: /usr/local/bin/focusguard-hosts-helper\n"
        );
    }

    #[test]
    fn test_helper_script_is_bound_to_hosts_path() {
        let script = render_helper_script(Path::new("/etc/hosts"), "true");

        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains("HOSTS_PATH='/etc/hosts'"));
        assert!(script.contains("STAGING_PATH='/etc/hosts.focusguard-new'"));
        assert!(script.contains("mv -f \"$STAGING_PATH\" \"$HOSTS_PATH\""));
        assert!(script.contains("cat > \"$STAGING_PATH\""));
        assert!(script.contains("exit 64"));
        assert!(!script.contains("cp "));
        assert!(!script.contains("find "));
    }

    fn run_helper(script: &Path, args: &[&str], input: &[u8]) -> std::process::Output {
        use std::{io::Write, process::{Command, Stdio}};

        let mut child = Command::new("sh")
            .arg(script)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        child.stdin.take().unwrap().write_all(input).unwrap();
        child.wait_with_output().unwrap()
    }

    #[test]
    fn test_helper_installs_stdin_content() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let hosts = dir.path().join("hosts");
        std::fs::write(&hosts, "old\n").unwrap();
        let script = dir.path().join("helper");
        std::fs::write(&script, render_helper_script(&hosts, "true")).unwrap();

        let content = "127.0.0.1 localhost\n127.0.0.1 news.example\n";
        let size = content.len().to_string();
        let output = run_helper(&script, &["install", &size], content.as_bytes());

        assert!(output.status.success(), "{:?}", output);
        assert_eq!(std::fs::read_to_string(&hosts).unwrap(), content);
        let mode = std::fs::metadata(&hosts).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
        assert!(!dir.path().join("hosts.focusguard-new").exists());
    }

    #[test]
    fn test_helper_rejects_short_input_and_path_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let hosts = dir.path().join("hosts");
        std::fs::write(&hosts, "old\n").unwrap();
        let secret = dir.path().join("secret");
        std::fs::write(&secret, "root only\n").unwrap();
        let script = dir.path().join("helper");
        std::fs::write(&script, render_helper_script(&hosts, "true")).unwrap();

        let short = run_helper(&script, &["install", "100"], b"127.0.0.1 x\n");
        assert_eq!(short.status.code(), Some(1));

        let secret_arg = secret.display().to_string();
        let by_path = run_helper(&script, &["install", &secret_arg], b"");
        assert_eq!(by_path.status.code(), Some(USAGE_EXIT_CODE));

        let extra = run_helper(&script, &["install", "10", &secret_arg], b"");
        assert_eq!(extra.status.code(), Some(USAGE_EXIT_CODE));

        assert_eq!(std::fs::read_to_string(&hosts).unwrap(), "old\n");
        assert!(!dir.path().join("hosts.focusguard-new").exists());
    }

    #[test]
    fn test_install_script_embeds_content() {
        let script = render_install_script("127.0.0.1 localhost\n", Path::new("/etc/hosts"));
        assert_eq!(
            script,
            "umask 022 && cat > '/etc/hosts.focusguard-new' <<'FOCUSGUARD_HOSTS_EOF' && chmod 644 '/etc/hosts.focusguard-new' && mv -f '/etc/hosts.focusguard-new' '/etc/hosts'\n127.0.0.1 localhost\nFOCUSGUARD_HOSTS_EOF\n"
        );
    }

    #[test]
    fn test_install_script_writes_exact_content() {
        let dir = tempfile::tempdir().unwrap();
        let hosts = dir.path().join("hosts");
        std::fs::write(&hosts, "old\n").unwrap();
        let content = "127.0.0.1 localhost\nFOCUSGUARD_HOSTS_EOF\n# $HOME `id`\n";

        let script = render_install_script(content, &hosts);
        let status = std::process::Command::new("sh")
            .args(["-c", &script])
            .status()
            .unwrap();

        assert!(status.success());
        assert_eq!(std::fs::read_to_string(&hosts).unwrap(), content);
    }

    #[test]
    fn test_bootstrap_script_validates_before_install() {
        let script = render_bootstrap_script(
            &PathBuf::from("/tmp/h"),
            &PathBuf::from("/usr/local/bin/focusguard-hosts-helper"),
            &PathBuf::from("/tmp/s"),
            &PathBuf::from("/etc/sudoers.d/focusguard"),
            "wheel",
        );

        let visudo = script.find("visudo -cf '/tmp/s'").unwrap();
        let install_sudoers = script
            .find("install -m 0440 -o root -g wheel '/tmp/s' '/etc/sudoers.d/focusguard'")
            .unwrap();
        assert!(visudo < install_sudoers);
        assert!(script.starts_with("mkdir -p '/usr/local/bin' '/etc/sudoers.d'"));
        assert!(script.contains(
            "install -m 0755 -o root -g wheel '/tmp/h' '/usr/local/bin/focusguard-hosts-helper'"
        ));
    }
}

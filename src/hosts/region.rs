//! The managed region inside the hosts file.
//!
//! ```text
//! <existing content>
//!
//! # FOCUSGUARD-BLOCK-START
//! 127.0.0.1 example.com
//! # FOCUSGUARD-BLOCK-END
//! ```

pub const START_MARKER: &str = "# FOCUSGUARD-BLOCK-START";
pub const END_MARKER: &str = "# FOCUSGUARD-BLOCK-END";
pub const LOOPBACK: &str = "127.0.0.1";

/// Build the managed region for `domains`, without a trailing newline
pub fn render_region(domains: &[String]) -> String {
    let mut lines = Vec::with_capacity(domains.len() + 2);
    lines.push(START_MARKER.to_string());
    lines.extend(domains.iter().map(|domain| format!("{} {}", LOOPBACK, domain)));
    lines.push(END_MARKER.to_string());
    lines.join("\n")
}

/// Whether `content` carries any start or end marker
pub fn has_region(content: &str) -> bool {
    content.lines().any(|line| is_marker(line.trim()))
}

/// Remove every managed region from `content`
///
/// Content without markers is returned untouched. Otherwise the regions are
/// dropped (markers included), runs of blank lines collapse to a single
/// blank line and the result ends with exactly one newline.
///
/// Everything between a start marker and its end marker goes. A start
/// marker with no end marker before the next start marker only takes the
/// loopback entries directly following it along; a stray end marker is
/// dropped.
pub fn strip_region(content: &str) -> String {
    if !has_region(content) {
        return content.to_string();
    }

    let kept: Vec<&str> = classify(content)
        .into_iter()
        .filter_map(|line| match line {
            Line::Kept(line) => Some(line),
            Line::Managed(_) => None,
        })
        .collect();
    normalize(&kept)
}

/// Replace any managed region in `content` with one built from `domains`
///
/// The region is appended after the existing content, separated from it by
/// one blank line.
pub fn with_region(content: &str, domains: &[String]) -> String {
    let stripped = strip_region(content);
    let base = stripped.trim_end();
    let region = render_region(domains);
    if base.is_empty() {
        format!("{}\n", region)
    } else {
        format!("{}\n\n{}\n", base, region)
    }
}

/// Domains listed inside managed regions, in file order
pub fn managed_domains(content: &str) -> Vec<String> {
    classify(content)
        .into_iter()
        .filter_map(|line| match line {
            Line::Managed(Some(domain)) => Some(domain.to_string()),
            _ => None,
        })
        .collect()
}

fn is_marker(line: &str) -> bool {
    line == START_MARKER || line == END_MARKER
}

enum Line<'a> {
    /// Outside any region
    Kept(&'a str),
    /// Marker or region body, with the blocked domain when the line is an entry
    Managed(Option<&'a str>),
}

fn classify(content: &str) -> Vec<Line<'_>> {
    let lines: Vec<&str> = content.lines().collect();
    let mut out = Vec::with_capacity(lines.len());
    let mut idx = 0;
    while idx < lines.len() {
        let trimmed = lines[idx].trim();
        if trimmed == END_MARKER {
            out.push(Line::Managed(None));
            idx += 1;
            continue;
        }
        if trimmed != START_MARKER {
            out.push(Line::Kept(lines[idx]));
            idx += 1;
            continue;
        }

        out.push(Line::Managed(None));
        idx += 1;
        let end = lines[idx..]
            .iter()
            .position(|line| is_marker(line.trim()))
            .map(|offset| idx + offset)
            .filter(|&pos| lines[pos].trim() == END_MARKER);
        match end {
            Some(end) => {
                out.extend(lines[idx..end].iter().map(|line| Line::Managed(entry(line.trim()))));
                out.push(Line::Managed(None));
                idx = end + 1;
            }
            None => {
                // A system localhost line may follow an unterminated marker
                while let Some(domain) = lines
                    .get(idx)
                    .and_then(|line| entry(line.trim()))
                    .filter(|domain| *domain != "localhost")
                {
                    out.push(Line::Managed(Some(domain)));
                    idx += 1;
                }
            }
        }
    }
    out
}

/// `127.0.0.1 <domain>` as written by `render_region`
fn entry(line: &str) -> Option<&str> {
    let mut fields = line.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some(LOOPBACK), Some(domain), None) => Some(domain),
        _ => None,
    }
}

fn normalize(lines: &[&str]) -> String {
    let mut out = String::new();
    let mut previous_blank = false;
    for line in lines {
        let blank = line.is_empty();
        if blank && previous_blank {
            continue;
        }
        out.push_str(line);
        out.push('\n');
        previous_blank = blank;
    }
    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const BASE: &str = "127.0.0.1 localhost\n255.255.255.255 broadcasthost\n::1 localhost\n";

    fn domains(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_render_region() {
        assert_eq!(
            render_region(&domains(&["example.com", "www.example.com"])),
            "# FOCUSGUARD-BLOCK-START\n127.0.0.1 example.com\n127.0.0.1 www.example.com\n# FOCUSGUARD-BLOCK-END"
        );
    }

    #[test]
    fn test_with_region_appends_after_one_blank_line() {
        let updated = with_region(BASE, &domains(&["example.com"]));
        assert_eq!(
            updated,
            format!(
                "{}\n{}\n127.0.0.1 example.com\n{}\n",
                BASE, START_MARKER, END_MARKER
            )
        );
    }

    #[test]
    fn test_with_region_on_empty_file_has_no_leading_blank() {
        let updated = with_region("", &domains(&["example.com"]));
        assert!(updated.starts_with(START_MARKER));
        assert!(updated.ends_with(&format!("{}\n", END_MARKER)));
    }

    #[test]
    fn test_reapply_replaces_region() {
        let first = with_region(BASE, &domains(&["a.example", "b.example"]));
        let second = with_region(&first, &domains(&["c.example"]));

        assert_eq!(second.matches(START_MARKER).count(), 1);
        assert_eq!(second.matches(END_MARKER).count(), 1);
        assert!(!second.contains("a.example"));
        assert!(!second.contains("b.example"));
        assert_eq!(managed_domains(&second), domains(&["c.example"]));
        assert_eq!(second, with_region(BASE, &domains(&["c.example"])));
    }

    #[test]
    fn test_strip_restores_original() {
        let applied = with_region(BASE, &domains(&["example.com", "www.example.com"]));
        assert_eq!(strip_region(&applied), BASE);
    }

    #[test]
    fn test_repeated_cycles_do_not_grow_blank_lines() {
        let mut content = BASE.to_string();
        for _ in 0..5 {
            content = with_region(&content, &domains(&["example.com"]));
            content = strip_region(&content);
        }
        assert_eq!(content, BASE);
    }

    #[test]
    fn test_strip_without_markers_is_identity() {
        let odd = "127.0.0.1 localhost\n\n\n\n# comment   \n";
        assert_eq!(strip_region(odd), odd);
        assert!(!has_region(odd));
    }

    #[test]
    fn test_strip_region_in_the_middle() {
        let content = format!(
            "127.0.0.1 localhost\n\n{}\n127.0.0.1 example.com\n{}\n\n\n10.0.0.5 nas.local\n",
            START_MARKER, END_MARKER
        );
        assert_eq!(
            strip_region(&content),
            "127.0.0.1 localhost\n\n10.0.0.5 nas.local\n"
        );
    }

    #[test]
    fn test_strip_removes_every_region() {
        let region = render_region(&domains(&["example.com"]));
        let content = format!("{}\n{}\n\n{}\n", BASE, region, region);
        let stripped = strip_region(&content);
        assert_eq!(stripped, BASE);
    }

    #[test]
    fn test_unterminated_region_keeps_foreign_lines() {
        let content = format!(
            "{}\n{}\n127.0.0.1 example.com\n10.0.0.5 nas.local\n127.0.0.1 localhost\n",
            "::1 localhost", START_MARKER
        );
        assert_eq!(
            strip_region(&content),
            "::1 localhost\n10.0.0.5 nas.local\n127.0.0.1 localhost\n"
        );
    }

    #[test]
    fn test_terminated_region_drops_every_inner_line() {
        let applied = with_region(BASE, &domains(&["localhost", "news.example"]));
        assert_eq!(managed_domains(&applied), domains(&["localhost", "news.example"]));
        assert_eq!(strip_region(&applied), BASE);

        let edited = format!(
            "{}\n{}\n127.0.0.1 a.example\n# paused for lunch\n10.0.0.5 nas.local\n127.0.0.1 b.example\n{}\n",
            BASE, START_MARKER, END_MARKER
        );
        assert_eq!(managed_domains(&edited), domains(&["a.example", "b.example"]));
        assert_eq!(strip_region(&edited), BASE);
    }

    #[test]
    fn test_start_before_end_makes_first_region_unterminated() {
        let content = format!(
            "{}\n127.0.0.1 a.example\n10.0.0.5 nas.local\n{}\n127.0.0.1 b.example\n{}\n",
            START_MARKER,
            render_region(&domains(&["c.example"])),
            END_MARKER
        );
        // first start: unterminated, ends at nas.local; second region is whole
        assert_eq!(managed_domains(&content), domains(&["a.example", "c.example"]));
        assert_eq!(strip_region(&content), "10.0.0.5 nas.local\n127.0.0.1 b.example\n");
    }

    #[test]
    fn test_stray_end_marker_is_dropped() {
        let content = format!("{}{}\n", BASE, END_MARKER);
        assert_eq!(strip_region(&content), BASE);
        assert!(has_region(&content));
    }

    #[rstest]
    #[case("", vec![], "empty file")]
    #[case(BASE, vec![], "no region")]
    #[case("# FOCUSGUARD-BLOCK-START\n127.0.0.1 a.example\n127.0.0.1 b.example\n# FOCUSGUARD-BLOCK-END\n", vec!["a.example", "b.example"], "well formed")]
    #[case("  # FOCUSGUARD-BLOCK-START  \n127.0.0.1   a.example\n# FOCUSGUARD-BLOCK-END\n", vec!["a.example"], "extra whitespace")]
    #[case("# FOCUSGUARD-BLOCK-START\n127.0.0.1 a.example\n10.0.0.1 b.example\n", vec!["a.example"], "unterminated")]
    fn test_managed_domains(
        #[case] content: &str,
        #[case] expected: Vec<&str>,
        #[case] description: &str,
    ) {
        assert_eq!(managed_domains(content), domains(&expected), "{}", description);
    }
}

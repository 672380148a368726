use std::sync::LazyLock;

use crossterm::style::{Color, Stylize};
use regex::Regex;

use crate::theme::Theme;

static FAILURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:error|errors|failed|failure|unable to|cannot|timeout|denied|forbidden)\b")
        .expect("valid regex")
});

static SUCCESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:success|successfully|created|updated|deleted)\b").expect("valid regex")
});

static RESOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:pods?|nodes?|services?|deployments?|daemonsets?|statefulsets?|configmaps?|secrets?|namespaces?)/[a-zA-Z0-9_.-]+",
    )
    .expect("valid regex")
});

static SOURCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-zA-Z0-9_-]+\.go:\d+\b").expect("valid regex"));

/// Color notable fragments of a message: failures, successes, resource
/// references and source locations. Overlapping matches keep the earliest.
pub fn highlight_message(message: &str) -> String {
    let rules: [(&Regex, Color); 4] = [
        (&FAILURE, Theme::HL_FAILURE),
        (&SUCCESS, Theme::HL_SUCCESS),
        (&RESOURCE, Theme::HL_RESOURCE),
        (&SOURCE, Theme::HL_SOURCE),
    ];

    let mut spans: Vec<(usize, usize, Color)> = rules
        .iter()
        .flat_map(|(re, color)| re.find_iter(message).map(|m| (m.start(), m.end(), *color)))
        .collect();
    spans.sort_by_key(|(start, end, _)| (*start, std::cmp::Reverse(*end)));

    let mut out = String::with_capacity(message.len() + spans.len() * 10);
    let mut pos = 0;
    for (start, end, color) in spans {
        if start < pos {
            continue;
        }
        out.push_str(&message[pos..start]);
        out.push_str(&message[start..end].with(color).to_string());
        pos = end;
    }
    out.push_str(&message[pos..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(s: &str) -> String {
        let ansi = Regex::new(r"\x1b\[[0-9;]*m").unwrap();
        ansi.replace_all(s, "").into_owned()
    }

    #[test]
    fn test_plain_message_unchanged() {
        let msg = "Starting kube-apiserver";
        assert_eq!(highlight_message(msg), msg);
    }

    #[test]
    fn test_highlight_preserves_text() {
        let msg = "failed to sync pod/nginx-7c9f in controller.go:123, retry successfully";
        assert_eq!(strip(&highlight_message(msg)), msg);
    }

    #[test]
    fn test_overlapping_matches() {
        // "pods/timeout-x" contains a failure keyword inside a resource reference
        let msg = "deleted pods/timeout-x";
        assert_eq!(strip(&highlight_message(msg)), msg);
    }
}

//! Turns raw model output into a canonical commit message.
//!
//! Models return anything from a clean conventional commit to a markdown
//! document with a leaked chain-of-thought block in front. This module
//! flattens all of it into the same shape and never fails: once the network
//! call succeeded, the user gets a message, worst case the fixed fallback.

use std::sync::OnceLock;

use regex_lite::Regex;

use crate::message::CommitMessage;

/// Commit types accepted in the subject line.
pub const COMMIT_TYPES: [&str; 11] = [
    "feat", "fix", "docs", "style", "refactor", "test", "chore", "perf", "ci", "build", "revert",
];

const MAX_SUMMARY: usize = 72;
const ELLIPSIS: &str = "...";
const FALLBACK_SUMMARY: &str = "chore: update";
const FALLBACK_BULLET: &str = "- Update implementation";

fn conventional_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^((?:feat|fix|docs|style|refactor|test|chore|perf|ci|build|revert)(?:\([^)]*\))?!?): (.+)$",
        )
        .expect("conventional commit regex")
    })
}

fn reasoning_res() -> &'static [Regex; 4] {
    static RES: OnceLock<[Regex; 4]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            Regex::new(r"(?is)<think(?:ing)?>.*?</think(?:ing)?>").expect("reasoning regex"),
            Regex::new(r"(?is)<reasoning>.*?</reasoning>").expect("reasoning regex"),
            // Unclosed opener: the model got cut off mid-scratchpad. Drop the rest.
            Regex::new(r"(?is)<think(?:ing)?>.*$").expect("reasoning regex"),
            Regex::new(r"(?is)<reasoning>.*$").expect("reasoning regex"),
        ]
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>|\[[^\]]*\]").expect("tag regex"))
}

/// Normalize arbitrary model text into a commit message. Total: every input,
/// including the empty string, produces a valid message. Idempotent on its
/// own `render()` output.
pub fn normalize(raw: &str) -> CommitMessage {
    let mut text = raw.to_string();
    for re in reasoning_res() {
        text = re.replace_all(&text, "").into_owned();
    }

    // Fence lines are dropped wholesale (before backtick stripping would eat
    // the markers); fenced content itself survives.
    let lines: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.starts_with("```"))
        .map(|l| l.replace("**", "").replace("__", "").replace('`', ""))
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();

    let Some((first, rest)) = lines.split_first() else {
        return fallback_message();
    };

    CommitMessage {
        summary: build_summary(first),
        description: build_description(rest),
    }
}

/// The message produced when the model returned nothing usable.
pub fn fallback_message() -> CommitMessage {
    CommitMessage {
        summary: FALLBACK_SUMMARY.to_string(),
        description: FALLBACK_BULLET.to_string(),
    }
}

fn build_summary(first_line: &str) -> String {
    let (prefix, body) = match conventional_re().captures(first_line) {
        Some(caps) => (caps[1].to_string(), caps[2].to_string()),
        None => (infer_type(first_line).to_string(), first_line.to_string()),
    };

    let body = tag_re().replace_all(&body, "");
    let body = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if body.is_empty() {
        return FALLBACK_SUMMARY.to_string();
    }

    truncate_summary(&format!("{prefix}: {body}"))
}

/// Keyword heuristics for lines the model wrote without a type tag.
fn infer_type(line: &str) -> &'static str {
    let lower = line.to_lowercase();
    if lower.contains("fix") {
        "fix"
    } else if lower.contains("add") || lower.contains("new") {
        "feat"
    } else if lower.contains("refactor") {
        "refactor"
    } else {
        "chore"
    }
}

/// Truncate to 72 characters at the last word boundary, ellipsis included.
fn truncate_summary(summary: &str) -> String {
    let chars: Vec<char> = summary.chars().collect();
    if chars.len() <= MAX_SUMMARY {
        return summary.to_string();
    }

    let budget = MAX_SUMMARY - ELLIPSIS.len();
    // Never cut back into the `type: ` prefix — a single huge first word gets
    // a hard cut instead.
    let content_start = summary.find(": ").map(|i| i + 2).unwrap_or(0);
    let cut = chars[..budget]
        .iter()
        .rposition(|c| *c == ' ')
        .filter(|&i| i > content_start)
        .unwrap_or(budget);

    let head: String = chars[..cut].iter().collect();
    format!("{}{ELLIPSIS}", head.trim_end())
}

fn build_description(lines: &[String]) -> String {
    let mut bullets: Vec<String> = Vec::new();
    for line in lines {
        // Headings are section decoration, not content. A bare bullet marker
        // with nothing after it is noise.
        if line.starts_with('#') || line == "-" || line == "*" {
            continue;
        }
        let content = line
            .strip_prefix("- ")
            .or_else(|| line.strip_prefix("* "))
            .or_else(|| line.strip_prefix("• "))
            .unwrap_or(line.as_str())
            .trim();
        if content.is_empty() {
            continue;
        }
        bullets.push(format!("- {content}"));
    }

    if bullets.is_empty() {
        FALLBACK_BULLET.to_string()
    } else {
        bullets.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_conventional_summary_verbatim() {
        let msg = normalize("feat(ui): add dark mode\n- toggle added");
        assert_eq!(msg.summary, "feat(ui): add dark mode");
        assert_eq!(msg.description, "- toggle added");
    }

    #[test]
    fn empty_input_degrades_to_fallback() {
        assert_eq!(normalize(""), fallback_message());
        assert_eq!(normalize("\n\n  \n"), fallback_message());
        assert_eq!(normalize("<think>only scratchpad</think>"), fallback_message());
    }

    #[test]
    fn giant_first_word_gets_hard_cut() {
        let msg = normalize(&format!("chore: {}", "x".repeat(120)));
        assert!(msg.summary.chars().count() <= MAX_SUMMARY);
        assert!(msg.summary.ends_with("..."));
        assert!(msg.summary.starts_with("chore: "));
    }

    #[test]
    fn heading_lines_are_dropped() {
        let msg = normalize("fix: handle timeout\n## Changes\n- retry removed");
        assert_eq!(msg.description, "- retry removed");
    }
}

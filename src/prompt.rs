use crate::message::{StyleOptions, Verbosity};

/// Build the instruction text for one generation. Pure and deterministic:
/// the same inputs always produce the same prompt. The diff goes in
/// verbatim — summarizing it here would throw away exactly the detail the
/// model needs.
pub fn build_prompt(diff: &str, style: &StyleOptions, context: Option<&str>) -> String {
    let mut prompt = String::with_capacity(diff.len() + 512);

    prompt.push_str(
        "Write a git commit message for the staged changes below.\n\
         Use the conventional commit format: a subject line of the form\n\
         `type: summary` followed by a blank line and bullet points.\n\
         Valid types: feat, fix, docs, style, refactor, test, chore, perf, ci, build, revert.\n",
    );

    if style.include_scope {
        prompt.push_str(
            "Include a scope in parentheses after the type when one is clear, \
             e.g. `feat(parser): ...`.\n",
        );
    }

    prompt.push_str(&format!(
        "Keep the subject line under {} characters.\n",
        style.max_subject
    ));

    match style.verbosity {
        Verbosity::Concise => {
            prompt.push_str("Keep the body to one or two short bullets.\n");
        }
        Verbosity::Standard => {
            prompt.push_str("Describe each meaningful change as its own bullet.\n");
        }
        Verbosity::Detailed => {
            prompt.push_str(
                "Describe each change as its own bullet, including the motivation \
                 where the diff makes it apparent.\n",
            );
        }
    }

    prompt.push_str("Respond with the commit message only, no preamble.\n\nDiff:\n");
    prompt.push_str(diff);

    if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str("\n\nAdditional context from the user:\n");
        prompt.push_str(context);
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let style = StyleOptions::default();
        let a = build_prompt("diff --git a/x b/x", &style, Some("touches auth"));
        let b = build_prompt("diff --git a/x b/x", &style, Some("touches auth"));
        assert_eq!(a, b);
    }

    #[test]
    fn diff_embedded_verbatim() {
        let diff = "diff --git a/src/lib.rs b/src/lib.rs\n+fn new_helper() {}\n";
        let prompt = build_prompt(diff, &StyleOptions::default(), None);
        assert!(prompt.contains(diff));
    }

    #[test]
    fn context_appended_after_diff() {
        let prompt = build_prompt("THE_DIFF", &StyleOptions::default(), Some("THE_CONTEXT"));
        let diff_at = prompt.find("THE_DIFF").unwrap();
        let ctx_at = prompt.find("THE_CONTEXT").unwrap();
        assert!(ctx_at > diff_at);
    }

    #[test]
    fn blank_context_omitted() {
        let prompt = build_prompt("d", &StyleOptions::default(), Some("   "));
        assert!(!prompt.contains("Additional context"));
    }

    #[test]
    fn scope_toggle_changes_instructions() {
        let mut style = StyleOptions::default();
        let without = build_prompt("d", &style, None);
        style.include_scope = true;
        let with = build_prompt("d", &style, None);
        assert!(with.contains("scope"));
        assert!(!without.contains("scope in parentheses"));
    }
}

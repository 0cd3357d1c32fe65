//! Review prompt construction shared by the CLI-backed engines.

use indoc::formatdoc;

use crate::{FocusArea, PullRequestContext};

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;

/// Maximum characters of diff text embedded directly into a prompt.
///
/// Only relevant for engines that cannot take the diff on stdin.
pub(crate) const MAX_EMBEDDED_DIFF_CHARS: usize = 200_000;

/// Builds the review prompt for one invocation.
///
/// When `embedded_diff` is `Some`, the diff is inlined into the prompt
/// (truncated at [`MAX_EMBEDDED_DIFF_CHARS`]); otherwise the prompt states
/// that the diff arrives on stdin.
pub(crate) fn build_review_prompt(
    focus: &[FocusArea],
    pr: &PullRequestContext,
    embedded_diff: Option<&str>,
) -> String {
    let focus_text = if focus.is_empty() {
        FocusArea::ALL
            .iter()
            .map(|f| f.description())
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        focus
            .iter()
            .map(|f| f.description())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let diff_section = match embedded_diff {
        Some(diff) => {
            let truncated = truncate_chars(diff, MAX_EMBEDDED_DIFF_CHARS);
            let marker = if truncated.len() < diff.len() {
                "\n\n... (diff truncated)"
            } else {
                ""
            };
            formatdoc!(
                "**Diff:**
                ```diff
                {truncated}{marker}
                ```"
            )
        }
        None => "The diff for this pull request is provided on stdin.".to_string(),
    };

    formatdoc!(
        r####"Review the following pull request changes.

        **Pull request:**
        - Title: {title}
        - Description: {body}
        - Author: {author}

        **Review focus:**
        {focus_text}

        {diff_section}

        Complete the following review tasks:
        1. **Overall assessment**: describe the risk and impact of the change
        2. **Findings**: list issues ordered by severity, with reasoning
        3. **Suggestions**: give actionable improvements
        4. **Strengths**: note implementations worth keeping

        Output requirements (follow strictly):
        - The final output must be a single JSON object with no surrounding text, commentary or code fences
        - `summary_markdown` holds the report above, written in markdown
        - `overall_severity` is one of: critical/high/medium/low/info
        - `inline_comments` holds at most 5 entries, each with an exact `path`, a `new_line` (added line) or `old_line` (removed line), a `comment`, and optionally `suggestion` and `severity`
        - When `suggestion` contains code it must use a markdown code block
        - Drop any finding you cannot anchor to a line in the diff

        JSON structure example:
        {{
          "summary_markdown": "### Overall assessment\n...",
          "overall_severity": "medium",
          "inline_comments": [
            {{
              "path": "src/main.rs",
              "new_line": 123,
              "old_line": null,
              "severity": "high",
              "comment": "Describe the problem and its impact",
              "suggestion": "Change to:\n```rust\nlet result = safe_function(user_input);\n```"
            }}
          ]
        }}"####,
        title = pr.title.as_str(),
        body = pr.body.as_deref().unwrap_or("N/A"),
        author = pr.author.as_deref().unwrap_or("N/A"),
    )
}

fn truncate_chars(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }

    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

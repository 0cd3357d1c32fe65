use crate::prompt::{build_review_prompt, MAX_EMBEDDED_DIFF_CHARS};
use crate::{FocusArea, PullRequestContext};

fn context() -> PullRequestContext {
    PullRequestContext {
        title: "feat: add retry logic".to_string(),
        body: Some("Retries transient failures".to_string()),
        author: Some("developer123".to_string()),
    }
}

#[test]
fn test_prompt_includes_pr_metadata_and_focus() {
    let prompt = build_review_prompt(&[FocusArea::Security], &context(), None);

    assert!(prompt.contains("feat: add retry logic"));
    assert!(prompt.contains("Retries transient failures"));
    assert!(prompt.contains("developer123"));
    assert!(prompt.contains("security vulnerabilities"));
    assert!(!prompt.contains("performance problems"));
}

#[test]
fn test_prompt_without_embedded_diff_points_to_stdin() {
    let prompt = build_review_prompt(&[FocusArea::Quality], &context(), None);

    assert!(prompt.contains("provided on stdin"));
    assert!(!prompt.contains("```diff"));
}

#[test]
fn test_prompt_embeds_diff_when_given() {
    let diff = "diff --git a/x b/x\n+added line\n";

    let prompt = build_review_prompt(&[FocusArea::Quality], &context(), Some(diff));

    assert!(prompt.contains("```diff"));
    assert!(prompt.contains("+added line"));
    assert!(!prompt.contains("(diff truncated)"));
}

#[test]
fn test_prompt_truncates_oversized_diff() {
    let diff = "x".repeat(MAX_EMBEDDED_DIFF_CHARS + 100);

    let prompt = build_review_prompt(&[FocusArea::Quality], &context(), Some(&diff));

    assert!(prompt.contains("(diff truncated)"));
}

#[test]
fn test_empty_focus_defaults_to_all_areas() {
    let prompt = build_review_prompt(&[], &context(), None);

    assert!(prompt.contains("code quality"));
    assert!(prompt.contains("security vulnerabilities"));
    assert!(prompt.contains("performance problems"));
    assert!(prompt.contains("logic errors"));
}

#[test]
fn test_missing_body_and_author_render_as_na() {
    let pr = PullRequestContext {
        title: "fix: bug".to_string(),
        body: None,
        author: None,
    };

    let prompt = build_review_prompt(&[FocusArea::Logic], &pr, None);

    assert!(prompt.contains("- Description: N/A"));
    assert!(prompt.contains("- Author: N/A"));
}

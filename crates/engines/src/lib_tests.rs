use crate::{
    redact_secrets, EngineConfig, FocusArea, InlineComment, ReviewResult, Severity, UsageMetadata,
};

#[test]
fn test_focus_area_parses_known_values() {
    assert_eq!("quality".parse::<FocusArea>(), Ok(FocusArea::Quality));
    assert_eq!("Security".parse::<FocusArea>(), Ok(FocusArea::Security));
    assert_eq!(" performance ".parse::<FocusArea>(), Ok(FocusArea::Performance));
    assert_eq!("LOGIC".parse::<FocusArea>(), Ok(FocusArea::Logic));
    assert!("style".parse::<FocusArea>().is_err());
}

#[test]
fn test_severity_ordering() {
    assert!(Severity::Critical > Severity::High);
    assert!(Severity::High > Severity::Medium);
    assert!(Severity::Medium > Severity::Low);
    assert!(Severity::Low > Severity::Info);
}

#[test]
fn test_severity_parses_aliases() {
    assert_eq!("blocker".parse::<Severity>(), Ok(Severity::Critical));
    assert_eq!("major".parse::<Severity>(), Ok(Severity::High));
    assert_eq!("moderate".parse::<Severity>(), Ok(Severity::Medium));
    assert_eq!("minor".parse::<Severity>(), Ok(Severity::Low));
    assert!("unknown".parse::<Severity>().is_err());
}

#[test]
fn test_engine_config_debug_redacts_api_key() {
    let config = EngineConfig {
        base_url: Some("https://api.example.com".to_string()),
        api_key: Some("sk-very-secret".to_string()),
        model: Some("claude-sonnet".to_string()),
    };

    let debug = format!("{:?}", config);

    assert!(!debug.contains("sk-very-secret"));
    assert!(debug.contains("[REDACTED]"));
    assert!(debug.contains("https://api.example.com"));
}

#[test]
fn test_inline_comment_body_fences_bare_suggestion() {
    let comment = InlineComment {
        path: "src/main.rs".to_string(),
        new_line: Some(10),
        old_line: None,
        severity: Some(Severity::High),
        comment: "Unchecked index can panic".to_string(),
        suggestion: Some("let value = items.get(i)?;".to_string()),
    };

    let body = comment.build_body();

    assert!(body.contains("**Severity**: high"));
    assert!(body.contains("Unchecked index can panic"));
    assert!(body.contains("```\nlet value = items.get(i)?;\n```"));
}

#[test]
fn test_inline_comment_body_keeps_existing_fence() {
    let comment = InlineComment {
        path: "src/main.rs".to_string(),
        new_line: Some(10),
        old_line: None,
        severity: None,
        comment: "Use the checked variant".to_string(),
        suggestion: Some("```rust\nlet value = items.get(i)?;\n```".to_string()),
    };

    let body = comment.build_body();

    assert_eq!(body.matches("```").count(), 2);
}

#[test]
fn test_failure_result_redacts_message() {
    let result = ReviewResult::failure("claude_code", "request failed, token=sk-secret-123");

    assert!(!result.success);
    let message = result.error_message.unwrap();
    assert!(message.contains("token=[REDACTED]"));
    assert!(!message.contains("sk-secret-123"));
}

#[test]
fn test_indicates_failure_on_unsuccessful_result() {
    let result = ReviewResult::failure("claude_code", "boom");

    assert!(result.indicates_failure());
}

#[test]
fn test_indicates_failure_on_high_severity() {
    let result = ReviewResult {
        provider: "claude_code".to_string(),
        summary: "Found issues".to_string(),
        inline_comments: Vec::new(),
        overall_severity: Some(Severity::High),
        model: None,
        usage: UsageMetadata::default(),
        success: true,
        error_message: None,
    };

    assert!(result.indicates_failure());
}

#[test]
fn test_indicates_failure_on_critical_inline_comment() {
    let result = ReviewResult {
        provider: "claude_code".to_string(),
        summary: "Mostly fine".to_string(),
        inline_comments: vec![InlineComment {
            path: "src/auth.rs".to_string(),
            new_line: Some(5),
            old_line: None,
            severity: Some(Severity::Critical),
            comment: "SQL injection".to_string(),
            suggestion: None,
        }],
        overall_severity: Some(Severity::Low),
        model: None,
        usage: UsageMetadata::default(),
        success: true,
        error_message: None,
    };

    assert!(result.indicates_failure());
}

#[test]
fn test_low_severity_result_does_not_indicate_failure() {
    let result = ReviewResult {
        provider: "claude_code".to_string(),
        summary: "Looks good".to_string(),
        inline_comments: Vec::new(),
        overall_severity: Some(Severity::Low),
        model: None,
        usage: UsageMetadata::default(),
        success: true,
        error_message: None,
    };

    assert!(!result.indicates_failure());
}

#[test]
fn test_redact_secrets_blanks_assignments() {
    let redacted = redact_secrets("call failed: key=abc123, retry later");

    assert!(!redacted.contains("abc123"));
    assert!(redacted.contains("[REDACTED]"));
}

#[test]
fn test_redact_secrets_truncates_long_messages() {
    let long = "x".repeat(2000);

    let redacted = redact_secrets(&long);

    assert!(redacted.len() <= 510);
    assert!(redacted.ends_with("..."));
}

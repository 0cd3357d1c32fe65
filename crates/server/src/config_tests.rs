use std::io::Write;

use crate::config::load_config;
use crate::errors::ServerError;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn clear_env_overrides() {
    std::env::remove_var("REVIEW_WARDEN_GITEA_TOKEN");
    std::env::remove_var("REVIEW_WARDEN_WEBHOOK_SECRET");
    std::env::remove_var("REVIEW_WARDEN_API_KEY");
}

#[test]
fn test_minimal_config_gets_defaults() {
    clear_env_overrides();
    let file = write_config(
        r#"
        [gitea]
        base_url = "https://git.example.com"
        token = "access-token"
        "#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.webhook.secret, None);
    assert_eq!(config.review.engine.engine, "claude_code");
    assert_eq!(config.review.max_concurrent_jobs, 4);
    assert_eq!(config.review.clone_timeout_secs, 300);
    assert_eq!(config.review.engine_timeout_secs, 900);
    assert_eq!(config.review.claude_cli_path, "claude");
    assert_eq!(config.review.codex_cli_path, "codex");
    assert!(config.review.shallow_clone);
    assert!(config.repositories.is_empty());
}

#[test]
fn test_full_config_parses() {
    clear_env_overrides();
    let file = write_config(
        r#"
        [server]
        host = "127.0.0.1"
        port = 9001

        [gitea]
        base_url = "https://git.example.com"
        token = "access-token"
        bot_username = "review-bot"

        [webhook]
        secret = "global-secret"

        [review]
        work_dir = "/var/lib/review-warden"
        max_concurrent_jobs = 2

        [review.engine]
        engine = "codex_cli"
        model = "gpt-5-codex"

        [repositories."octocat/widgets"]
        webhook_secret = "repo-secret"
        engine = "claude_code"
        api_key = "repo-key"
        "#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.server.port, 9001);
    assert_eq!(config.gitea.bot_username.as_deref(), Some("review-bot"));
    assert_eq!(config.review.engine.engine, "codex_cli");
    assert_eq!(config.review.engine.model.as_deref(), Some("gpt-5-codex"));

    let repo = &config.repositories["octocat/widgets"];
    assert_eq!(repo.webhook_secret.as_deref(), Some("repo-secret"));
    assert_eq!(repo.engine.engine.as_deref(), Some("claude_code"));
    assert_eq!(repo.engine.api_key.as_deref(), Some("repo-key"));
}

#[test]
fn test_webhook_secret_resolution_prefers_repository() {
    clear_env_overrides();
    let file = write_config(
        r#"
        [gitea]
        base_url = "https://git.example.com"
        token = "access-token"

        [webhook]
        secret = "global-secret"

        [repositories."octocat/widgets"]
        webhook_secret = "repo-secret"
        "#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(
        config.webhook_secret_for("octocat/widgets"),
        Some("repo-secret")
    );
    assert_eq!(config.webhook_secret_for("other/repo"), Some("global-secret"));
}

#[test]
fn test_missing_token_is_a_config_error() {
    clear_env_overrides();
    let file = write_config(
        r#"
        [gitea]
        base_url = "https://git.example.com"
        "#,
    );

    let result = load_config(file.path());

    assert!(matches!(result, Err(ServerError::ConfigError(_))));
}

#[test]
fn test_missing_file_is_a_config_error() {
    clear_env_overrides();

    let result = load_config("/definitely/not/a/config.toml");

    assert!(matches!(result, Err(ServerError::ConfigError(_))));
}

#[test]
fn test_zero_concurrency_is_rejected() {
    clear_env_overrides();
    let file = write_config(
        r#"
        [gitea]
        base_url = "https://git.example.com"
        token = "access-token"

        [review]
        max_concurrent_jobs = 0
        "#,
    );

    let result = load_config(file.path());

    assert!(matches!(result, Err(ServerError::ConfigError(_))));
}

#[test]
fn test_debug_output_redacts_secrets() {
    clear_env_overrides();
    let file = write_config(
        r#"
        [gitea]
        base_url = "https://git.example.com"
        token = "access-token"

        [webhook]
        secret = "global-secret"

        [repositories."octocat/widgets"]
        webhook_secret = "repo-secret"
        "#,
    );

    let config = load_config(file.path()).unwrap();
    let debug = format!("{:?}", config);

    assert!(!debug.contains("access-token"));
    assert!(!debug.contains("global-secret"));
    assert!(!debug.contains("repo-secret"));
}

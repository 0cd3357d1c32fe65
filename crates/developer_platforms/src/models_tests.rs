use crate::models::{CommitStatusState, PullRequest, Repository};

#[test]
fn test_pull_request_deserializes_gitea_payload() {
    let payload = r#"{
        "number": 12,
        "title": "feat: add retry logic",
        "body": null,
        "user": { "id": 7, "login": "developer123" },
        "head": { "ref": "feature/retry", "sha": "aaa111" },
        "base": { "ref": "main", "sha": "bbb222" }
    }"#;

    let pr: PullRequest = serde_json::from_str(payload).unwrap();

    assert_eq!(pr.number, 12);
    assert_eq!(pr.body, None);
    assert_eq!(pr.head.ref_name, "feature/retry");
    assert_eq!(pr.base.sha, "bbb222");
}

#[test]
fn test_user_accepts_username_alias() {
    // Gitea uses "username" in some payloads and "login" in others.
    let payload = r#"{ "number": 3, "title": "t", "user": { "id": 1, "username": "octocat" } }"#;

    let pr: PullRequest = serde_json::from_str(payload).unwrap();

    assert_eq!(pr.author.unwrap().login, "octocat");
}

#[test]
fn test_repository_owner_login_falls_back_to_full_name() {
    let repo = Repository {
        name: "widgets".to_string(),
        full_name: "octocat/widgets".to_string(),
        owner: None,
    };

    assert_eq!(repo.owner_login(), Some("octocat"));
}

#[test]
fn test_commit_status_state_wire_values() {
    assert_eq!(CommitStatusState::Pending.as_str(), "pending");
    assert_eq!(CommitStatusState::Success.as_str(), "success");
    assert_eq!(CommitStatusState::Failure.as_str(), "failure");
    assert_eq!(CommitStatusState::Error.as_str(), "error");
}

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use review_warden_core::config::GlobalEngineConfig;
use review_warden_core::session::InMemorySessionStore;
use review_warden_core::trigger::{FeedbackChannel, ReviewTrigger, TriggerKind};
use review_warden_core::workspace::WorkspaceManager;
use review_warden_core::ReviewWarden;
use review_warden_developer_platforms::errors::Error;
use review_warden_developer_platforms::models::{
    CommitStatusState, PullRequest, ReviewComment, Webhook,
};
use review_warden_developer_platforms::HostingProvider;
use review_warden_engines::registry::EngineRegistry;
use review_warden_engines::FocusArea;

use crate::jobs::JobRunner;

// Provider whose reviews complete instantly: combined with an empty engine
// registry, every run finishes as soon as it starts.
#[derive(Debug, Default)]
struct NullHostingProvider;

#[async_trait]
impl HostingProvider for NullHostingProvider {
    async fn get_pull_request(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        pr_number: u64,
    ) -> Result<PullRequest, Error> {
        Ok(PullRequest {
            number: pr_number,
            title: "feat: quick change".to_string(),
            body: None,
            author: None,
            head: Default::default(),
            base: Default::default(),
        })
    }

    async fn get_pull_request_diff(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        _pr_number: u64,
    ) -> Result<String, Error> {
        Ok(String::new())
    }

    async fn list_pull_requests(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        _state: &str,
    ) -> Result<Vec<PullRequest>, Error> {
        Ok(Vec::new())
    }

    async fn post_comment(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        _pr_number: u64,
        _body: &str,
    ) -> Result<u64, Error> {
        Ok(1)
    }

    async fn update_comment(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        _comment_id: u64,
        _body: &str,
    ) -> Result<(), Error> {
        Ok(())
    }

    async fn create_review(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        _pr_number: u64,
        _body: &str,
        _commit_sha: &str,
        _comments: &[ReviewComment],
    ) -> Result<(), Error> {
        Ok(())
    }

    async fn set_commit_status(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        _sha: &str,
        _state: CommitStatusState,
        _description: &str,
    ) -> Result<(), Error> {
        Ok(())
    }

    async fn list_webhooks(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
    ) -> Result<Vec<Webhook>, Error> {
        Ok(Vec::new())
    }

    async fn create_webhook(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        _target_url: &str,
        _secret: Option<&str>,
        _events: &[String],
    ) -> Result<Webhook, Error> {
        Err(Error::InvalidResponse("not supported in tests".to_string()))
    }

    async fn delete_webhook(
        &self,
        _repo_owner: &str,
        _repo_name: &str,
        _hook_id: u64,
    ) -> Result<(), Error> {
        Ok(())
    }

    fn clone_url(&self, repo_owner: &str, repo_name: &str) -> String {
        format!("file:///nonexistent/{}/{}.git", repo_owner, repo_name)
    }
}

fn test_warden(
    sessions: Arc<InMemorySessionStore>,
) -> Arc<ReviewWarden<NullHostingProvider>> {
    let workspaces = WorkspaceManager::new(tempfile::tempdir().unwrap().keep()).unwrap();
    Arc::new(
        ReviewWarden::new(
            NullHostingProvider,
            EngineRegistry::new(),
            workspaces,
            sessions,
            GlobalEngineConfig::default(),
        )
        .with_diff_only_analysis(),
    )
}

fn test_trigger(pr_number: u64) -> ReviewTrigger {
    ReviewTrigger {
        repo_owner: "octocat".to_string(),
        repo_name: "widgets".to_string(),
        pr_number,
        kind: TriggerKind::Automatic,
        requested_by: None,
        channels: vec![FeedbackChannel::Comment],
        focus: FocusArea::ALL.to_vec(),
        engine_override: None,
    }
}

async fn wait_for_sessions(store: &InMemorySessionStore, expected: usize) {
    for _ in 0..200 {
        if store.len() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "expected {} sessions, found {} after waiting",
        expected,
        store.len()
    );
}

#[tokio::test]
async fn test_scheduled_job_runs_to_completion() {
    let sessions = Arc::new(InMemorySessionStore::new());
    let runner = JobRunner::start(test_warden(sessions.clone()), 2);

    runner.schedule(test_trigger(1)).unwrap();

    wait_for_sessions(&sessions, 1).await;
    let session = sessions.all().pop().unwrap();
    assert!(session.is_completed());

    runner.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_drains_in_flight_jobs() {
    let sessions = Arc::new(InMemorySessionStore::new());
    let runner = JobRunner::start(test_warden(sessions.clone()), 2);

    runner.schedule(test_trigger(1)).unwrap();
    runner.schedule(test_trigger(2)).unwrap();
    runner.schedule(test_trigger(3)).unwrap();

    runner.shutdown().await;

    // Every accepted trigger completed before shutdown returned.
    assert_eq!(sessions.len(), 3);
    assert!(sessions.all().iter().all(|session| session.is_completed()));
}

#[tokio::test]
async fn test_jobs_for_different_pull_requests_complete_independently() {
    let sessions = Arc::new(InMemorySessionStore::new());
    let runner = JobRunner::start(test_warden(sessions.clone()), 4);

    for pr_number in 1..=4 {
        runner.schedule(test_trigger(pr_number)).unwrap();
    }

    wait_for_sessions(&sessions, 4).await;

    let mut numbers: Vec<u64> = sessions.all().iter().map(|s| s.pr_number).collect();
    numbers.sort_unstable();
    assert_eq!(numbers, vec![1, 2, 3, 4]);

    runner.shutdown().await;
}

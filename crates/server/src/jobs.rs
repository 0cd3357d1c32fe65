//! Background execution of review jobs.
//!
//! The webhook handler answers the sender immediately; the actual review
//! work runs here. A bounded queue feeds a dispatcher task that spawns one
//! job per trigger, capped by a concurrency semaphore. Job panics and
//! failures are contained and logged; the runner itself never dies. On
//! shutdown the queue closes and the dispatcher drains the in-flight jobs
//! before exiting, so cleanup guarantees inside each run still hold.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

use review_warden_core::trigger::ReviewTrigger;
use review_warden_core::ReviewWarden;
use review_warden_developer_platforms::HostingProvider;

use crate::errors::ScheduleError;

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;

/// Capacity of the pending-trigger queue.
const QUEUE_CAPACITY: usize = 64;

/// Hands triggers to a background dispatcher and bounds how many run at
/// once.
#[derive(Debug)]
pub struct JobRunner {
    tx: mpsc::Sender<ReviewTrigger>,
    dispatcher: JoinHandle<()>,
}

impl JobRunner {
    /// Starts the dispatcher.
    ///
    /// # Arguments
    ///
    /// * `warden` - The orchestrator shared by all jobs
    /// * `max_concurrent` - Maximum number of jobs running at once
    pub fn start<P>(warden: Arc<ReviewWarden<P>>, max_concurrent: usize) -> Self
    where
        P: HostingProvider + Send + Sync + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<ReviewTrigger>(QUEUE_CAPACITY);
        let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));

        let dispatcher = tokio::spawn(async move {
            let mut jobs = JoinSet::new();

            while let Some(trigger) = rx.recv().await {
                // Reap whatever already finished so the set stays small.
                while let Some(result) = jobs.try_join_next() {
                    if let Err(e) = result {
                        error!(error = %e, "Review job panicked");
                    }
                }

                let Ok(permit) = semaphore.clone().acquire_owned().await else {
                    break;
                };

                let warden = warden.clone();
                jobs.spawn(async move {
                    let repository = trigger.repository();
                    let pr_number = trigger.pr_number;
                    debug!(repository, pull_request = pr_number, "Review job starting");

                    let session = warden.run(trigger).await;

                    info!(
                        repository,
                        pull_request = pr_number,
                        session_id = session.id.as_str(),
                        success = session.success.unwrap_or(false),
                        "Review job finished"
                    );
                    drop(permit);
                });
            }

            // Queue closed: drain the in-flight jobs before exiting.
            while let Some(result) = jobs.join_next().await {
                if let Err(e) = result {
                    error!(error = %e, "Review job panicked");
                }
            }
        });

        Self { tx, dispatcher }
    }

    /// Enqueues a trigger for background execution.
    ///
    /// Never blocks the caller: a full queue is reported as an error
    /// instead.
    pub fn schedule(&self, trigger: ReviewTrigger) -> Result<(), ScheduleError> {
        self.tx.try_send(trigger).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ScheduleError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => ScheduleError::ShuttingDown,
        })
    }

    /// Stops accepting triggers and waits for in-flight jobs to finish.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.dispatcher.await {
            error!(error = %e, "Job dispatcher panicked");
        }
    }
}

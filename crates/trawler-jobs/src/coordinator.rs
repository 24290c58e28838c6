//! Job lifecycle coordination.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use trawler_config::SourceRegistry;
use trawler_events::EventBus;
use trawler_types::{ContentType, CrawlError, Job, JobEvent, JobStatus};

struct JobEntry {
    job: Mutex<Job>,
    token: CancellationToken,
}

/// Owns every job's lifecycle state and cancellation token.
///
/// All mutation flows through coordinator entry points: each entry holds
/// one mutex guarding the whole job record, status reads return a full
/// snapshot, and events are published while the entry lock is held so
/// that events for one job are totally ordered.
pub struct JobCoordinator {
    sources: Arc<SourceRegistry>,
    bus: Arc<EventBus>,
    jobs: DashMap<String, Arc<JobEntry>>,
}

impl JobCoordinator {
    pub fn new(sources: Arc<SourceRegistry>, bus: Arc<EventBus>) -> Self {
        Self {
            sources,
            bus,
            jobs: DashMap::new(),
        }
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Create a job for a source and move it straight to running.
    ///
    /// Publishes `job_started` and returns the running snapshot. Fails
    /// with a configuration error when the source name is unknown.
    pub async fn start(
        &self,
        source_name: &str,
        content_type: ContentType,
    ) -> Result<Job, CrawlError> {
        if self.sources.find_by_name(source_name).is_none() {
            return Err(CrawlError::configuration(format!(
                "unknown source '{}'",
                source_name
            )));
        }

        let entry = Arc::new(JobEntry {
            job: Mutex::new(Job::new(source_name, content_type)),
            token: CancellationToken::new(),
        });

        let snapshot = {
            let mut job = entry.job.lock().await;
            self.jobs.insert(job.id.clone(), entry.clone());
            job.mark_running()?;
            let snapshot = job.clone();
            self.publish(JobEvent::started(snapshot.clone())).await;
            snapshot
        };

        info!(job_id = %snapshot.id, source = %source_name, "Job started");
        Ok(snapshot)
    }

    /// Cancel a job's token and mark it stopped.
    ///
    /// Publishes `job_completed` carrying the final progress snapshot.
    pub async fn stop(&self, job_id: &str) -> Result<Job, CrawlError> {
        let entry = self.entry(job_id)?;
        entry.token.cancel();

        let mut job = entry.job.lock().await;
        job.stop()?;
        let snapshot = job.clone();
        self.publish(JobEvent::completed(snapshot.clone())).await;
        info!(job_id = %job_id, progress = snapshot.status.progress, "Job stopped");
        Ok(snapshot)
    }

    /// Atomic status snapshot for one job.
    pub async fn status(&self, job_id: &str) -> Result<JobStatus, CrawlError> {
        let entry = self.entry(job_id)?;
        let job = entry.job.lock().await;
        Ok(job.status.clone())
    }

    /// Full snapshot of one job.
    pub async fn job(&self, job_id: &str) -> Result<Job, CrawlError> {
        let entry = self.entry(job_id)?;
        let job = entry.job.lock().await;
        Ok(job.clone())
    }

    /// Snapshots of every tracked job.
    pub async fn jobs(&self) -> Vec<Job> {
        let entries: Vec<Arc<JobEntry>> =
            self.jobs.iter().map(|entry| entry.value().clone()).collect();
        let mut snapshots = Vec::with_capacity(entries.len());
        for entry in entries {
            snapshots.push(entry.job.lock().await.clone());
        }
        snapshots
    }

    /// The job's cancellation token.
    pub fn token(&self, job_id: &str) -> Result<CancellationToken, CrawlError> {
        Ok(self.entry(job_id)?.token.clone())
    }

    /// Apply a progress sample with a monotonic clamp to `[last, 100]`.
    ///
    /// `job_progress` is published only when progress strictly increased.
    pub async fn report_progress(&self, job_id: &str, percent: u8) -> Result<(), CrawlError> {
        let entry = self.entry(job_id)?;
        let mut job = entry.job.lock().await;
        if job.set_progress(percent) {
            let snapshot = job.clone();
            let progress = snapshot.status.progress;
            self.publish(JobEvent::progress(snapshot, progress)).await;
        }
        Ok(())
    }

    /// Move a job to `failed` and publish `job_failed`.
    pub async fn fail(&self, job_id: &str, error: impl Into<String>) -> Result<Job, CrawlError> {
        let entry = self.entry(job_id)?;
        let message = error.into();

        let mut job = entry.job.lock().await;
        job.fail(message.clone())?;
        let snapshot = job.clone();
        self.publish(JobEvent::failed(snapshot.clone(), message.clone()))
            .await;
        warn!(job_id = %job_id, error = %message, "Job failed");
        Ok(snapshot)
    }

    /// Move a job to `completed` and publish `job_completed`.
    pub async fn complete(&self, job_id: &str) -> Result<Job, CrawlError> {
        let entry = self.entry(job_id)?;

        let mut job = entry.job.lock().await;
        job.complete()?;
        let snapshot = job.clone();
        self.publish(JobEvent::completed(snapshot.clone())).await;
        info!(job_id = %job_id, "Job completed");
        Ok(snapshot)
    }

    fn entry(&self, job_id: &str) -> Result<Arc<JobEntry>, CrawlError> {
        self.jobs
            .get(job_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| CrawlError::validation(format!("job '{}' not found", job_id)))
    }

    /// A misbehaving subscriber must not wedge a job, so publish errors
    /// are logged and swallowed here.
    async fn publish(&self, event: JobEvent) {
        if let Err(err) = self.bus.publish(&event).await {
            warn!(kind = %event.kind, error = %err, "Event handler error during publish");
        }
    }
}

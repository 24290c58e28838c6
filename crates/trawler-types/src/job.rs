//! Job lifecycle model.

use crate::content::ContentType;
use crate::errors::CrawlError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle state of a job.
///
/// `Completed`, `Failed`, and `Stopped` are terminal and absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
    Stopped,
}

impl JobState {
    /// Whether the state admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Stopped
        )
    }

    /// Whether moving to `next` is a legal transition.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Pending, JobState::Running)
                | (JobState::Running, JobState::Completed)
                | (JobState::Running, JobState::Failed)
                | (JobState::Running, JobState::Stopped)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Stopped => "stopped",
        };
        f.write_str(label)
    }
}

/// Point-in-time status of a job, read and written as one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub state: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Percent complete in `[0, 100]`, non-decreasing while running.
    pub progress: u8,
}

impl Default for JobStatus {
    fn default() -> Self {
        Self {
            state: JobState::Pending,
            start_time: None,
            end_time: None,
            error_message: None,
            progress: 0,
        }
    }
}

/// One invocation of the crawler against one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Opaque job identifier, unique per process.
    pub id: String,
    /// Name of the source this job crawls.
    pub source_name: String,
    /// Content type the job was started for.
    pub content_type: ContentType,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a pending job for a source.
    pub fn new(source_name: impl Into<String>, content_type: ContentType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            source_name: source_name.into(),
            content_type,
            status: JobStatus::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Current state shorthand.
    pub fn state(&self) -> JobState {
        self.status.state
    }

    fn transition(&mut self, next: JobState) -> Result<(), CrawlError> {
        if !self.status.state.can_transition_to(next) {
            return Err(CrawlError::invalid_transition(self.status.state, next));
        }
        self.status.state = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Move `pending → running` and record the start time.
    pub fn mark_running(&mut self) -> Result<(), CrawlError> {
        self.transition(JobState::Running)?;
        self.status.start_time = Some(Utc::now());
        Ok(())
    }

    /// Move `running → completed`, pinning progress to 100.
    pub fn complete(&mut self) -> Result<(), CrawlError> {
        self.transition(JobState::Completed)?;
        self.status.progress = 100;
        self.status.end_time = Some(Utc::now());
        Ok(())
    }

    /// Move `running → failed` with a human-readable error message.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), CrawlError> {
        self.transition(JobState::Failed)?;
        self.status.error_message = Some(error.into());
        self.status.end_time = Some(Utc::now());
        Ok(())
    }

    /// Move `running → stopped`, preserving the last known progress.
    pub fn stop(&mut self) -> Result<(), CrawlError> {
        self.transition(JobState::Stopped)?;
        self.status.end_time = Some(Utc::now());
        Ok(())
    }

    /// Clamp `percent` into `[current, 100]` and apply it.
    ///
    /// Returns `true` only when progress strictly increased, which is the
    /// condition under which a progress event should be published.
    pub fn set_progress(&mut self, percent: u8) -> bool {
        if self.status.state != JobState::Running {
            return false;
        }
        let clamped = percent.min(100).max(self.status.progress);
        if clamped > self.status.progress {
            self.status.progress = clamped;
            self.updated_at = Utc::now();
            true
        } else {
            false
        }
    }
}

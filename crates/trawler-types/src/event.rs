//! Job lifecycle events.

use crate::job::Job;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a job event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    JobStarted,
    JobCompleted,
    JobFailed,
    JobProgress,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventKind::JobStarted => "job_started",
            EventKind::JobCompleted => "job_completed",
            EventKind::JobFailed => "job_failed",
            EventKind::JobProgress => "job_progress",
        };
        f.write_str(label)
    }
}

/// A job lifecycle or progress event.
///
/// Serializes with the wire field names `type`, `job`, `error`, `progress`;
/// `error` is present only on failures and `progress` only on progress
/// events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub job: Job,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

impl JobEvent {
    pub fn started(job: Job) -> Self {
        Self {
            kind: EventKind::JobStarted,
            job,
            error: None,
            progress: None,
        }
    }

    pub fn completed(job: Job) -> Self {
        Self {
            kind: EventKind::JobCompleted,
            job,
            error: None,
            progress: None,
        }
    }

    pub fn failed(job: Job, error: impl Into<String>) -> Self {
        Self {
            kind: EventKind::JobFailed,
            job,
            error: Some(error.into()),
            progress: None,
        }
    }

    pub fn progress(job: Job, percent: u8) -> Self {
        Self {
            kind: EventKind::JobProgress,
            job,
            error: None,
            progress: Some(percent.min(100)),
        }
    }
}

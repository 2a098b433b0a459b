//! Render queue jobs.
//!
//! A render job is created by submitting a composed hook + narration + CTA
//! video. Once submitted it lives on the server and is only observed
//! through queue polls.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned render job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderJobId(pub String);

impl RenderJobId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RenderJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RenderJobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Render job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderStatus {
    /// Waiting for the render worker
    #[default]
    Queued,
    /// Being rendered
    Running,
    /// Output written
    Done,
    /// Render failed, see `error`
    Failed,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::Queued => "queued",
            RenderStatus::Running => "running",
            RenderStatus::Done => "done",
            RenderStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, RenderStatus::Done | RenderStatus::Failed)
    }
}

impl fmt::Display for RenderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A render job as reported by the queue endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderJob {
    pub id: RenderJobId,
    pub output_name: String,
    pub status: RenderStatus,
    /// Creation time as sent by the server (ISO-8601, timezone optional)
    #[serde(default)]
    pub created_at: String,
    /// Failure reason, only present when `status == failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RenderJob {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Failure reason, if the job failed.
    pub fn failure(&self) -> Option<&str> {
        match self.status {
            RenderStatus::Failed => Some(self.error.as_deref().unwrap_or("render failed")),
            _ => None,
        }
    }

    /// Parse `created_at`. Naive timestamps are taken as UTC.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(&self.created_at) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.created_at, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

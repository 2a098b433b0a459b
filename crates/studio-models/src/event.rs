//! Pipeline push events.
//!
//! The backend publishes one JSON object per event on the server-sent
//! event stream:
//!
//! ```json
//! {"job_id": "j1", "step": "audio", "status": "running", "progress": 10, "msg": "Extracting audio..."}
//! ```
//!
//! A `step` of `"error"` marks a failure of the whole run rather than of a
//! single stage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{JobId, PipelineStage, StageStatus};

/// Wire step name for a pipeline-wide failure.
const PIPELINE_FAILURE_STEP: &str = "error";

/// Status carried by a push event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Running,
    Done,
    Error,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Running => "running",
            EventStatus::Done => "done",
            EventStatus::Error => "error",
        }
    }

    /// The stage status this event moves a stage into.
    pub fn stage_status(&self) -> StageStatus {
        match self {
            EventStatus::Running => StageStatus::Running,
            EventStatus::Done => StageStatus::Done,
            EventStatus::Error => StageStatus::Error,
        }
    }
}

/// Errors raised while decoding a push event payload.
#[derive(Debug, Error)]
pub enum EventParseError {
    #[error("invalid event JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown pipeline step: {0}")]
    UnknownStep(String),

    #[error("empty job id")]
    EmptyJobId,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireEvent {
    job_id: String,
    step: String,
    status: EventStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    progress: Option<i64>,
    #[serde(default)]
    msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    seq: Option<u64>,
}

/// A decoded pipeline event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineEvent {
    /// Job the event belongs to
    pub job_id: JobId,
    /// Stage the event reports on; `None` for a pipeline-wide failure
    pub stage: Option<PipelineStage>,
    /// Reported status
    pub status: EventStatus,
    /// Overall progress (0-100) if the event carried one
    pub progress: Option<u8>,
    /// Human-readable description
    pub message: String,
    /// Optional per-job sequence number
    pub seq: Option<u64>,
}

impl PipelineEvent {
    /// Create a stage event.
    pub fn stage(
        job_id: impl Into<String>,
        stage: PipelineStage,
        status: EventStatus,
        progress: u8,
        message: impl Into<String>,
    ) -> Self {
        Self {
            job_id: JobId::from_string(job_id),
            stage: Some(stage),
            status,
            progress: Some(progress.min(100)),
            message: message.into(),
            seq: None,
        }
    }

    /// Create a pipeline-wide failure event.
    pub fn pipeline_failure(job_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            job_id: JobId::from_string(job_id),
            stage: None,
            status: EventStatus::Error,
            progress: None,
            message: message.into(),
            seq: None,
        }
    }

    /// Attach a sequence number.
    pub fn with_seq(mut self, seq: u64) -> Self {
        self.seq = Some(seq);
        self
    }

    /// Decode an event from its JSON payload.
    pub fn parse(payload: &str) -> Result<Self, EventParseError> {
        let wire: WireEvent = serde_json::from_str(payload)?;

        if wire.job_id.trim().is_empty() {
            return Err(EventParseError::EmptyJobId);
        }

        let stage = if wire.step == PIPELINE_FAILURE_STEP {
            None
        } else {
            Some(
                PipelineStage::parse(&wire.step)
                    .ok_or_else(|| EventParseError::UnknownStep(wire.step.clone()))?,
            )
        };

        Ok(Self {
            job_id: JobId(wire.job_id),
            stage,
            status: wire.status,
            progress: wire.progress.map(|p| p.clamp(0, 100) as u8),
            message: wire.msg,
            seq: wire.seq,
        })
    }

    /// Encode the event in its wire form.
    pub fn to_json(&self) -> String {
        let wire = WireEvent {
            job_id: self.job_id.0.clone(),
            step: self
                .stage
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| PIPELINE_FAILURE_STEP.to_string()),
            status: self.status,
            progress: self.progress.map(i64::from),
            msg: self.message.clone(),
            seq: self.seq,
        };
        serde_json::to_string(&wire).unwrap_or_default()
    }

    /// True for `render:done`, the event that completes a job.
    pub fn is_job_completion(&self) -> bool {
        self.stage == Some(PipelineStage::Render) && self.status == EventStatus::Done
    }

    /// True for a failure of the whole run.
    pub fn is_pipeline_failure(&self) -> bool {
        self.stage.is_none() && self.status == EventStatus::Error
    }
}

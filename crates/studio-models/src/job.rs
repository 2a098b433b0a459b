//! Pipeline job identity and per-stage status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier the backend assigns to an ingestion run when the upload completes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Backend pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Audio extraction from the uploaded video
    Audio,
    /// Speech-to-text
    Transcribe,
    /// Clip candidate detection
    Detect,
    /// Rendering detected candidates into clips
    Render,
}

impl PipelineStage {
    /// All stages in execution order.
    pub const ALL: [PipelineStage; 4] = [
        PipelineStage::Audio,
        PipelineStage::Transcribe,
        PipelineStage::Detect,
        PipelineStage::Render,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Audio => "audio",
            PipelineStage::Transcribe => "transcribe",
            PipelineStage::Detect => "detect",
            PipelineStage::Render => "render",
        }
    }

    /// Position of the stage in [`PipelineStage::ALL`].
    pub fn index(&self) -> usize {
        match self {
            PipelineStage::Audio => 0,
            PipelineStage::Transcribe => 1,
            PipelineStage::Detect => 2,
            PipelineStage::Render => 3,
        }
    }

    /// Parse a wire step name. Unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "audio" => Some(PipelineStage::Audio),
            "transcribe" => Some(PipelineStage::Transcribe),
            "detect" => Some(PipelineStage::Detect),
            "render" => Some(PipelineStage::Render),
            _ => None,
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a single pipeline stage as tracked by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// No event seen for this stage yet
    #[default]
    Pending,
    /// Stage is running on the backend
    Running,
    /// Stage finished successfully
    Done,
    /// Stage reported a failure
    Error,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Pending => "pending",
            StageStatus::Running => "running",
            StageStatus::Done => "done",
            StageStatus::Error => "error",
        }
    }

    /// Terminal statuses never change again within the same job.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StageStatus::Done | StageStatus::Error)
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_matches_index() {
        for (i, stage) in PipelineStage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), i);
            assert_eq!(PipelineStage::parse(stage.as_str()), Some(*stage));
        }
        assert_eq!(PipelineStage::parse("error"), None);
    }

    #[test]
    fn test_stage_status_terminal() {
        assert!(!StageStatus::Pending.is_terminal());
        assert!(!StageStatus::Running.is_terminal());
        assert!(StageStatus::Done.is_terminal());
        assert!(StageStatus::Error.is_terminal());
    }

    #[test]
    fn test_job_id_is_transparent() {
        let id = JobId::from("j1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"j1\"");
        assert_eq!(id.to_string(), "j1");
    }
}

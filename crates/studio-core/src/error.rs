//! Core error types.

use std::fmt;

use studio_models::{ClipId, JobId, RenderJobId, RenderStatus, VoiceProvider};
use thiserror::Error;

use crate::Generation;

/// A client-side precondition failed. Raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No video uploaded")]
    NoVideoUploaded,

    #[error("Select at least one clip type")]
    NoClipTypes,

    #[error("Clip count must be at least 1")]
    InvalidCount,

    #[error("Ad frequency must be at least 1")]
    InvalidAdFrequency,

    #[error("Select a hook clip first")]
    NoClipSelected,

    #[error("Body script is empty")]
    MissingScript,

    #[error("Output name is empty")]
    MissingOutputName,

    #[error("Voice {voice} is not offered by {provider}")]
    UnknownVoice {
        provider: VoiceProvider,
        voice: String,
    },

    #[error("Clip not in the current library: {0}")]
    UnknownClip(ClipId),

    #[error("Clips can only be selected for saving in a job library")]
    SelectionUnavailable,

    #[error("No clips selected")]
    EmptySelection,

    #[error("Pipeline {0} has not finished yet")]
    PipelineIncomplete(JobId),

    #[error("Render job not in the queue: {0}")]
    UnknownRenderJob(RenderJobId),

    #[error("Render job {id} is still {status}")]
    RemoveWhileActive { id: RenderJobId, status: RenderStatus },

    #[error("Published path is empty")]
    MissingPublishedPath,
}

impl ValidationError {
    /// Input field the error refers to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::NoVideoUploaded => Some("file"),
            ValidationError::NoClipTypes => Some("clip_types"),
            ValidationError::InvalidCount => Some("count"),
            ValidationError::InvalidAdFrequency => Some("ad_config.frequency"),
            ValidationError::NoClipSelected => Some("hook_clip_id"),
            ValidationError::MissingScript => Some("body_script"),
            ValidationError::MissingOutputName => Some("output_name"),
            ValidationError::UnknownVoice { .. } => Some("voice"),
            ValidationError::MissingPublishedPath => Some("path"),
            _ => None,
        }
    }
}

/// Every reason a composer submission was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn contains(&self, error: &ValidationError) -> bool {
        self.0.contains(error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

/// Why a push event was not applied. Never surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventRejection {
    #[error("no active pipeline")]
    NoActiveJob,

    #[error("event for job {received} while tracking {active}")]
    Stale { active: JobId, received: JobId },

    #[error("job {0} already finished")]
    AfterTerminal(JobId),

    #[error("out-of-order event seq {seq} (last applied {last})")]
    OutOfOrder { seq: u64, last: u64 },

    #[error("malformed event: {0}")]
    Malformed(String),
}

impl EventRejection {
    /// Short label for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            EventRejection::NoActiveJob => "no_active_job",
            EventRejection::Stale { .. } => "stale",
            EventRejection::AfterTerminal(_) => "after_terminal",
            EventRejection::OutOfOrder { .. } => "out_of_order",
            EventRejection::Malformed(_) => "malformed",
        }
    }
}

/// An asynchronous result arrived for state that has since been replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("stale {target} result (generation {received}, current {current})")]
pub struct StaleResult {
    pub target: &'static str,
    pub received: Generation,
    pub current: Generation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_field() {
        assert_eq!(ValidationError::MissingScript.to_string(), "Body script is empty");
        assert_eq!(ValidationError::MissingScript.field(), Some("body_script"));
        assert_eq!(ValidationError::MissingOutputName.field(), Some("output_name"));
    }

    #[test]
    fn test_validation_errors_display_joins() {
        let errors = ValidationErrors(vec![
            ValidationError::MissingScript,
            ValidationError::MissingOutputName,
        ]);
        assert_eq!(
            errors.to_string(),
            "Body script is empty; Output name is empty"
        );
        assert!(errors.contains(&ValidationError::MissingOutputName));
    }

    #[test]
    fn test_rejection_reasons() {
        let stale = EventRejection::Stale {
            active: JobId::from("j2"),
            received: JobId::from("j1"),
        };
        assert_eq!(stale.reason(), "stale");
        assert_eq!(EventRejection::Malformed("x".into()).reason(), "malformed");
    }
}

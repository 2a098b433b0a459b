//! Application error types.

use studio_client::ClientError;
use studio_core::{StaleResult, ValidationError, ValidationErrors};
use thiserror::Error;

pub type StudioResult<T> = Result<T, StudioError>;

/// Everything a studio operation can fail with. None of these is fatal:
/// each leaves the session in a state the user can retry from.
#[derive(Debug, Error)]
pub enum StudioError {
    /// The backend call failed; the operation can be retried.
    #[error(transparent)]
    Transport(#[from] ClientError),

    /// A precondition failed before any network call.
    #[error("{0}")]
    Validation(ValidationErrors),

    /// The result arrived after the state it targeted was replaced.
    #[error(transparent)]
    Stale(#[from] StaleResult),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ValidationError> for StudioError {
    fn from(error: ValidationError) -> Self {
        Self::Validation(error.into())
    }
}

impl From<ValidationErrors> for StudioError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl StudioError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, StudioError::Validation(_))
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, StudioError::Stale(_))
    }

    /// True when retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            StudioError::Transport(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// The validation failures, if this is a validation error.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            StudioError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_field() {
        let err = StudioError::from(ValidationError::MissingScript);
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Body script is empty");
    }

    #[test]
    fn test_transport_retryable() {
        let err = StudioError::from(ClientError::from_http_status(503, "down"));
        assert!(err.is_retryable());
        let err = StudioError::from(ClientError::from_http_status(404, "gone"));
        assert!(!err.is_retryable());
    }
}

//! Structured logging.
//!
//! [`PipelineLogger`] gives every log line about one pipeline job the same
//! `job_id` and `operation` fields. [`init_tracing`] sets up the subscriber
//! for the binary.

use studio_core::ActivePipeline;
use studio_models::JobId;
use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logger for one pipeline job.
#[derive(Debug, Clone)]
pub struct PipelineLogger {
    job_id: String,
    operation: String,
}

impl PipelineLogger {
    pub fn new(job_id: &JobId, operation: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Pipeline started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Pipeline progress: {}", message
        );
    }

    /// Log the tracker state after an applied event.
    pub fn log_state(&self, pipeline: &ActivePipeline) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            progress = pipeline.progress_percent(),
            "Pipeline progress: {}", pipeline.status_message()
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Pipeline warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Pipeline error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Pipeline completed: {}", message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span carrying the job fields, for instrumenting a whole run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "pipeline",
            job_id = %self.job_id,
            operation = %self.operation
        )
    }
}

/// Install the global subscriber.
///
/// Human-readable output by default, JSON lines when `LOG_FORMAT=json`.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let env_filter = env_filter();

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
}

/// `RUST_LOG` when set, otherwise `info` for the studio crates.
fn env_filter() -> EnvFilter {
    let from_env = std::env::var("RUST_LOG").is_ok_and(|v| !v.trim().is_empty());
    if from_env {
        return EnvFilter::from_default_env();
    }
    let mut env_filter = EnvFilter::default();
    for directive in ["studio=info", "studio_app=info", "studio_client=info", "studio_core=info"] {
        if let Ok(directive) = directive.parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }
    env_filter
}

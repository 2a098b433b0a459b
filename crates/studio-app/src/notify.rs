//! User-facing notifications.

use std::sync::Mutex;

use studio_models::RenderJobId;
use tracing::info;

/// A message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A render job finished. Sent once per job id.
    RenderReady {
        id: RenderJobId,
        output_name: String,
    },
}

/// Where notifications go.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Logs notifications.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::RenderReady { id, output_name } => {
                info!(render_job_id = %id, output_name = %output_name, "Render ready: {}", output_name);
            }
        }
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(notification);
    }
}

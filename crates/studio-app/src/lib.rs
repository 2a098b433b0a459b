//! Studio session orchestration.
//!
//! [`Studio`] owns the single [`StudioState`](studio_core::StudioState),
//! runs every backend call through a [`StudioApi`](studio_client::StudioApi)
//! and executes the effects the state returns. Periodic refreshes of the
//! render queue and the published list run on [`Poller`]s.

pub mod config;
pub mod error;
pub mod logging;
pub mod notify;
pub mod poller;
pub mod studio;

pub use config::StudioConfig;
pub use error::{StudioError, StudioResult};
pub use logging::{init_tracing, PipelineLogger};
pub use notify::{Notification, Notifier, RecordingNotifier, TracingNotifier};
pub use poller::Poller;
pub use studio::Studio;

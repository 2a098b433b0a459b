//! Transport for the studio backend.
//!
//! This crate provides:
//! - The [`StudioApi`] trait the application layer is written against
//! - [`StudioClient`], its reqwest implementation
//! - The pipeline event channel (server-sent events over a streamed body)
//! - Retry with backoff for idempotent reads and request metrics

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod metrics;
pub mod retry;

#[cfg(test)]
mod client_tests;

pub use api::{StudioApi, UploadProgress};
pub use client::StudioClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use events::{pump_events, EventSender, EventSubscription, SseDecoder, SubscriptionHandle};
pub use retry::RetryConfig;

//! Shared data models for CrowdListen Studio.
//!
//! This crate provides Serde-serializable types for:
//! - Pipeline jobs, stages and push events
//! - Clips returned by the job-scoped and curated libraries
//! - Render queue jobs
//! - Published videos and the daily quota
//! - Voice providers and their voice catalogues
//! - Request/response bodies for the studio HTTP API

pub mod api;
pub mod clip;
pub mod event;
pub mod job;
pub mod published;
pub mod render;
pub mod utils;
pub mod voice;

// Re-export common types
pub use api::{
    AdAsset, AdAssetList, AdConfig, LibraryResponse, PipelineStartRequest, RenderRequest,
    RenderSubmitted, SaveClipsRequest, SaveClipsResponse, UploadResponse,
};
pub use clip::{Clip, ClipId, LibraryFilter};
pub use event::{EventParseError, EventStatus, PipelineEvent};
pub use job::{JobId, PipelineStage, StageStatus};
pub use published::{PublishedSnapshot, PublishedVideo};
pub use render::{RenderJob, RenderJobId, RenderStatus};
pub use utils::{output_name_slug, OUTPUT_NAME_MAX_LEN};
pub use voice::{Narration, NarrationRequest, VoiceProvider};

//! Client-side job and state coordination.
//!
//! This crate provides pure, synchronous state containers for:
//! - The single active ingestion pipeline (driven by push events)
//! - The clip library and its multi-select
//! - The hook + narration + CTA composer draft
//! - The render queue and its one-time completion notifications
//! - The published videos snapshot
//!
//! Nothing here performs I/O. Every mutation returns the [`Effect`]s the
//! caller must execute, and every asynchronous result is tagged with the
//! [`Generation`] it targets so late completions can be discarded.

pub mod composer;
pub mod effect;
pub mod error;
pub mod generation;
pub mod library;
pub mod pipeline;
pub mod published;
pub mod queue;
pub mod reconcile;
pub mod state;

pub use composer::{ComposerDraft, ComposerState, StepFlags, DEFAULT_CTA_TAGLINE};
pub use effect::Effect;
pub use error::{EventRejection, StaleResult, ValidationError, ValidationErrors};
pub use generation::{Generation, Tagged};
pub use library::{ClipLibrary, LibraryMode, LibraryView};
pub use pipeline::{ActivePipeline, PipelineOutcome, PipelineTracker};
pub use published::PublishedStore;
pub use queue::RenderQueue;
pub use reconcile::{MergeRule, Reconciler};
pub use state::{CreateStep, PipelineOptions, StudioState, Tab, UploadState};

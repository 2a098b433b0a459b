//! Backend operations the studio depends on.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use studio_models::{
    AdAsset, Clip, JobId, LibraryFilter, Narration, NarrationRequest, PipelineStartRequest,
    PublishedSnapshot, RenderJob, RenderJobId, RenderRequest, RenderSubmitted, SaveClipsRequest,
    SaveClipsResponse, UploadResponse,
};

use crate::error::ClientResult;
use crate::events::EventSubscription;

/// Upload progress callback, called with `(bytes_sent, total_bytes)`.
pub type UploadProgress = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// The studio backend.
///
/// [`StudioClient`](crate::StudioClient) talks HTTP; tests substitute
/// their own implementation.
#[async_trait]
pub trait StudioApi: Send + Sync {
    /// Upload a source video. Resolves once the server assigned a job id.
    async fn upload_video(&self, path: &Path, progress: UploadProgress)
        -> ClientResult<UploadResponse>;

    /// Open the pipeline event stream, keeping only events for `job_id`.
    ///
    /// Returns once the stream is connected, so events emitted after a
    /// subsequent [`start_pipeline`](Self::start_pipeline) are not missed.
    async fn subscribe_events(&self, job_id: &JobId) -> ClientResult<EventSubscription>;

    async fn start_pipeline(&self, request: &PipelineStartRequest) -> ClientResult<()>;

    /// Clips produced by one pipeline job.
    async fn fetch_job_library(&self, job_id: &JobId) -> ClientResult<Vec<Clip>>;

    /// Curated library filtered by score and source.
    async fn fetch_library(&self, filter: &LibraryFilter) -> ClientResult<Vec<Clip>>;

    async fn save_clips(
        &self,
        job_id: &JobId,
        request: &SaveClipsRequest,
    ) -> ClientResult<SaveClipsResponse>;

    async fn generate_narration(&self, request: &NarrationRequest) -> ClientResult<Narration>;

    async fn submit_render(&self, request: &RenderRequest) -> ClientResult<RenderSubmitted>;

    async fn fetch_queue(&self) -> ClientResult<Vec<RenderJob>>;

    async fn delete_render_job(&self, id: &RenderJobId) -> ClientResult<()>;

    async fn fetch_published(&self) -> ClientResult<PublishedSnapshot>;

    /// Delete a published video by its path relative to the published root.
    async fn delete_published(&self, path: &str) -> ClientResult<()>;

    async fn list_ad_assets(&self) -> ClientResult<Vec<AdAsset>>;

    async fn upload_ad_asset(&self, path: &Path) -> ClientResult<AdAsset>;
}

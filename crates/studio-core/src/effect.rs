use studio_models::{JobId, RenderJobId};

/// Work the caller must perform after a state mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Close the pipeline event subscription for this job.
    CloseEventStream { job_id: JobId },
    /// Fetch the job-scoped clip library.
    LoadJobLibrary { job_id: JobId },
    /// Poll the render queue now.
    RefreshQueue,
    /// Re-fetch the published snapshot.
    RefreshPublished,
    /// Tell the user a render finished. Emitted once per job id.
    NotifyRenderReady {
        id: RenderJobId,
        output_name: String,
    },
}

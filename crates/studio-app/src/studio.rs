//! The studio session.
//!
//! [`Studio`] is the only owner of the [`StudioState`]. Every operation
//! follows the same shape: mutate the state under the lock, release it,
//! perform the backend call, then apply the tagged result and execute the
//! returned effects. The lock is never held across an await.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use studio_client::metrics::{record_event_discarded, record_render_ready};
use studio_client::{EventSubscription, StudioApi, SubscriptionHandle};
use studio_core::{
    ActivePipeline, ComposerState, Effect, PipelineOptions, PipelineOutcome, Reconciler,
    StaleResult, StudioState, Tab, Tagged,
};
use studio_models::{
    ClipId, JobId, LibraryFilter, Narration, RenderJobId, SaveClipsResponse,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

use crate::config::StudioConfig;
use crate::error::{StudioError, StudioResult};
use crate::logging::PipelineLogger;
use crate::notify::{Notification, Notifier};
use crate::poller::Poller;

/// A studio session against one backend.
pub struct Studio<A: StudioApi> {
    api: Arc<A>,
    state: Arc<Mutex<StudioState>>,
    notifier: Arc<dyn Notifier>,
    /// Subscription of the active job, until a watcher takes it
    events: Mutex<Option<EventSubscription>>,
    /// Close handle of the active job's subscription
    stream: Mutex<Option<SubscriptionHandle>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<A: StudioApi + 'static> Studio<A> {
    pub fn new(api: Arc<A>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(StudioState::new())),
            notifier,
            events: Mutex::new(None),
            stream: Mutex::new(None),
        }
    }

    /// Read the current state.
    pub fn read<R>(&self, f: impl FnOnce(&StudioState) -> R) -> R {
        f(&lock(&self.state))
    }

    // =========================================================================
    // Effects
    // =========================================================================

    /// Execute effects until none are left. Effects produced while running
    /// one are queued behind the rest.
    async fn run_effects(&self, effects: Vec<Effect>) {
        let mut pending: VecDeque<Effect> = effects.into();
        while let Some(effect) = pending.pop_front() {
            debug!(?effect, "Running effect");
            let follow_up = match effect {
                Effect::CloseEventStream { job_id } => {
                    self.close_stream(&job_id);
                    Ok(Vec::new())
                }
                Effect::LoadJobLibrary { job_id } => self.fetch_job_library(job_id).await,
                Effect::RefreshQueue => self.fetch_queue().await,
                Effect::RefreshPublished => self.fetch_published().await,
                Effect::NotifyRenderReady { id, output_name } => {
                    record_render_ready();
                    self.notifier
                        .notify(Notification::RenderReady { id, output_name });
                    Ok(Vec::new())
                }
            };
            match follow_up {
                Ok(more) => pending.extend(more),
                Err(e) if e.is_stale() => debug!(error = %e, "Discarded stale result"),
                Err(e) => warn!(error = %e, "Background refresh failed"),
            }
        }
    }

    fn close_stream(&self, job_id: &JobId) {
        let mut stream = lock(&self.stream);
        if let Some(handle) = stream.as_ref() {
            if handle.job_id() == job_id {
                handle.close();
                *stream = None;
            }
        }
    }

    /// Close the active job's event subscription, if any.
    pub fn close_event_stream(&self) {
        if let Some(handle) = lock(&self.stream).take() {
            handle.close();
        }
        lock(&self.events).take();
    }

    // =========================================================================
    // Upload and pipeline
    // =========================================================================

    /// Upload a source video and return its job id.
    pub async fn upload(&self, path: &Path) -> StudioResult<JobId> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let generation = lock(&self.state).upload_started(filename);

        let state = Arc::clone(&self.state);
        let progress = Arc::new(move |loaded: u64, total: u64| {
            lock(&state).upload_progress(generation, loaded, total);
        });

        match self.api.upload_video(path, progress).await {
            Ok(response) => {
                let job_id = response.job_id;
                let mut state = lock(&self.state);
                if !state.upload_succeeded(generation, job_id.clone()) {
                    return Err(StudioError::Stale(StaleResult {
                        target: "upload",
                        received: generation,
                        current: state.upload_generation(),
                    }));
                }
                Ok(job_id)
            }
            Err(e) => {
                lock(&self.state).upload_failed(generation, format!("Upload failed: {e}"));
                Err(e.into())
            }
        }
    }

    /// Start the pipeline for the uploaded video.
    ///
    /// The event subscription is open before the start request is sent.
    /// Call [`watch_pipeline`](Self::watch_pipeline) to follow it.
    pub async fn start_pipeline(&self, options: &PipelineOptions) -> StudioResult<JobId> {
        let (request, effects) = lock(&self.state).start_pipeline(options)?;
        self.run_effects(effects).await;
        self.close_event_stream();

        let job_id = request.job_id.clone();
        let logger = PipelineLogger::new(&job_id, "pipeline");

        let subscription = self.api.subscribe_events(&job_id).await?;
        *lock(&self.stream) = Some(subscription.handle());
        *lock(&self.events) = Some(subscription);
        logger.log_progress("event stream open");

        if let Err(e) = self.api.start_pipeline(&request).await {
            logger.log_error(&e.to_string());
            self.close_event_stream();
            return Err(e.into());
        }

        logger.log_start(&format!(
            "{} clip type(s), {} clip(s)",
            request.clip_types.len(),
            request.count
        ));
        Ok(job_id)
    }

    /// Apply events of the active job until its subscription ends.
    ///
    /// `on_update` sees the tracker after every applied event. Returns how
    /// the job ended; `InProgress` if the stream closed early.
    pub async fn watch_pipeline<F>(&self, mut on_update: F) -> StudioResult<PipelineOutcome>
    where
        F: FnMut(&ActivePipeline),
    {
        let Some(mut subscription) = lock(&self.events).take() else {
            return Ok(self.pipeline_outcome());
        };
        let logger = PipelineLogger::new(subscription.job_id(), "pipeline");
        let span = logger.create_span();
        self.apply_events(&mut subscription, &logger, &mut on_update)
            .instrument(span)
            .await;

        let outcome = self.pipeline_outcome();
        match &outcome {
            PipelineOutcome::Completed => logger.log_completion("render done"),
            PipelineOutcome::Failed { message } => logger.log_error(message),
            PipelineOutcome::InProgress => logger.log_warning("event stream ended early"),
        }
        Ok(outcome)
    }

    async fn apply_events<F>(
        &self,
        subscription: &mut EventSubscription,
        logger: &PipelineLogger,
        on_update: &mut F,
    ) where
        F: FnMut(&ActivePipeline),
    {
        while let Some(event) = subscription.next().await {
            let applied = {
                let mut state = lock(&self.state);
                state.apply_event(event).map(|effects| {
                    let snapshot = state.pipeline().active().cloned();
                    (effects, snapshot)
                })
            };

            match applied {
                Ok((effects, snapshot)) => {
                    if let Some(pipeline) = snapshot.as_ref() {
                        logger.log_state(pipeline);
                        on_update(pipeline);
                    }
                    self.run_effects(effects).await;
                }
                Err(rejection) => {
                    debug!(job_id = %subscription.job_id(), %rejection, "Event rejected");
                    record_event_discarded(rejection.reason());
                }
            }
        }
    }

    fn pipeline_outcome(&self) -> PipelineOutcome {
        self.read(|s| {
            s.pipeline()
                .active()
                .map(|p| p.outcome().clone())
                .unwrap_or_default()
        })
    }

    // =========================================================================
    // Library
    // =========================================================================

    async fn fetch_job_library(&self, job_id: JobId) -> StudioResult<Vec<Effect>> {
        let generation = lock(&self.state).begin_job_library_load(job_id.clone());
        let clips = self.api.fetch_job_library(&job_id).await?;
        info!(job_id = %job_id, clips = clips.len(), "Job library loaded");
        Ok(lock(&self.state)
            .library_mut()
            .reconcile(Tagged::new(generation, clips))?)
    }

    /// Load the clips produced by `job_id`.
    pub async fn load_job_library(&self, job_id: &JobId) -> StudioResult<usize> {
        let effects = self.fetch_job_library(job_id.clone()).await?;
        self.run_effects(effects).await;
        Ok(self.read(|s| s.library().clips().len()))
    }

    /// Query the curated library. Every call re-fetches.
    pub async fn load_library(&self, filter: LibraryFilter) -> StudioResult<usize> {
        let generation = lock(&self.state)
            .library_mut()
            .begin_filtered_load(filter.clone());
        let clips = self.api.fetch_library(&filter).await?;
        let effects = lock(&self.state)
            .library_mut()
            .reconcile(Tagged::new(generation, clips))?;
        self.run_effects(effects).await;
        Ok(self.read(|s| s.library().clips().len()))
    }

    pub fn toggle_clip(&self, clip_id: &ClipId) -> StudioResult<bool> {
        Ok(lock(&self.state).library_mut().toggle(clip_id)?)
    }

    /// Save the selected clips as one batch and show the published tab.
    pub async fn save_selected(&self) -> StudioResult<SaveClipsResponse> {
        let (job_id, request) = lock(&self.state).library().save_request()?;
        let response = self.api.save_clips(&job_id, &request).await?;
        let effects = lock(&self.state).apply_saved(&response);
        if !response.ok {
            warn!(job_id = %job_id, "Backend refused to save clips");
        }
        self.run_effects(effects).await;
        Ok(response)
    }

    // =========================================================================
    // Composer
    // =========================================================================

    /// Load a library clip into the composer, replacing the draft.
    pub fn select_clip(&self, clip_id: &ClipId) -> StudioResult<()> {
        Ok(lock(&self.state).select_for_composer(clip_id)?)
    }

    /// Edit the composer draft.
    pub fn edit_composer<R>(&self, f: impl FnOnce(&mut ComposerState) -> R) -> R {
        f(lock(&self.state).composer_mut())
    }

    /// Generate narration for the current script and voice.
    pub async fn generate_narration(&self) -> StudioResult<Narration> {
        let request = lock(&self.state).composer_mut().narration_request()?;
        let generation = request.generation;

        match self.api.generate_narration(&request.value).await {
            Ok(narration) => {
                lock(&self.state)
                    .composer_mut()
                    .apply_narration(Tagged::new(generation, narration.clone()))?;
                info!(duration = narration.duration, "Narration generated");
                Ok(narration)
            }
            Err(e) => {
                let message = e.to_string();
                if lock(&self.state)
                    .composer_mut()
                    .narration_failed(generation, message)
                    .is_err()
                {
                    debug!("Narration failed for a replaced draft");
                }
                Err(e.into())
            }
        }
    }

    /// Submit the draft for rendering.
    pub async fn submit_render(&self) -> StudioResult<RenderJobId> {
        let request = lock(&self.state).composer_mut().render_request()?;
        let generation = request.generation;

        match self.api.submit_render(&request.value).await {
            Ok(submitted) => {
                let id = submitted.id.clone();
                let effects = lock(&self.state)
                    .composer_mut()
                    .apply_submitted(Tagged::new(generation, submitted));
                self.run_effects(effects).await;
                Ok(id)
            }
            Err(e) => {
                if lock(&self.state)
                    .composer_mut()
                    .submit_failed(generation, e.to_string())
                    .is_err()
                {
                    debug!("Submission failed for a replaced draft");
                }
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Render queue
    // =========================================================================

    async fn fetch_queue(&self) -> StudioResult<Vec<Effect>> {
        let generation = lock(&self.state).queue_mut().begin_poll();
        let jobs = self.api.fetch_queue().await?;
        Ok(lock(&self.state)
            .queue_mut()
            .reconcile(Tagged::new(generation, jobs))?)
    }

    /// Refresh the render queue and announce newly finished jobs.
    ///
    /// A response overtaken by a newer poll is dropped and counts as success.
    pub async fn poll_queue(&self) -> StudioResult<()> {
        let effects = discard_stale(self.fetch_queue().await)?;
        self.run_effects(effects).await;
        Ok(())
    }

    /// Remove a finished or failed job from the queue.
    pub async fn remove_render_job(&self, id: &RenderJobId) -> StudioResult<()> {
        self.read(|s| s.queue().remove_check(id))?;
        self.api.delete_render_job(id).await?;
        info!(render_job_id = %id, "Render job removed");
        self.poll_queue().await
    }

    // =========================================================================
    // Published
    // =========================================================================

    async fn fetch_published(&self) -> StudioResult<Vec<Effect>> {
        let generation = lock(&self.state).published_mut().begin_refresh();
        let snapshot = self.api.fetch_published().await?;
        Ok(lock(&self.state)
            .published_mut()
            .reconcile(Tagged::new(generation, snapshot))?)
    }

    pub async fn refresh_published(&self) -> StudioResult<()> {
        let effects = discard_stale(self.fetch_published().await)?;
        self.run_effects(effects).await;
        Ok(())
    }

    /// Delete a published video, then refresh the list.
    pub async fn delete_published(&self, path: &str) -> StudioResult<()> {
        self.read(|s| s.published().delete_check(path))?;
        self.api.delete_published(path).await?;
        info!(path = %path, "Published video deleted");
        self.refresh_published().await
    }

    pub async fn switch_tab(&self, tab: Tab) {
        let effects = lock(&self.state).switch_tab(tab);
        self.run_effects(effects).await;
    }

    // =========================================================================
    // Ads
    // =========================================================================

    pub async fn refresh_ad_assets(&self) -> StudioResult<usize> {
        let assets = self.api.list_ad_assets().await?;
        let count = assets.len();
        lock(&self.state).set_ad_assets(assets);
        Ok(count)
    }

    /// Upload an ad asset and make it the selected one.
    pub async fn upload_ad_asset(&self, path: &Path) -> StudioResult<String> {
        let asset = self.api.upload_ad_asset(path).await?;
        lock(&self.state).ad_asset_uploaded(asset.filename.clone());
        if let Err(e) = self.refresh_ad_assets().await {
            warn!(error = %e, "Ad asset list refresh failed");
        }
        Ok(asset.filename)
    }

    pub fn select_ad_asset(&self, filename: Option<String>) {
        lock(&self.state).select_ad_asset(filename);
    }

    // =========================================================================
    // Background refresh
    // =========================================================================

    /// Spawn the render queue and published pollers.
    pub fn spawn_pollers(
        self: &Arc<Self>,
        config: &StudioConfig,
        cancel: CancellationToken,
    ) -> Vec<JoinHandle<()>> {
        let queue = Poller::new("render_queue", config.queue_poll_interval);
        let studio = Arc::clone(self);
        let queue_cancel = cancel.clone();
        let queue_task = tokio::spawn(async move {
            queue
                .run(queue_cancel, move || {
                    let studio = Arc::clone(&studio);
                    async move { studio.poll_queue().await }
                })
                .await
        });

        let published = Poller::new("published", config.published_poll_interval);
        let studio = Arc::clone(self);
        let published_task = tokio::spawn(async move {
            published
                .run(cancel, move || {
                    let studio = Arc::clone(&studio);
                    async move { studio.refresh_published().await }
                })
                .await
        });

        vec![queue_task, published_task]
    }
}

/// Turn a stale result into "nothing to do".
fn discard_stale(result: StudioResult<Vec<Effect>>) -> StudioResult<Vec<Effect>> {
    match result {
        Err(StudioError::Stale(stale)) => {
            debug!(error = %stale, "Discarded stale result");
            Ok(Vec::new())
        }
        other => other,
    }
}

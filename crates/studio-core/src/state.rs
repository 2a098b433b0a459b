//! The single owned studio state.
//!
//! One active pipeline, one library view, one composer draft, the render
//! queue mirror and the published snapshot live together in
//! [`StudioState`]. The session that owns it passes it by reference to
//! whatever needs it; there is no module-level state.

use studio_models::{
    AdAsset, AdConfig, ClipId, JobId, PipelineEvent, PipelineStartRequest, SaveClipsResponse,
};
use tracing::{debug, info};

use crate::{
    ClipLibrary, ComposerState, Effect, EventRejection, Generation, LibraryMode, PipelineTracker,
    PublishedStore, Reconciler, RenderQueue, ValidationError,
};

/// Share of the progress bar covered by the byte transfer. The rest is
/// reserved for the server acknowledging the upload.
const UPLOAD_TRANSFER_SHARE: f64 = 95.0;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UploadState {
    #[default]
    Idle,
    Uploading {
        filename: String,
        percent: u8,
    },
    Uploaded {
        job_id: JobId,
        filename: String,
    },
    Failed {
        message: String,
    },
}

impl UploadState {
    pub fn percent(&self) -> u8 {
        match self {
            UploadState::Idle | UploadState::Failed { .. } => 0,
            UploadState::Uploading { percent, .. } => *percent,
            UploadState::Uploaded { .. } => 100,
        }
    }

    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            UploadState::Uploaded { job_id, .. } => Some(job_id),
            _ => None,
        }
    }
}

/// Step of the create wizard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CreateStep {
    #[default]
    Upload,
    Options,
    Processing,
    Library,
}

impl CreateStep {
    pub fn number(&self) -> u8 {
        match self {
            CreateStep::Upload => 1,
            CreateStep::Options => 2,
            CreateStep::Processing => 3,
            CreateStep::Library => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Create,
    Published,
}

/// User choices for a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    pub clip_types: Vec<String>,
    pub add_narration: bool,
    pub count: u32,
    pub audience: String,
    pub ad_config: Option<AdConfig>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            clip_types: Vec::new(),
            add_narration: false,
            count: 5,
            audience: String::new(),
            ad_config: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StudioState {
    upload: UploadState,
    upload_generation: Generation,
    tab: Tab,
    step: CreateStep,
    pipeline: PipelineTracker,
    library: ClipLibrary,
    composer: ComposerState,
    queue: RenderQueue,
    published: PublishedStore,
    ad_assets: Vec<AdAsset>,
    selected_ad_asset: Option<String>,
}

impl StudioState {
    pub fn new() -> Self {
        Self::default()
    }

    // Accessors

    pub fn upload(&self) -> &UploadState {
        &self.upload
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn step(&self) -> CreateStep {
        self.step
    }

    pub fn pipeline(&self) -> &PipelineTracker {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut PipelineTracker {
        &mut self.pipeline
    }

    pub fn library(&self) -> &ClipLibrary {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut ClipLibrary {
        &mut self.library
    }

    pub fn composer(&self) -> &ComposerState {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut ComposerState {
        &mut self.composer
    }

    pub fn queue(&self) -> &RenderQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut RenderQueue {
        &mut self.queue
    }

    pub fn published(&self) -> &PublishedStore {
        &self.published
    }

    pub fn published_mut(&mut self) -> &mut PublishedStore {
        &mut self.published
    }

    pub fn ad_assets(&self) -> &[AdAsset] {
        &self.ad_assets
    }

    pub fn selected_ad_asset(&self) -> Option<&str> {
        self.selected_ad_asset.as_deref()
    }

    // Upload

    /// Start a new upload. Returns the tag its completion must carry.
    pub fn upload_started(&mut self, filename: impl Into<String>) -> Generation {
        self.upload = UploadState::Uploading {
            filename: filename.into(),
            percent: 0,
        };
        self.step = CreateStep::Upload;
        self.upload_generation.bump()
    }

    /// Tag of the most recent upload.
    pub fn upload_generation(&self) -> Generation {
        self.upload_generation
    }

    /// Record transfer progress; the bar stops at 95 until the server answers.
    pub fn upload_progress(&mut self, generation: Generation, loaded: u64, total: u64) {
        if generation != self.upload_generation || total == 0 {
            return;
        }
        if let UploadState::Uploading { percent, .. } = &mut self.upload {
            let ratio = (loaded.min(total) as f64) / (total as f64);
            *percent = (ratio * UPLOAD_TRANSFER_SHARE).round() as u8;
        }
    }

    pub fn upload_succeeded(&mut self, generation: Generation, job_id: JobId) -> bool {
        if generation != self.upload_generation {
            return false;
        }
        let UploadState::Uploading { filename, .. } = &mut self.upload else {
            return false;
        };
        info!(job_id = %job_id, filename = %filename, "Upload complete");
        self.upload = UploadState::Uploaded {
            job_id,
            filename: std::mem::take(filename),
        };
        self.step = CreateStep::Options;
        true
    }

    pub fn upload_failed(&mut self, generation: Generation, message: impl Into<String>) -> bool {
        if generation != self.upload_generation {
            return false;
        }
        self.upload = UploadState::Failed {
            message: message.into(),
        };
        true
    }

    // Pipeline

    /// Validate the options and begin tracking the uploaded job.
    ///
    /// Stage statuses and progress are reset here, before the event
    /// subscription for the new job can deliver anything.
    pub fn start_pipeline(
        &mut self,
        options: &PipelineOptions,
    ) -> Result<(PipelineStartRequest, Vec<Effect>), ValidationError> {
        let job_id = self
            .upload
            .job_id()
            .cloned()
            .ok_or(ValidationError::NoVideoUploaded)?;
        if options.clip_types.is_empty() {
            return Err(ValidationError::NoClipTypes);
        }
        if options.count == 0 {
            return Err(ValidationError::InvalidCount);
        }
        if options
            .ad_config
            .as_ref()
            .is_some_and(|ad| ad.enabled && ad.frequency == Some(0))
        {
            return Err(ValidationError::InvalidAdFrequency);
        }

        let effects = self.pipeline.begin(job_id.clone());
        self.step = CreateStep::Processing;

        let request = PipelineStartRequest {
            job_id,
            clip_types: options.clip_types.clone(),
            add_narration: options.add_narration,
            count: options.count,
            audience: options.audience.clone(),
            ad_config: options.ad_config.clone(),
        };
        Ok((request, effects))
    }

    pub fn apply_event(&mut self, event: PipelineEvent) -> Result<Vec<Effect>, EventRejection> {
        self.pipeline.reconcile(event)
    }

    /// Switch the library to the clips of `job_id` and show it.
    pub fn begin_job_library_load(&mut self, job_id: JobId) -> Generation {
        self.step = CreateStep::Library;
        self.library.begin_job_load(job_id)
    }

    // Navigation

    /// Change tab. Opening the published tab always refreshes it.
    pub fn switch_tab(&mut self, tab: Tab) -> Vec<Effect> {
        self.tab = tab;
        match tab {
            Tab::Published => vec![Effect::RefreshPublished],
            Tab::Create => Vec::new(),
        }
    }

    /// Apply a save response: clear the selection and show the published tab.
    pub fn apply_saved(&mut self, response: &SaveClipsResponse) -> Vec<Effect> {
        if self.library.apply_saved(response) {
            info!(saved = response.saved, dest = %response.dest, "Clips saved");
            self.switch_tab(Tab::Published)
        } else {
            Vec::new()
        }
    }

    // Composer

    /// Load a library clip into the composer, replacing the draft.
    ///
    /// Clips from a job library are unusable while that job is the tracked
    /// pipeline and has not finished. Libraries of other jobs, reopened or
    /// left on screen while a new run started, came from finished runs.
    pub fn select_for_composer(&mut self, clip_id: &ClipId) -> Result<(), ValidationError> {
        if let LibraryMode::Job(job_id) = self.library.mode() {
            let tracked = self.pipeline.active_job_id() == Some(job_id);
            if tracked && !self.pipeline.is_completed(job_id) {
                return Err(ValidationError::PipelineIncomplete(job_id.clone()));
            }
        }
        let clip = self
            .library
            .find(clip_id)
            .ok_or_else(|| ValidationError::UnknownClip(clip_id.clone()))?;
        self.composer.select_clip(clip);
        self.tab = Tab::Create;
        Ok(())
    }

    // Ads

    /// Replace the ad asset list, keeping the selection if it still exists.
    pub fn set_ad_assets(&mut self, assets: Vec<AdAsset>) {
        if let Some(selected) = &self.selected_ad_asset {
            if !assets.iter().any(|a| &a.filename == selected) {
                debug!(asset = %selected, "Selected ad asset no longer listed");
                self.selected_ad_asset = None;
            }
        }
        self.ad_assets = assets;
    }

    pub fn select_ad_asset(&mut self, filename: Option<String>) {
        self.selected_ad_asset = filename.filter(|f| !f.is_empty());
    }

    /// A freshly uploaded asset becomes the selected one.
    pub fn ad_asset_uploaded(&mut self, filename: impl Into<String>) {
        let filename = filename.into();
        if !self.ad_assets.iter().any(|a| a.filename == filename) {
            self.ad_assets.push(AdAsset {
                filename: filename.clone(),
            });
        }
        self.selected_ad_asset = Some(filename);
    }

    /// Ad settings for the next pipeline run using the selected asset.
    pub fn ad_config(&self, placement: &str, frequency: u32, image_duration: u32) -> AdConfig {
        AdConfig::new(
            self.selected_ad_asset.clone(),
            placement,
            frequency,
            image_duration,
        )
    }
}

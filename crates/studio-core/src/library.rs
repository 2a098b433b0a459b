//! Clip library store.
//!
//! Holds the clips of the current library view and the user's selection
//! for "save to published". Two retrieval modes share the store:
//! a job-scoped library (the output of one pipeline run, selectable) and
//! the curated global library filtered by score and source (browse only).

use std::collections::BTreeSet;

use studio_models::{Clip, ClipId, JobId, LibraryFilter, SaveClipsRequest, SaveClipsResponse};
use tracing::debug;

use crate::{Effect, Generation, MergeRule, Reconciler, StaleResult, Tagged, ValidationError};

/// Which library is shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LibraryMode {
    #[default]
    Idle,
    /// Clips produced by one pipeline job
    Job(JobId),
    /// Curated library query
    Filtered(LibraryFilter),
}

/// What the library view should render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LibraryView<'a> {
    Idle,
    Loading,
    /// The fetch returned nothing
    NoClips,
    Clips(&'a [Clip]),
}

#[derive(Debug, Clone, Default)]
pub struct ClipLibrary {
    mode: LibraryMode,
    clips: Vec<Clip>,
    loaded: bool,
    selection: BTreeSet<ClipId>,
    generation: Generation,
}

impl ClipLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to the job-scoped library. Clears the selection.
    pub fn begin_job_load(&mut self, job_id: JobId) -> Generation {
        self.reset(LibraryMode::Job(job_id))
    }

    /// Switch to (or re-query) the curated library. Every filter change
    /// re-fetches; nothing is cached across filter values.
    pub fn begin_filtered_load(&mut self, filter: LibraryFilter) -> Generation {
        self.reset(LibraryMode::Filtered(filter))
    }

    fn reset(&mut self, mode: LibraryMode) -> Generation {
        self.mode = mode;
        self.clips.clear();
        self.loaded = false;
        self.selection.clear();
        self.generation.bump()
    }

    pub fn mode(&self) -> &LibraryMode {
        &self.mode
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn find(&self, id: &ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| &c.id == id)
    }

    pub fn view(&self) -> LibraryView<'_> {
        match (&self.mode, self.loaded) {
            (LibraryMode::Idle, _) => LibraryView::Idle,
            (_, false) => LibraryView::Loading,
            (_, true) if self.clips.is_empty() => LibraryView::NoClips,
            (_, true) => LibraryView::Clips(&self.clips),
        }
    }

    /// Flip selection of a clip. Returns whether it is now selected.
    pub fn toggle(&mut self, id: &ClipId) -> Result<bool, ValidationError> {
        if !matches!(self.mode, LibraryMode::Job(_)) {
            return Err(ValidationError::SelectionUnavailable);
        }
        if self.find(id).is_none() {
            return Err(ValidationError::UnknownClip(id.clone()));
        }
        if self.selection.remove(id) {
            Ok(false)
        } else {
            self.selection.insert(id.clone());
            Ok(true)
        }
    }

    pub fn is_selected(&self, id: &ClipId) -> bool {
        self.selection.contains(id)
    }

    pub fn selected(&self) -> impl Iterator<Item = &ClipId> {
        self.selection.iter()
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    /// Save is enabled only with a non-empty selection.
    pub fn can_save(&self) -> bool {
        !self.selection.is_empty()
    }

    /// Build the batch save request for the whole selection.
    pub fn save_request(&self) -> Result<(JobId, SaveClipsRequest), ValidationError> {
        let LibraryMode::Job(job_id) = &self.mode else {
            return Err(ValidationError::SelectionUnavailable);
        };
        if self.selection.is_empty() {
            return Err(ValidationError::EmptySelection);
        }
        Ok((
            job_id.clone(),
            SaveClipsRequest {
                clips: self.selection.iter().cloned().collect(),
            },
        ))
    }

    /// Apply the save response. A successful save clears the selection;
    /// nothing is added to the published store here.
    pub fn apply_saved(&mut self, response: &SaveClipsResponse) -> bool {
        if response.ok {
            self.selection.clear();
        }
        response.ok
    }
}

impl Reconciler for ClipLibrary {
    type Update = Tagged<Vec<Clip>>;
    type Rejection = StaleResult;

    const RULE: MergeRule = MergeRule::Replace;

    fn reconcile(&mut self, update: Tagged<Vec<Clip>>) -> Result<Vec<Effect>, StaleResult> {
        if update.generation != self.generation {
            debug!(
                received = %update.generation,
                current = %self.generation,
                "Discarding stale library response"
            );
            return Err(StaleResult {
                target: "library",
                received: update.generation,
                current: self.generation,
            });
        }
        self.clips = update.value;
        self.loaded = true;
        Ok(Vec::new())
    }
}

//! Pipeline state tracker.
//!
//! Tracks the single active ingestion run through its four stages. Each
//! stage moves `pending -> running -> done | error` and never leaves a
//! terminal status within the same job. The whole job ends on
//! `render:done` (or a pipeline-wide failure), after which every further
//! event for it is ignored.

use studio_models::{JobId, PipelineEvent, PipelineStage, StageStatus};
use tracing::debug;

use crate::{Effect, EventRejection, MergeRule, Reconciler};

const STARTING_MESSAGE: &str = "Starting…";

/// How the active job ended, if it did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PipelineOutcome {
    #[default]
    InProgress,
    /// `render:done` received
    Completed,
    /// The backend aborted the whole run
    Failed { message: String },
}

impl PipelineOutcome {
    pub fn is_finished(&self) -> bool {
        !matches!(self, PipelineOutcome::InProgress)
    }
}

/// State of the active job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePipeline {
    job_id: JobId,
    stages: [StageStatus; 4],
    progress_percent: u8,
    reported_progress: u8,
    status_message: String,
    outcome: PipelineOutcome,
    last_seq: Option<u64>,
}

impl ActivePipeline {
    fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            stages: [StageStatus::Pending; 4],
            progress_percent: 0,
            reported_progress: 0,
            status_message: STARTING_MESSAGE.to_string(),
            outcome: PipelineOutcome::InProgress,
            last_seq: None,
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn stage_status(&self, stage: PipelineStage) -> StageStatus {
        self.stages[stage.index()]
    }

    /// Stage statuses in execution order.
    pub fn stages(&self) -> impl Iterator<Item = (PipelineStage, StageStatus)> + '_ {
        PipelineStage::ALL
            .iter()
            .map(move |stage| (*stage, self.stages[stage.index()]))
    }

    /// Progress shown to the user. Never decreases while the job is open.
    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    /// Last progress value exactly as the backend sent it.
    pub fn reported_progress(&self) -> u8 {
        self.reported_progress
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn outcome(&self) -> &PipelineOutcome {
        &self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_finished()
    }

    pub fn is_completed(&self) -> bool {
        self.outcome == PipelineOutcome::Completed
    }

    /// Stages that reported an error.
    pub fn failed_stages(&self) -> Vec<PipelineStage> {
        self.stages()
            .filter(|(_, status)| *status == StageStatus::Error)
            .map(|(stage, _)| stage)
            .collect()
    }

    fn apply(&mut self, event: &PipelineEvent) -> Result<Vec<Effect>, EventRejection> {
        if event.job_id != self.job_id {
            return Err(EventRejection::Stale {
                active: self.job_id.clone(),
                received: event.job_id.clone(),
            });
        }
        if self.is_finished() {
            return Err(EventRejection::AfterTerminal(self.job_id.clone()));
        }
        if let (Some(seq), Some(last)) = (event.seq, self.last_seq) {
            if seq <= last {
                return Err(EventRejection::OutOfOrder { seq, last });
            }
        }
        if event.seq.is_some() {
            self.last_seq = event.seq;
        }

        if let Some(progress) = event.progress {
            self.reported_progress = progress;
            self.progress_percent = self.progress_percent.max(progress);
        }
        self.status_message = event.message.clone();

        let Some(stage) = event.stage else {
            self.outcome = PipelineOutcome::Failed {
                message: event.message.clone(),
            };
            return Ok(vec![Effect::CloseEventStream {
                job_id: self.job_id.clone(),
            }]);
        };

        let slot = &mut self.stages[stage.index()];
        if slot.is_terminal() {
            debug!(
                job_id = %self.job_id,
                stage = %stage,
                current = %slot,
                requested = event.status.as_str(),
                "Ignoring transition out of terminal stage status"
            );
        } else {
            *slot = event.status.stage_status();
        }

        if event.is_job_completion() {
            self.outcome = PipelineOutcome::Completed;
            self.progress_percent = 100;
            return Ok(vec![
                Effect::CloseEventStream {
                    job_id: self.job_id.clone(),
                },
                Effect::LoadJobLibrary {
                    job_id: self.job_id.clone(),
                },
            ]);
        }

        Ok(Vec::new())
    }
}

/// Owner of the single active pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineTracker {
    active: Option<ActivePipeline>,
}

impl PipelineTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `job_id`, replacing any previous job.
    ///
    /// All stages are reset to pending and progress to 0 before any event
    /// of the new job can be applied. If the previous job was still open
    /// its subscription must be closed.
    pub fn begin(&mut self, job_id: JobId) -> Vec<Effect> {
        let previous = self.active.replace(ActivePipeline::new(job_id));
        match previous {
            Some(prev) if !prev.is_finished() => vec![Effect::CloseEventStream {
                job_id: prev.job_id,
            }],
            _ => Vec::new(),
        }
    }

    pub fn active(&self) -> Option<&ActivePipeline> {
        self.active.as_ref()
    }

    pub fn active_job_id(&self) -> Option<&JobId> {
        self.active.as_ref().map(ActivePipeline::job_id)
    }

    /// True when `job_id` is the tracked job and it reached `render:done`.
    pub fn is_completed(&self, job_id: &JobId) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| &a.job_id == job_id && a.is_completed())
    }
}

impl Reconciler for PipelineTracker {
    type Update = PipelineEvent;
    type Rejection = EventRejection;

    const RULE: MergeRule = MergeRule::Patch;

    fn reconcile(&mut self, event: PipelineEvent) -> Result<Vec<Effect>, EventRejection> {
        match self.active.as_mut() {
            Some(active) => active.apply(&event),
            None => Err(EventRejection::NoActiveJob),
        }
    }
}

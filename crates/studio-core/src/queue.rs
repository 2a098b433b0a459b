//! Render queue mirror.
//!
//! The queue is polled and every response replaces the list. The only
//! state kept across polls is the set of job ids already announced as
//! done, so a job that stays `done` for many polls is announced once.

use std::collections::HashSet;

use studio_models::{RenderJob, RenderJobId, RenderStatus};
use tracing::{debug, info};

use crate::{Effect, Generation, MergeRule, Reconciler, StaleResult, Tagged, ValidationError};

#[derive(Debug, Clone, Default)]
pub struct RenderQueue {
    jobs: Vec<RenderJob>,
    /// Jobs whose completion was already announced. Never pruned: a job
    /// that disappears and reappears as done must not be announced again.
    notified: HashSet<RenderJobId>,
    issued: Generation,
    applied: Option<Generation>,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag for the next queue fetch.
    pub fn begin_poll(&mut self) -> Generation {
        self.issued.bump()
    }

    pub fn jobs(&self) -> &[RenderJob] {
        &self.jobs
    }

    pub fn get(&self, id: &RenderJobId) -> Option<&RenderJob> {
        self.jobs.iter().find(|j| &j.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Whether any job is still queued or running.
    pub fn has_active(&self) -> bool {
        self.jobs.iter().any(|j| !j.is_terminal())
    }

    pub fn was_notified(&self, id: &RenderJobId) -> bool {
        self.notified.contains(id)
    }

    /// Removal is only offered for terminal jobs.
    pub fn remove_check(&self, id: &RenderJobId) -> Result<(), ValidationError> {
        let job = self
            .get(id)
            .ok_or_else(|| ValidationError::UnknownRenderJob(id.clone()))?;
        match job.status {
            RenderStatus::Queued | RenderStatus::Running => Err(ValidationError::RemoveWhileActive {
                id: id.clone(),
                status: job.status,
            }),
            RenderStatus::Done | RenderStatus::Failed => Ok(()),
        }
    }
}

impl Reconciler for RenderQueue {
    type Update = Tagged<Vec<RenderJob>>;
    type Rejection = StaleResult;

    const RULE: MergeRule = MergeRule::Replace;

    fn reconcile(&mut self, update: Tagged<Vec<RenderJob>>) -> Result<Vec<Effect>, StaleResult> {
        // Responses may land out of order; only a newer poll wins.
        if let Some(applied) = self.applied {
            if update.generation <= applied {
                debug!(
                    received = %update.generation,
                    applied = %applied,
                    "Discarding out-of-order queue response"
                );
                return Err(StaleResult {
                    target: "queue",
                    received: update.generation,
                    current: applied,
                });
            }
        }
        self.applied = Some(update.generation);
        self.jobs = update.value;

        let mut effects = Vec::new();
        for job in &self.jobs {
            if job.status != RenderStatus::Done || self.notified.contains(&job.id) {
                continue;
            }
            info!(
                render_job_id = %job.id,
                output_name = %job.output_name,
                "Render finished"
            );
            self.notified.insert(job.id.clone());
            effects.push(Effect::NotifyRenderReady {
                id: job.id.clone(),
                output_name: job.output_name.clone(),
            });
            effects.push(Effect::RefreshPublished);
        }
        Ok(effects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: &str, status: RenderStatus) -> RenderJob {
        RenderJob {
            id: RenderJobId::from(id),
            output_name: format!("{id}_out"),
            status,
            created_at: "2026-10-19T09:00:00".into(),
            error: None,
        }
    }

    fn poll(queue: &mut RenderQueue, jobs: Vec<RenderJob>) -> Vec<Effect> {
        let generation = queue.begin_poll();
        queue.reconcile(Tagged::new(generation, jobs)).unwrap()
    }

    #[test]
    fn test_done_job_notified_exactly_once() {
        let mut queue = RenderQueue::new();
        assert!(poll(&mut queue, vec![job("r1", RenderStatus::Running)]).is_empty());

        let mut notifications = 0;
        for _ in 0..100 {
            let effects = poll(&mut queue, vec![job("r1", RenderStatus::Done)]);
            notifications += effects
                .iter()
                .filter(|e| matches!(e, Effect::NotifyRenderReady { .. }))
                .count();
        }
        assert_eq!(notifications, 1);
        assert!(queue.was_notified(&RenderJobId::from("r1")));
    }

    #[test]
    fn test_each_new_done_job_refreshes_published() {
        let mut queue = RenderQueue::new();
        let effects = poll(
            &mut queue,
            vec![job("r1", RenderStatus::Done), job("r2", RenderStatus::Done)],
        );
        assert_eq!(
            effects,
            vec![
                Effect::NotifyRenderReady {
                    id: RenderJobId::from("r1"),
                    output_name: "r1_out".into(),
                },
                Effect::RefreshPublished,
                Effect::NotifyRenderReady {
                    id: RenderJobId::from("r2"),
                    output_name: "r2_out".into(),
                },
                Effect::RefreshPublished,
            ]
        );
    }

    #[test]
    fn test_failed_job_not_notified_and_removable() {
        let mut queue = RenderQueue::new();
        poll(&mut queue, vec![job("r1", RenderStatus::Queued)]);
        assert!(matches!(
            queue.remove_check(&RenderJobId::from("r1")),
            Err(ValidationError::RemoveWhileActive { .. })
        ));

        let mut failed = job("r1", RenderStatus::Failed);
        failed.error = Some("disk full".into());
        let effects = poll(&mut queue, vec![failed]);
        assert!(effects.is_empty());

        let shown = queue.get(&RenderJobId::from("r1")).unwrap();
        assert_eq!(shown.failure(), Some("disk full"));
        assert!(queue.remove_check(&RenderJobId::from("r1")).is_ok());
    }

    #[test]
    fn test_out_of_order_response_discarded() {
        let mut queue = RenderQueue::new();
        let first = queue.begin_poll();
        let second = queue.begin_poll();

        queue
            .reconcile(Tagged::new(second, vec![job("r1", RenderStatus::Done)]))
            .unwrap();
        let late = queue.reconcile(Tagged::new(first, vec![job("r1", RenderStatus::Running)]));
        assert!(late.is_err());
        assert_eq!(queue.jobs()[0].status, RenderStatus::Done);
    }

    #[test]
    fn test_removed_job_not_renotified() {
        let mut queue = RenderQueue::new();
        poll(&mut queue, vec![job("r1", RenderStatus::Done)]);
        poll(&mut queue, Vec::new());
        assert!(queue.is_empty());
        assert!(poll(&mut queue, vec![job("r1", RenderStatus::Done)]).is_empty());
    }

    #[test]
    fn test_unknown_job_cannot_be_removed() {
        let queue = RenderQueue::new();
        assert_eq!(
            queue.remove_check(&RenderJobId::from("nope")),
            Err(ValidationError::UnknownRenderJob(RenderJobId::from("nope")))
        );
    }
}

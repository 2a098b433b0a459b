//! Common reconciliation interface for pushed and polled updates.
//!
//! The pipeline event stream patches state one event at a time; the
//! library, queue and published fetches replace their state wholesale.
//! Both go through [`Reconciler::reconcile`] so every source has exactly
//! one update path.

use crate::Effect;

/// How an update is merged into existing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRule {
    /// Apply the update on top of the current state.
    Patch,
    /// Discard the current state and take the update as the new truth.
    Replace,
}

/// A state container fed by an external source.
pub trait Reconciler {
    /// What the source delivers.
    type Update;
    /// Why an update may be refused.
    type Rejection;

    /// Merge rule this container applies.
    const RULE: MergeRule;

    /// Merge `update` and return the follow-up effects.
    fn reconcile(&mut self, update: Self::Update) -> Result<Vec<Effect>, Self::Rejection>;
}

//! Published videos store.

use studio_models::PublishedSnapshot;
use tracing::debug;

use crate::{Effect, Generation, MergeRule, Reconciler, StaleResult, Tagged, ValidationError};

/// Last published snapshot. Only a refresh changes it; deletes and
/// saves trigger a refresh instead of editing the list locally.
#[derive(Debug, Clone, Default)]
pub struct PublishedStore {
    snapshot: Option<PublishedSnapshot>,
    issued: Generation,
    applied: Option<Generation>,
}

impl PublishedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_refresh(&mut self) -> Generation {
        self.issued.bump()
    }

    /// `None` until the first refresh completes.
    pub fn snapshot(&self) -> Option<&PublishedSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn delete_check(&self, path: &str) -> Result<(), ValidationError> {
        if path.trim().is_empty() {
            return Err(ValidationError::MissingPublishedPath);
        }
        Ok(())
    }
}

impl Reconciler for PublishedStore {
    type Update = Tagged<PublishedSnapshot>;
    type Rejection = StaleResult;

    const RULE: MergeRule = MergeRule::Replace;

    fn reconcile(&mut self, update: Tagged<PublishedSnapshot>) -> Result<Vec<Effect>, StaleResult> {
        if let Some(applied) = self.applied {
            if update.generation <= applied {
                debug!(
                    received = %update.generation,
                    applied = %applied,
                    "Discarding out-of-order published response"
                );
                return Err(StaleResult {
                    target: "published",
                    received: update.generation,
                    current: applied,
                });
            }
        }
        self.applied = Some(update.generation);
        self.snapshot = Some(update.value);
        Ok(Vec::new())
    }
}

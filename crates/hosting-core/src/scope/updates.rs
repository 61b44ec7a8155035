use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::scope::{ScopeId, StateValue};

type UpdateFn = dyn Fn(&(dyn Any + Send + Sync)) -> Option<StateValue> + Send + Sync;

/// A pending change to one scope's state, applied during the next build.
///
/// Updates are ordered by `sequence`. A build consumes every update in the
/// batch it was handed, including updates whose scope is no longer present.
#[derive(Clone)]
pub struct StateUpdate {
    sequence: u64,
    scope: ScopeId,
    expected: &'static str,
    apply: Arc<UpdateFn>,
}

impl StateUpdate {
    pub fn new<T, F>(sequence: u64, scope: ScopeId, update: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        Self {
            sequence,
            scope,
            expected: type_name::<T>(),
            apply: Arc::new(move |current: &(dyn Any + Send + Sync)| {
                let current = current.downcast_ref::<T>()?;
                let next: StateValue = Arc::new(update(current));
                Some(next)
            }),
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Applies the update, returning `None` if the stored state has another type.
    pub(crate) fn apply(&self, current: &StateValue) -> Option<StateValue> {
        (self.apply)(current.as_ref())
    }

    pub(crate) fn expected_type(&self) -> &'static str {
        self.expected
    }
}

impl fmt::Debug for StateUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateUpdate")
            .field("sequence", &self.sequence)
            .field("scope", &self.scope)
            .field("expected", &self.expected)
            .finish()
    }
}

/// Ordered queue of pending state updates owned by one hosting instance.
#[derive(Debug, Default)]
pub struct StateUpdateQueue {
    next_sequence: u64,
    pending: Vec<StateUpdate>,
}

impl StateUpdateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues `update` for `scope` and returns its sequence number.
    pub fn push<T, F>(&mut self, scope: ScopeId, update: F) -> u64
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        self.next_sequence += 1;
        let sequence = self.next_sequence;
        self.pending
            .push(StateUpdate::new::<T, F>(sequence, scope, update));
        sequence
    }

    /// Snapshot handed to a build.
    pub fn snapshot(&self) -> Arc<[StateUpdate]> {
        self.pending.clone().into()
    }

    /// Drops every update up to and including `sequence`.
    pub fn acknowledge(&mut self, sequence: u64) {
        self.pending.retain(|update| update.sequence > sequence);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

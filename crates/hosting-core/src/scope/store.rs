use std::any::{type_name, Any};
use std::sync::Arc;

use log::{trace, warn};

use crate::collections::map::HashMap;
use crate::component::ComponentController;
use crate::error::StructuralError;
use crate::generation::Generation;
use crate::scope::handle::{ControllerSlot, RootInner};
use crate::scope::{ScopeHandle, ScopeId, ScopePath, ScopeRoot, StateUpdate, StateValue};

/// Outcome of resolving a path inside a build.
#[derive(Clone, Debug)]
pub struct ResolvedScope {
    pub id: ScopeId,
    /// The previous generation's handle for this path, if it had one.
    pub carried: Option<ScopeHandle>,
}

impl ResolvedScope {
    pub fn is_fresh(&self) -> bool {
        self.carried.is_none()
    }
}

/// Result of freezing a build's scope transaction.
#[derive(Debug)]
pub struct CommitOutcome {
    pub root: ScopeRoot,
    /// Handles of the previous root whose paths did not reappear, in id order.
    pub retired: Vec<ScopeHandle>,
    /// Sequences of updates whose scope never read its state in this build.
    pub unapplied: Vec<u64>,
}

struct Draft {
    id: ScopeId,
    path: ScopePath,
    state: Option<StateValue>,
    controller: Option<ControllerSlot>,
    origin: Option<ScopeHandle>,
    updates_applied: bool,
}

impl Draft {
    /// Folds this scope's pending updates into `value` once per build and
    /// records the result as the draft's state.
    fn apply_updates<T: Any + Send + Sync>(&mut self, updates: &[StateUpdate], value: Arc<T>) -> Arc<T> {
        let mut value = value;
        if !self.updates_applied {
            self.updates_applied = true;
            for update in updates.iter().filter(|update| update.scope() == self.id) {
                let current: StateValue = value.clone();
                match update.apply(&current).map(|next| next.downcast::<T>()) {
                    Some(Ok(next)) => value = next,
                    _ => warn!(
                        "state update {} for {} expects {}; ignored",
                        update.sequence(),
                        self.id,
                        update.expected_type()
                    ),
                }
            }
        }
        let erased: StateValue = value.clone();
        self.state = Some(erased);
        value
    }

    fn freeze(self) -> ScopeHandle {
        if let Some(origin) = &self.origin {
            let same_state = match (&self.state, &origin.inner.state) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            };
            let same_controller = match (&self.controller, &origin.inner.controller) {
                (Some(a), Some(b)) => a.ptr_eq(b),
                (None, None) => true,
                _ => false,
            };
            if same_state && same_controller {
                return origin.clone();
            }
        }
        ScopeHandle::new(self.id, self.path, self.state, self.controller)
    }
}

/// One build's transaction over the scope tree.
///
/// The store reads the previous [`ScopeRoot`] without modifying it, so any
/// number of builds may start from the same root concurrently. Nothing is
/// torn down while the tree is under construction: retired handles are only
/// reported by [`ScopeStore::commit`].
pub struct ScopeStore<'a> {
    previous: &'a ScopeRoot,
    updates: &'a [StateUpdate],
    drafts: HashMap<ScopePath, Draft>,
    next_id: u64,
}

impl<'a> ScopeStore<'a> {
    pub fn new(previous: &'a ScopeRoot, updates: &'a [StateUpdate]) -> Self {
        Self {
            previous,
            updates,
            drafts: HashMap::default(),
            next_id: previous.inner.next_id,
        }
    }

    pub fn previous(&self) -> &ScopeRoot {
        self.previous
    }

    /// Returns the handle identity for `path`, carrying the previous
    /// generation's handle when there is one and allocating otherwise.
    ///
    /// Resolving the same path twice in one build is a structural error.
    pub fn resolve(&mut self, path: &ScopePath) -> Result<ResolvedScope, StructuralError> {
        if self.drafts.contains_key(path) {
            return Err(StructuralError::DuplicatePath { path: path.clone() });
        }
        let carried = self.previous.handle(path).cloned();
        let id = match &carried {
            Some(handle) => handle.id(),
            None => {
                let id = ScopeId(self.next_id);
                self.next_id += 1;
                trace!("allocated {id} for {path}");
                id
            }
        };
        self.drafts.insert(
            path.clone(),
            Draft {
                id,
                path: path.clone(),
                state: carried.as_ref().and_then(|h| h.inner.state.clone()),
                controller: carried.as_ref().and_then(|h| h.inner.controller.clone()),
                origin: carried.clone(),
                updates_applied: false,
            },
        );
        Ok(ResolvedScope { id, carried })
    }

    pub fn is_resolved(&self, path: &ScopePath) -> bool {
        self.drafts.contains_key(path)
    }

    /// Reads the state at `path`, initialising it with `init` on first use,
    /// then folds in any pending updates addressed to this scope.
    pub fn state<T: Any + Send + Sync>(
        &mut self,
        path: &ScopePath,
        init: impl FnOnce() -> T,
    ) -> Result<Arc<T>, StructuralError> {
        match self.existing_state::<T>(path)? {
            Some(state) => Ok(state),
            None => Ok(self.store_state(path, init())),
        }
    }

    /// State already held at `path` (carried or stored earlier in this build).
    pub fn existing_state<T: Any + Send + Sync>(
        &mut self,
        path: &ScopePath,
    ) -> Result<Option<Arc<T>>, StructuralError> {
        let updates = self.updates;
        let draft = self
            .drafts
            .get_mut(path)
            .ok_or_else(|| StructuralError::UnresolvedScope { path: path.clone() })?;
        let Some(existing) = draft.state.clone() else {
            return Ok(None);
        };
        let typed = existing
            .downcast::<T>()
            .map_err(|_| StructuralError::StateTypeMismatch {
                path: path.clone(),
                expected: type_name::<T>(),
            })?;
        let typed = draft.apply_updates(updates, typed);
        Ok(Some(typed))
    }

    /// Stores a freshly initialised state value at `path`.
    ///
    /// Returns the value unstored if `path` was never resolved; the build has
    /// already recorded that error.
    pub fn store_state<T: Any + Send + Sync>(&mut self, path: &ScopePath, value: T) -> Arc<T> {
        let updates = self.updates;
        let value = Arc::new(value);
        match self.drafts.get_mut(path) {
            Some(draft) => draft.apply_updates(updates, value),
            None => value,
        }
    }

    /// Returns the controller at `path`, creating it on first use.
    pub fn controller<K: ComponentController>(
        &mut self,
        path: &ScopePath,
        init: impl FnOnce() -> K,
    ) -> Result<(Arc<K>, Arc<dyn ComponentController>), StructuralError> {
        let draft = self
            .drafts
            .get_mut(path)
            .ok_or_else(|| StructuralError::UnresolvedScope { path: path.clone() })?;
        let slot = match &draft.controller {
            Some(slot) => slot.clone(),
            None => {
                let slot = ControllerSlot::new(init());
                draft.controller = Some(slot.clone());
                slot
            }
        };
        let typed = slot
            .any
            .clone()
            .downcast::<K>()
            .map_err(|_| StructuralError::ControllerTypeMismatch {
                path: path.clone(),
                expected: type_name::<K>(),
            })?;
        Ok((typed, slot.controller))
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// Freezes the drafted handles into the root for `generation`.
    ///
    /// Handles whose state and controller were left untouched are carried
    /// forward as the same allocation.
    pub fn commit(self, generation: Generation) -> CommitOutcome {
        let previous = self.previous;
        let read: HashMap<ScopeId, bool> = self
            .drafts
            .values()
            .map(|draft| (draft.id, draft.updates_applied))
            .collect();
        let mut unapplied = Vec::new();
        for update in self.updates {
            match read.get(&update.scope()) {
                Some(true) => continue,
                Some(false) => warn!(
                    "state update {} for {}: state never read in this build; dropped",
                    update.sequence(),
                    update.scope()
                ),
                None => warn!(
                    "state update {} for {}: scope is not in this build; dropped",
                    update.sequence(),
                    update.scope()
                ),
            }
            unapplied.push(update.sequence());
        }
        let mut handles = HashMap::with_capacity(self.drafts.len());
        let mut by_id = HashMap::with_capacity(self.drafts.len());
        for (path, draft) in self.drafts {
            let handle = draft.freeze();
            by_id.insert(handle.id(), path.clone());
            handles.insert(path, handle);
        }
        let mut retired: Vec<ScopeHandle> = previous
            .inner
            .handles
            .iter()
            .filter(|(path, _)| !handles.contains_key(*path))
            .map(|(_, handle)| handle.clone())
            .collect();
        retired.sort_by_key(|handle| handle.id());
        let root = ScopeRoot {
            inner: Arc::new(RootInner {
                generation,
                handles,
                by_id,
                next_id: self.next_id,
            }),
        };
        CommitOutcome {
            root,
            retired,
            unapplied,
        }
    }
}

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::collections::map::HashMap;
use crate::component::ComponentController;
use crate::generation::Generation;
use crate::scope::ScopePath;

/// Type-erased state value held by a scope handle.
pub type StateValue = Arc<dyn Any + Send + Sync>;

/// Identity of one persistent state slot.
///
/// Ids are allocated from the scope root a build starts from, so they are
/// unique along the chain of applied roots of one hosting instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub(crate) u64);

impl ScopeId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

/// A component controller kept alive by a scope, stored twice: once for the
/// lifecycle hooks and once for typed access.
#[derive(Clone)]
pub(crate) struct ControllerSlot {
    pub(crate) controller: Arc<dyn ComponentController>,
    pub(crate) any: Arc<dyn Any + Send + Sync>,
}

impl ControllerSlot {
    pub(crate) fn new<K: ComponentController>(controller: K) -> Self {
        let typed = Arc::new(controller);
        Self {
            controller: typed.clone(),
            any: typed,
        }
    }

    pub(crate) fn ptr_eq(&self, other: &ControllerSlot) -> bool {
        Arc::ptr_eq(&self.any, &other.any)
    }
}

pub(crate) struct HandleInner {
    pub(crate) id: ScopeId,
    pub(crate) path: ScopePath,
    pub(crate) state: Option<StateValue>,
    pub(crate) controller: Option<ControllerSlot>,
}

/// One node's persistent state slot, frozen for one generation.
///
/// A handle never changes after the scope store commits it. A later build
/// either carries the same handle forward (same allocation) or replaces it
/// with a new handle that keeps the same [`ScopeId`].
#[derive(Clone)]
pub struct ScopeHandle {
    pub(crate) inner: Arc<HandleInner>,
}

impl ScopeHandle {
    pub(crate) fn new(
        id: ScopeId,
        path: ScopePath,
        state: Option<StateValue>,
        controller: Option<ControllerSlot>,
    ) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id,
                path,
                state,
                controller,
            }),
        }
    }

    pub fn id(&self) -> ScopeId {
        self.inner.id
    }

    pub fn path(&self) -> &ScopePath {
        &self.inner.path
    }

    pub fn has_state(&self) -> bool {
        self.inner.state.is_some()
    }

    /// Returns the state if one was stored and it has type `T`.
    pub fn state<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.inner.state.clone()?.downcast::<T>().ok()
    }

    pub fn raw_state(&self) -> Option<&StateValue> {
        self.inner.state.as_ref()
    }

    pub fn controller(&self) -> Option<&Arc<dyn ComponentController>> {
        self.inner.controller.as_ref().map(|slot| &slot.controller)
    }

    pub fn controller_as<K: ComponentController>(&self) -> Option<Arc<K>> {
        self.inner.controller.as_ref()?.any.clone().downcast::<K>().ok()
    }

    /// True when both handles are the same allocation.
    pub fn ptr_eq(&self, other: &ScopeHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ScopeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeHandle")
            .field("id", &self.inner.id)
            .field("path", &self.inner.path)
            .field("has_state", &self.inner.state.is_some())
            .field("has_controller", &self.inner.controller.is_some())
            .finish()
    }
}

pub(crate) struct RootInner {
    pub(crate) generation: Generation,
    pub(crate) handles: HashMap<ScopePath, ScopeHandle>,
    pub(crate) by_id: HashMap<ScopeId, ScopePath>,
    pub(crate) next_id: u64,
}

/// Immutable snapshot of every scope handle valid for one generation.
///
/// Cloning is cheap. Concurrent builds may read the same root; each build
/// produces its own successor through a [`ScopeStore`](crate::ScopeStore).
#[derive(Clone)]
pub struct ScopeRoot {
    pub(crate) inner: Arc<RootInner>,
}

impl ScopeRoot {
    /// Root with no handles, used before anything was built.
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(RootInner {
                generation: 0,
                handles: HashMap::default(),
                by_id: HashMap::default(),
                next_id: 1,
            }),
        }
    }

    /// Generation of the build that committed this root; 0 for the empty root.
    pub fn generation(&self) -> Generation {
        self.inner.generation
    }

    pub fn len(&self) -> usize {
        self.inner.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.handles.is_empty()
    }

    pub fn handle(&self, path: &ScopePath) -> Option<&ScopeHandle> {
        self.inner.handles.get(path)
    }

    pub fn handle_by_id(&self, id: ScopeId) -> Option<&ScopeHandle> {
        let path = self.inner.by_id.get(&id)?;
        self.inner.handles.get(path)
    }

    pub fn contains(&self, path: &ScopePath) -> bool {
        self.inner.handles.contains_key(path)
    }

    /// Handles in id order.
    pub fn handles(&self) -> Vec<&ScopeHandle> {
        let mut handles: Vec<&ScopeHandle> = self.inner.handles.values().collect();
        handles.sort_by_key(|handle| handle.id());
        handles
    }

    /// True when both roots hold exactly the same handle allocations.
    pub fn shares_all_handles_with(&self, other: &ScopeRoot) -> bool {
        self.len() == other.len()
            && self.inner.handles.iter().all(|(path, handle)| {
                other
                    .handle(path)
                    .is_some_and(|candidate| candidate.ptr_eq(handle))
            })
    }

    pub fn ptr_eq(&self, other: &ScopeRoot) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for ScopeRoot {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for ScopeRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeRoot")
            .field("generation", &self.inner.generation)
            .field("handles", &self.inner.handles.len())
            .field("next_id", &self.inner.next_id)
            .finish()
    }
}

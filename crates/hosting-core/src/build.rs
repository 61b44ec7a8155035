//! The build engine: model and context in, immutable [`BuildResult`] out.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use hosting_ui_layout::SizeRange;
use log::debug;

use crate::animation::{AnimationHint, AnimationPhase};
use crate::component::ComponentProvider;
use crate::error::BuildError;
use crate::generation::Generation;
use crate::layout::{compute_layout, LayoutTree};
use crate::predicate::{PredicateMatches, PredicateSet};
use crate::scope::{ScopeHandle, ScopeRoot, ScopeStore, StateUpdate};
use crate::tree::{CollisionPolicy, ComponentTree, TreeBuilder};

/// How an update request is dispatched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BuildMode {
    /// Build on the calling thread and mount before returning.
    #[default]
    Synchronous,
    /// Hand the build to the worker; mount when the render loop collects it.
    Asynchronous,
}

/// Everything one build reads.
pub struct BuildInputs<'r, M, C> {
    pub model: &'r M,
    pub context: &'r C,
    pub size_range: SizeRange,
    pub previous: &'r ScopeRoot,
    pub generation: Generation,
    /// Pending state updates, in sequence order.
    pub state_updates: &'r [StateUpdate],
}

struct EngineInner<M, C> {
    provider: Box<dyn ComponentProvider<M, C>>,
    predicates: Arc<PredicateSet>,
    policy: CollisionPolicy,
}

/// Runs the component provider and packages what it produced.
///
/// The engine holds no mutable state, so clones may build concurrently on
/// any threads. A build reads its previous root and never touches views.
pub struct BuildEngine<M, C> {
    inner: Arc<EngineInner<M, C>>,
}

impl<M, C> Clone for BuildEngine<M, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: 'static, C: 'static> BuildEngine<M, C> {
    pub fn new(
        provider: impl ComponentProvider<M, C>,
        predicates: PredicateSet,
        policy: CollisionPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                provider: Box::new(provider),
                predicates: Arc::new(predicates),
                policy,
            }),
        }
    }

    pub fn predicates(&self) -> &Arc<PredicateSet> {
        &self.inner.predicates
    }

    pub fn collision_policy(&self) -> CollisionPolicy {
        self.inner.policy
    }

    pub fn build(
        &self,
        model: &M,
        context: &C,
        size_range: SizeRange,
        previous: &ScopeRoot,
        generation: Generation,
    ) -> Result<BuildResult, BuildError> {
        self.build_with(BuildInputs {
            model,
            context,
            size_range,
            previous,
            generation,
            state_updates: &[],
        })
    }

    pub fn build_with(&self, inputs: BuildInputs<'_, M, C>) -> Result<BuildResult, BuildError> {
        let BuildInputs {
            model,
            context,
            size_range,
            previous,
            generation,
            state_updates,
        } = inputs;
        debug!(
            "build {generation} starting from root {} ({} scopes, {} pending updates)",
            previous.generation(),
            previous.len(),
            state_updates.len()
        );

        // Provider code and every component `measure` run inside the guard.
        let built = panic::catch_unwind(AssertUnwindSafe(|| -> Result<_, BuildError> {
            let store = ScopeStore::new(previous, state_updates);
            let mut builder = TreeBuilder::new(store, self.inner.policy)?;
            self.inner
                .provider
                .provide(model, context, &mut builder)
                .map_err(BuildError::Provider)?;
            let (tree, store) = builder.finish()?;
            let matches = PredicateMatches::evaluate(&tree, &self.inner.predicates);
            let layout = compute_layout(&tree, size_range.to_constraints());
            let animations = collect_animations(&tree, previous);
            let outcome = store.commit(generation);
            Ok((tree, matches, layout, animations, outcome))
        }));
        let (tree, matches, layout, animations, outcome) = match built {
            Ok(built) => built?,
            Err(payload) => return Err(BuildError::ProviderPanicked(panic_message(payload))),
        };
        let state_updates_through = state_updates.iter().map(StateUpdate::sequence).max();

        debug!(
            "build {generation} produced {} nodes, {} scopes, {} retired, size {}",
            tree.len(),
            outcome.root.len(),
            outcome.retired.len(),
            layout.size()
        );
        Ok(BuildResult {
            inner: Arc::new(ResultInner {
                generation,
                tree,
                scope_root: outcome.root,
                layout,
                size_range,
                matches,
                animations,
                retired: outcome.retired,
                unapplied_state_updates: outcome.unapplied,
                state_updates_through,
            }),
        })
    }
}

impl<M, C> fmt::Debug for BuildEngine<M, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildEngine")
            .field("predicates", &self.inner.predicates)
            .field("policy", &self.inner.policy)
            .finish()
    }
}

/// Initial hints for scoped nodes that are new, change hints for carried ones.
fn collect_animations(tree: &ComponentTree, previous: &ScopeRoot) -> Vec<AnimationHint> {
    let mut hints = Vec::new();
    for (_, node) in tree.iter() {
        if node.scope().is_none() {
            continue;
        }
        let phase = if previous.contains(node.path()) {
            AnimationPhase::Change
        } else {
            AnimationPhase::Initial
        };
        hints.extend(
            node.component()
                .animations(phase)
                .into_iter()
                .filter(|animation| animation.phase == phase)
                .map(|animation| AnimationHint {
                    path: node.path().clone(),
                    animation,
                }),
        );
    }
    hints
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

struct ResultInner {
    generation: Generation,
    tree: ComponentTree,
    scope_root: ScopeRoot,
    layout: LayoutTree,
    size_range: SizeRange,
    matches: PredicateMatches,
    animations: Vec<AnimationHint>,
    retired: Vec<ScopeHandle>,
    unapplied_state_updates: Vec<u64>,
    state_updates_through: Option<u64>,
}

/// Immutable output of one build. Cloning shares the same result.
#[derive(Clone)]
pub struct BuildResult {
    inner: Arc<ResultInner>,
}

impl BuildResult {
    pub fn generation(&self) -> Generation {
        self.inner.generation
    }

    pub fn tree(&self) -> &ComponentTree {
        &self.inner.tree
    }

    pub fn scope_root(&self) -> &ScopeRoot {
        &self.inner.scope_root
    }

    pub fn layout(&self) -> &LayoutTree {
        &self.inner.layout
    }

    pub fn size_range(&self) -> SizeRange {
        self.inner.size_range
    }

    pub fn matches(&self) -> &PredicateMatches {
        &self.inner.matches
    }

    pub fn animations(&self) -> &[AnimationHint] {
        &self.inner.animations
    }

    /// Handles of the root this build started from that it dropped.
    pub fn retired(&self) -> &[ScopeHandle] {
        &self.inner.retired
    }

    /// Sequences of consumed updates whose scope did not read its state.
    pub fn unapplied_state_updates(&self) -> &[u64] {
        &self.inner.unapplied_state_updates
    }

    /// Highest state update sequence folded into this result.
    pub fn state_updates_through(&self) -> Option<u64> {
        self.inner.state_updates_through
    }

    pub fn ptr_eq(&self, other: &BuildResult) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildResult")
            .field("generation", &self.inner.generation)
            .field("nodes", &self.inner.tree.len())
            .field("scope_root", &self.inner.scope_root)
            .field("size", &self.inner.layout.size())
            .field("retired", &self.inner.retired.len())
            .finish()
    }
}

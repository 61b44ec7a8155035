//! Predicate registry and the per-build match cache.
//!
//! Predicates are registered once when a hosting instance is created and are
//! evaluated in a single pre-order traversal of every tree that instance
//! builds. Predicates must be pure; nothing here guards against side effects.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::component::{Component, ComponentController};
use crate::tree::{ComponentTree, NodeIndex};

pub type ComponentPredicate = fn(&dyn Component) -> bool;
pub type ControllerPredicate = fn(&dyn ComponentController) -> bool;

/// Position of a predicate within its family, in registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PredicateId(pub usize);

/// The immutable set of predicates one hosting instance evaluates.
///
/// Names are unique per family; registering a name again replaces the earlier
/// predicate while keeping its position.
#[derive(Clone, Default)]
pub struct PredicateSet {
    components: IndexMap<&'static str, ComponentPredicate>,
    controllers: IndexMap<&'static str, ControllerPredicate>,
}

impl PredicateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component(mut self, name: &'static str, predicate: ComponentPredicate) -> Self {
        self.components.insert(name, predicate);
        self
    }

    pub fn with_controller(mut self, name: &'static str, predicate: ControllerPredicate) -> Self {
        self.controllers.insert(name, predicate);
        self
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn controller_count(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.controllers.is_empty()
    }

    pub fn component_id(&self, name: &str) -> Option<PredicateId> {
        self.components.get_index_of(name).map(PredicateId)
    }

    pub fn controller_id(&self, name: &str) -> Option<PredicateId> {
        self.controllers.get_index_of(name).map(PredicateId)
    }
}

impl fmt::Debug for PredicateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateSet")
            .field("components", &self.components.keys().collect::<Vec<_>>())
            .field("controllers", &self.controllers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Nodes matching each predicate of a [`PredicateSet`] for one tree.
///
/// Lists hold node indices in traversal order; a node appears at most once
/// per predicate.
#[derive(Clone)]
pub struct PredicateMatches {
    set: Arc<PredicateSet>,
    components: Vec<Vec<NodeIndex>>,
    controllers: Vec<Vec<NodeIndex>>,
}

impl PredicateMatches {
    /// Runs every predicate against every node in one traversal.
    pub fn evaluate(tree: &ComponentTree, set: &Arc<PredicateSet>) -> Self {
        let mut components = vec![Vec::new(); set.components.len()];
        let mut controllers = vec![Vec::new(); set.controllers.len()];
        if !set.is_empty() {
            for (index, node) in tree.iter() {
                for (slot, predicate) in set.components.values().enumerate() {
                    if predicate(node.component()) {
                        components[slot].push(index);
                    }
                }
                if let Some(controller) = node.controller() {
                    for (slot, predicate) in set.controllers.values().enumerate() {
                        if predicate(controller.as_ref()) {
                            controllers[slot].push(index);
                        }
                    }
                }
            }
        }
        Self {
            set: Arc::clone(set),
            components,
            controllers,
        }
    }

    pub fn empty() -> Self {
        Self {
            set: Arc::new(PredicateSet::new()),
            components: Vec::new(),
            controllers: Vec::new(),
        }
    }

    pub fn set(&self) -> &Arc<PredicateSet> {
        &self.set
    }

    /// Nodes whose component satisfied the named predicate.
    pub fn components_matching(&self, name: &str) -> &[NodeIndex] {
        self.set
            .component_id(name)
            .map(|id| self.component_matches(id))
            .unwrap_or(&[])
    }

    /// Nodes whose controller satisfied the named predicate.
    pub fn controllers_matching(&self, name: &str) -> &[NodeIndex] {
        self.set
            .controller_id(name)
            .map(|id| self.controller_matches(id))
            .unwrap_or(&[])
    }

    pub fn component_matches(&self, id: PredicateId) -> &[NodeIndex] {
        self.components.get(id.0).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn controller_matches(&self, id: PredicateId) -> &[NodeIndex] {
        self.controllers.get(id.0).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total entries across every list.
    pub fn total(&self) -> usize {
        self.components.iter().chain(&self.controllers).map(Vec::len).sum()
    }
}

impl fmt::Debug for PredicateMatches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let components: IndexMap<_, _> = self.set.components.keys().zip(&self.components).collect();
        let controllers: IndexMap<_, _> = self.set.controllers.keys().zip(&self.controllers).collect();
        f.debug_struct("PredicateMatches")
            .field("components", &components)
            .field("controllers", &controllers)
            .finish()
    }
}

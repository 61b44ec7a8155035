//! Component trees and the builder the provider writes into.

use std::any::Any;
use std::hash::Hash;
use std::sync::Arc;

use log::warn;

use crate::collections::map::HashMap;
use crate::component::{Component, ComponentController};
use crate::error::StructuralError;
use crate::hash::hash_one;
use crate::scope::{
    ComponentKind, PathSegment, ResolvedScope, ScopeId, ScopePath, ScopeStore, SegmentKey,
};

/// Index of a node in its tree's pre-order arena.
pub type NodeIndex = usize;

/// What to do when two siblings claim the same structural path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Fail the build with [`StructuralError::DuplicatePath`].
    Fail,
    /// Keep building; later duplicates get an occurrence suffix.
    Disambiguate,
}

impl Default for CollisionPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            CollisionPolicy::Fail
        } else {
            CollisionPolicy::Disambiguate
        }
    }
}

#[derive(Clone)]
pub struct ComponentNode {
    path: ScopePath,
    component: Arc<dyn Component>,
    scope: Option<ScopeId>,
    controller: Option<Arc<dyn ComponentController>>,
    parent: Option<NodeIndex>,
    children: Vec<NodeIndex>,
}

impl ComponentNode {
    pub fn path(&self) -> &ScopePath {
        &self.path
    }

    pub fn component(&self) -> &dyn Component {
        self.component.as_ref()
    }

    pub fn component_arc(&self) -> &Arc<dyn Component> {
        &self.component
    }

    /// Scope of this node, if it asked for state or a controller.
    pub fn scope(&self) -> Option<ScopeId> {
        self.scope
    }

    pub fn controller(&self) -> Option<&Arc<dyn ComponentController>> {
        self.controller.as_ref()
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }
}

impl std::fmt::Debug for ComponentNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentNode")
            .field("path", &self.path)
            .field("component", &self.component)
            .field("scope", &self.scope)
            .field("children", &self.children)
            .finish()
    }
}

/// Immutable component tree for one generation, stored in pre-order.
#[derive(Clone, Debug)]
pub struct ComponentTree {
    nodes: Vec<ComponentNode>,
}

impl ComponentTree {
    pub const ROOT: NodeIndex = 0;

    pub fn root(&self) -> &ComponentNode {
        &self.nodes[Self::ROOT]
    }

    pub fn node(&self, index: NodeIndex) -> Option<&ComponentNode> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in traversal (pre-)order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &ComponentNode)> {
        self.nodes.iter().enumerate()
    }

    pub fn find(&self, path: &ScopePath) -> Option<NodeIndex> {
        self.nodes.iter().position(|node| &node.path == path)
    }

    /// Controllers in traversal order, with their node index and scope.
    pub fn controllers(
        &self,
    ) -> impl Iterator<Item = (NodeIndex, ScopeId, &Arc<dyn ComponentController>)> {
        self.nodes.iter().enumerate().filter_map(|(index, node)| {
            Some((index, node.scope?, node.controller.as_ref()?))
        })
    }
}

struct PendingNode {
    path: ScopePath,
    component: Option<Arc<dyn Component>>,
    scope: Option<ScopeId>,
    controller: Option<Arc<dyn ComponentController>>,
    parent: Option<NodeIndex>,
    children: Vec<NodeIndex>,
    siblings: SiblingKeys,
}

#[derive(Default)]
struct SiblingKeys {
    ordinals: HashMap<ComponentKind, u32>,
    keyed: HashMap<(ComponentKind, u64), u32>,
}

/// Receives the nodes a component provider emits.
///
/// Nodes are addressed by the path of their ancestors plus their own type and
/// either a caller key or their ordinal among un-keyed siblings of that type.
pub struct TreeBuilder<'a> {
    store: ScopeStore<'a>,
    policy: CollisionPolicy,
    nodes: Vec<PendingNode>,
    parents: Vec<NodeIndex>,
    roots: SiblingKeys,
    root_count: usize,
    errors: Vec<StructuralError>,
    root_scope: ResolvedScope,
}

impl<'a> TreeBuilder<'a> {
    pub(crate) fn new(mut store: ScopeStore<'a>, policy: CollisionPolicy) -> Result<Self, StructuralError> {
        let root_scope = store.resolve(&ScopePath::root())?;
        Ok(Self {
            store,
            policy,
            nodes: Vec::new(),
            parents: Vec::new(),
            roots: SiblingKeys::default(),
            root_count: 0,
            errors: Vec::new(),
            root_scope,
        })
    }

    /// The handle resolved for the empty path before the provider runs.
    pub fn root_scope(&self) -> &ResolvedScope {
        &self.root_scope
    }

    /// Emits a node keyed by its position among same-typed siblings.
    pub fn child<T: Component>(&mut self, build: impl FnOnce(&mut NodeBuilder<'_, 'a>) -> T) -> NodeIndex {
        self.emit(None, build)
    }

    /// Emits a node keyed by `key`, stable across reordering.
    pub fn keyed_child<K: Hash + ?Sized, T: Component>(
        &mut self,
        key: &K,
        build: impl FnOnce(&mut NodeBuilder<'_, 'a>) -> T,
    ) -> NodeIndex {
        self.emit(Some(hash_one(key)), build)
    }

    /// Shorthand for a stateless leaf.
    pub fn leaf<T: Component>(&mut self, component: T) -> NodeIndex {
        self.emit(None, |_| component)
    }

    fn emit<T: Component>(
        &mut self,
        key: Option<u64>,
        build: impl FnOnce(&mut NodeBuilder<'_, 'a>) -> T,
    ) -> NodeIndex {
        let kind = ComponentKind::of::<T>();
        let parent = self.parents.last().copied();
        let parent_path = match parent {
            Some(index) => self.nodes[index].path.clone(),
            None => ScopePath::root(),
        };
        let segment_key = self.segment_key(parent, kind, key, &parent_path);
        let path = parent_path.child(PathSegment::new(kind, segment_key));

        let index = self.nodes.len();
        match parent {
            Some(parent) => self.nodes[parent].children.push(index),
            None => {
                self.root_count += 1;
                if self.root_count > 1 {
                    self.errors
                        .push(StructuralError::MultipleRoots { extra: path.clone() });
                }
            }
        }
        self.nodes.push(PendingNode {
            path: path.clone(),
            component: None,
            scope: None,
            controller: None,
            parent,
            children: Vec::new(),
            siblings: SiblingKeys::default(),
        });

        let component = {
            let mut node = NodeBuilder {
                tree: self,
                index,
                path,
            };
            build(&mut node)
        };
        self.nodes[index].component = Some(Arc::new(component));
        index
    }

    fn segment_key(
        &mut self,
        parent: Option<NodeIndex>,
        kind: ComponentKind,
        key: Option<u64>,
        parent_path: &ScopePath,
    ) -> SegmentKey {
        let siblings = match parent {
            Some(index) => &mut self.nodes[index].siblings,
            None => &mut self.roots,
        };
        let Some(key) = key else {
            let ordinal = siblings.ordinals.entry(kind).or_insert(0);
            let key = SegmentKey::Ordinal(*ordinal);
            *ordinal += 1;
            return key;
        };
        let seen = siblings.keyed.entry((kind, key)).or_insert(0);
        let occurrence = *seen;
        *seen += 1;
        if occurrence == 0 {
            return SegmentKey::Keyed(key);
        }
        let path = parent_path.child(PathSegment::new(kind, SegmentKey::Keyed(key)));
        match self.policy {
            CollisionPolicy::Fail => {
                self.errors.push(StructuralError::DuplicatePath { path });
                SegmentKey::Keyed(key)
            }
            CollisionPolicy::Disambiguate => {
                warn!("duplicate scope path {path}; disambiguating as occurrence {occurrence}");
                SegmentKey::Disambiguated { key, occurrence }
            }
        }
    }

    pub(crate) fn finish(self) -> Result<(ComponentTree, ScopeStore<'a>), StructuralError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }
        if self.root_count == 0 {
            return Err(StructuralError::NoRoot);
        }
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for pending in self.nodes {
            let Some(component) = pending.component else {
                // Only reachable if a build closure unwound mid-node.
                return Err(StructuralError::UnresolvedScope { path: pending.path });
            };
            nodes.push(ComponentNode {
                path: pending.path,
                component,
                scope: pending.scope,
                controller: pending.controller,
                parent: pending.parent,
                children: pending.children,
            });
        }
        Ok((ComponentTree { nodes }, self.store))
    }
}

/// Per-node view of the builder, handed to the closure that constructs it.
pub struct NodeBuilder<'t, 'a> {
    tree: &'t mut TreeBuilder<'a>,
    index: NodeIndex,
    path: ScopePath,
}

impl<'t, 'a> NodeBuilder<'t, 'a> {
    pub fn path(&self) -> &ScopePath {
        &self.path
    }

    /// Resolves this node's scope, returning its persistent id.
    pub fn scope(&mut self) -> ScopeId {
        if let Some(id) = self.tree.nodes[self.index].scope {
            return id;
        }
        let id = match self.tree.store.resolve(&self.path) {
            Ok(resolved) => resolved.id,
            Err(err) => {
                self.tree.errors.push(err);
                // Unreachable through the builder's own paths; keep going so the
                // build can report the first error.
                ScopeId(0)
            }
        };
        self.tree.nodes[self.index].scope = Some(id);
        id
    }

    /// The node's persistent state, created with `init` the first time the
    /// path is seen and carried across builds while the path is stable.
    pub fn state<S: Any + Send + Sync>(&mut self, init: impl FnOnce() -> S) -> Arc<S> {
        self.scope();
        match self.tree.store.existing_state::<S>(&self.path) {
            Ok(Some(state)) => state,
            Ok(None) => self.tree.store.store_state(&self.path, init()),
            Err(err) => {
                self.tree.errors.push(err);
                Arc::new(init())
            }
        }
    }

    /// The node's controller, created with `init` on first use.
    pub fn controller<K: ComponentController>(&mut self, init: impl FnOnce() -> K) -> Option<Arc<K>> {
        self.scope();
        match self.tree.store.controller(&self.path, init) {
            Ok((typed, erased)) => {
                self.tree.nodes[self.index].controller = Some(erased);
                Some(typed)
            }
            Err(err) => {
                self.tree.errors.push(err);
                None
            }
        }
    }

    /// Emits this node's children.
    pub fn children(&mut self, content: impl FnOnce(&mut TreeBuilder<'a>)) {
        self.tree.parents.push(self.index);
        content(self.tree);
        self.tree.parents.pop();
    }
}

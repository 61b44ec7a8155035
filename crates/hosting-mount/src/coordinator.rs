//! Diffs build results against the mounted hierarchy and applies them.

use std::cmp::Reverse;
use std::sync::Arc;

use hosting_core::collections::map::HashMap;
use hosting_core::{
    Animation, AnimationPhase, AppliedGeneration, Attributes, BuildResult, ComponentController,
    ComponentTree, Generation, LayoutBox, RenderThread, ScopeHandle, ScopePath, ViewClass, ViewSpec,
};
use hosting_ui_graphics::{Point, Rect};
use log::{debug, trace, warn};

use crate::{MountError, ViewContainer, ViewError, ViewId};

/// What one `apply` changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MountStats {
    pub generation: Generation,
    pub created: usize,
    pub reused: usize,
    /// Reused views whose frame or attributes changed.
    pub updated: usize,
    /// Reused views attached under a new parent or at a new position.
    pub moved: usize,
    pub removed: usize,
    /// Controllers told their scope disappeared.
    pub invalidated: usize,
    /// The result was already mounted; nothing was touched.
    pub skipped: bool,
}

/// The mounted view under a point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hit {
    pub path: ScopePath,
    pub view: ViewId,
}

struct MountedView {
    view: ViewId,
    class: ViewClass,
    /// `None` until the container has been given a frame.
    frame: Option<Rect>,
    attributes: Attributes,
}

struct DesiredView {
    path: ScopePath,
    spec: ViewSpec,
    /// Relative to the parent view.
    frame: Rect,
    parent: Option<ScopePath>,
    index: usize,
}

/// Owns the live view hierarchy for one hosting instance.
///
/// Views are keyed by the same structural path the scope store uses, so a
/// view is reused exactly when its node's path survives a rebuild. All
/// mutation happens on the thread that created the coordinator.
pub struct MountCoordinator {
    render: RenderThread,
    applied: Arc<AppliedGeneration>,
    mounted: HashMap<ScopePath, MountedView>,
    current: Option<BuildResult>,
}

impl Default for MountCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl MountCoordinator {
    /// Binds a coordinator to the calling (rendering) thread.
    pub fn new() -> Self {
        Self::with_applied(Arc::new(AppliedGeneration::new()))
    }

    /// Binds to the calling thread, recording applied generations in `applied`.
    pub fn with_applied(applied: Arc<AppliedGeneration>) -> Self {
        Self {
            render: RenderThread::current(),
            applied,
            mounted: HashMap::default(),
            current: None,
        }
    }

    pub fn render_thread(&self) -> RenderThread {
        self.render
    }

    pub fn last_applied(&self) -> Generation {
        self.applied.get()
    }

    /// The result the hierarchy currently reflects.
    pub fn current(&self) -> Option<&BuildResult> {
        self.current.as_ref()
    }

    pub fn view_for(&self, path: &ScopePath) -> Option<ViewId> {
        self.mounted.get(path).map(|mounted| mounted.view)
    }

    pub fn mounted_len(&self) -> usize {
        self.mounted.len()
    }

    /// Mounts `result`, reusing every view whose path is unchanged.
    ///
    /// Results older than the last applied one are rejected. Applying the
    /// mounted result again is a no-op.
    pub fn apply(
        &mut self,
        result: &BuildResult,
        container: &mut dyn ViewContainer,
    ) -> Result<MountStats, MountError> {
        self.render.assert_current("MountCoordinator::apply");
        let generation = result.generation();
        let last_applied = self.applied.get();
        if generation < last_applied {
            warn!("rejecting generation {generation}: generation {last_applied} is already mounted");
            return Err(MountError::Stale {
                generation,
                last_applied,
            });
        }
        if self.current.as_ref().is_some_and(|current| current.ptr_eq(result)) {
            debug!("generation {generation} already mounted");
            return Ok(MountStats {
                generation,
                skipped: true,
                ..MountStats::default()
            });
        }

        let mut stats = MountStats {
            generation,
            ..MountStats::default()
        };
        let desired = desired_views(result);
        let wanted: HashMap<&ScopePath, ViewClass> = desired
            .iter()
            .map(|view| (&view.path, view.spec.class))
            .collect();

        // Reused views are checked before anything is touched, so a container
        // that lost a view fails the apply without partial mutation.
        for target in &desired {
            if let Some(mounted) = self.mounted.get(&target.path) {
                if mounted.class != target.spec.class {
                    continue;
                }
                if container.class_of(mounted.view)? != mounted.class {
                    return Err(ViewError::ClassMismatch {
                        id: mounted.view,
                        expected: mounted.class,
                    }
                    .into());
                }
            }
        }

        let mut removals: Vec<(ScopePath, ViewId)> = self
            .mounted
            .iter()
            .filter(|(path, mounted)| wanted.get(path) != Some(&mounted.class))
            .map(|(path, mounted)| (path.clone(), mounted.view))
            .collect();
        removals.sort_by_key(|(path, _)| Reverse(path.depth()));
        for (path, view) in removals {
            if let Some(previous) = &self.current {
                for animation in final_animations(previous.tree(), &path) {
                    container.animate(view, &animation);
                }
            }
            container.remove_view(view)?;
            self.mounted.remove(&path);
            trace!("removed view {view} at {path}");
            stats.removed += 1;
        }

        // `mounted` records each view as soon as it exists and each property
        // once it is set. If the container fails part way, `current` still
        // names the previous result and the next apply finishes the diff.
        let root_view = container.root();
        for target in &desired {
            let parent_view = target
                .parent
                .as_ref()
                .and_then(|parent| self.mounted.get(parent))
                .map(|mounted| mounted.view)
                .unwrap_or(root_view);
            let mut created = false;
            let mounted = self.mounted.entry(target.path.clone()).or_insert_with(|| {
                created = true;
                MountedView {
                    view: container.create_view(target.spec.class),
                    class: target.spec.class,
                    frame: None,
                    attributes: Attributes::new(),
                }
            });
            let mut changed = sync_attributes(
                container,
                mounted.view,
                &mut mounted.attributes,
                &target.spec.attributes,
            )?;
            if mounted.frame != Some(target.frame) {
                container.set_frame(mounted.view, target.frame)?;
                mounted.frame = Some(target.frame);
                changed = true;
            }
            let attached = container.parent_of(mounted.view) == Some((parent_view, target.index));
            if !attached {
                container.insert_child(parent_view, mounted.view, target.index)?;
            }
            if created {
                trace!("created {} view {} at {}", target.spec.class, mounted.view, target.path);
                stats.created += 1;
                continue;
            }
            stats.reused += 1;
            if !attached {
                stats.moved += 1;
            }
            if changed {
                trace!("updated view {} at {}", mounted.view, target.path);
                stats.updated += 1;
            }
        }

        // Lifecycle follows structural paths and controller identity, so a
        // result built from another root lineage is handled like any other.
        let previous_root = self.current.as_ref().map(|current| current.scope_root().clone());
        let mut live: Vec<&Arc<dyn ComponentController>> = Vec::new();
        for (index, _, controller) in result.tree().controllers() {
            live.push(controller);
            let was_mounted = previous_root.as_ref().is_some_and(|root| {
                result
                    .tree()
                    .node(index)
                    .and_then(|node| root.handle(node.path()))
                    .and_then(ScopeHandle::controller)
                    .is_some_and(|previous| Arc::ptr_eq(previous, controller))
            });
            if was_mounted {
                controller.did_update();
            } else {
                controller.did_mount();
            }
        }

        if let Some(previous_root) = &previous_root {
            for handle in previous_root.handles() {
                let Some(controller) = handle.controller() else {
                    continue;
                };
                if live.iter().any(|current| Arc::ptr_eq(current, controller)) {
                    continue;
                }
                controller.invalidate();
                stats.invalidated += 1;
            }
        }

        for hint in result.animations() {
            if let Some(mounted) = self.mounted.get(&hint.path) {
                container.animate(mounted.view, &hint.animation);
            }
        }

        self.applied.advance(generation);
        // Dropping the previous result releases its scope root and the
        // handles this generation retired.
        self.current = Some(result.clone());
        debug!(
            "mounted generation {generation}: {} created, {} reused, {} removed, {} retired scopes",
            stats.created,
            stats.reused,
            stats.removed,
            result.retired().len()
        );
        Ok(stats)
    }

    /// The topmost mounted view whose frame contains `point`.
    pub fn hit_test(&self, point: Point) -> Option<Hit> {
        self.render.assert_current("MountCoordinator::hit_test");
        let current = self.current.as_ref()?;
        current
            .layout()
            .frames()
            .into_iter()
            .rev()
            .find_map(|(layout, frame)| {
                if !frame.contains(point) {
                    return None;
                }
                let mounted = self.mounted.get(&layout.path)?;
                Some(Hit {
                    path: layout.path.clone(),
                    view: mounted.view,
                })
            })
    }
}

fn desired_views(result: &BuildResult) -> Vec<DesiredView> {
    let mut out = Vec::new();
    let mut positions: HashMap<Option<ScopePath>, usize> = HashMap::default();
    collect_desired(
        result.tree(),
        result.layout().root(),
        Point::ZERO,
        None,
        Point::ZERO,
        &mut positions,
        &mut out,
    );
    out
}

/// Pre-order walk assigning each view-backed node to its nearest view-backed
/// ancestor (or the container root).
fn collect_desired<'l>(
    tree: &ComponentTree,
    layout: &'l LayoutBox,
    parent_origin: Point,
    view_parent: Option<&'l ScopePath>,
    view_origin: Point,
    positions: &mut HashMap<Option<ScopePath>, usize>,
    out: &mut Vec<DesiredView>,
) {
    let frame = layout.rect.translate(parent_origin);
    let spec = tree.node(layout.node).and_then(|node| node.component().view());
    let (child_parent, child_origin) = match spec {
        Some(spec) => {
            let position = positions.entry(view_parent.cloned()).or_insert(0);
            let index = *position;
            *position += 1;
            let relative = Point::new(frame.origin.x - view_origin.x, frame.origin.y - view_origin.y);
            out.push(DesiredView {
                path: layout.path.clone(),
                spec,
                frame: Rect::new(relative, frame.size),
                parent: view_parent.cloned(),
                index,
            });
            (Some(&layout.path), frame.origin)
        }
        None => (view_parent, view_origin),
    };
    for child in &layout.children {
        collect_desired(tree, child, frame.origin, child_parent, child_origin, positions, out);
    }
}

fn sync_attributes(
    container: &mut dyn ViewContainer,
    view: ViewId,
    current: &mut Attributes,
    desired: &Attributes,
) -> Result<bool, ViewError> {
    let mut changed = false;
    let stale: Vec<&'static str> = current
        .keys()
        .filter(|name| !desired.contains_key(*name))
        .copied()
        .collect();
    for name in stale {
        container.clear_attribute(view, name)?;
        current.shift_remove(name);
        changed = true;
    }
    for (name, value) in desired {
        if current.get(name) != Some(value) {
            container.set_attribute(view, *name, value)?;
            current.insert(*name, value.clone());
            changed = true;
        }
    }
    Ok(changed)
}

fn final_animations(tree: &ComponentTree, path: &ScopePath) -> Vec<Animation> {
    tree.find(path)
        .and_then(|index| tree.node(index))
        .map(|node| {
            node.component()
                .animations(AnimationPhase::Final)
                .into_iter()
                .filter(|animation| animation.phase == AnimationPhase::Final)
                .collect()
        })
        .unwrap_or_default()
}

use std::fmt::Write as _;

use hosting_core::collections::map::HashMap;
use hosting_core::{Animation, AttributeValue, Attributes, ViewClass};
use hosting_ui_graphics::Rect;

use crate::{ViewContainer, ViewError, ViewId};

/// Class of the root view of a [`MemoryViewContainer`].
pub const CONTAINER_CLASS: ViewClass = ViewClass("container");

#[derive(Clone, Debug)]
pub struct MemoryView {
    pub class: ViewClass,
    pub parent: Option<ViewId>,
    pub children: Vec<ViewId>,
    pub frame: Rect,
    pub attributes: Attributes,
    pub animations: Vec<Animation>,
    live: bool,
}

impl MemoryView {
    fn new(class: ViewClass) -> Self {
        Self {
            class,
            parent: None,
            children: Vec::new(),
            frame: Rect::default(),
            attributes: Attributes::new(),
            animations: Vec::new(),
            live: true,
        }
    }

    pub fn is_live(&self) -> bool {
        self.live
    }
}

/// Running totals of container mutations, for asserting minimal diffs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MutationCounters {
    pub created: usize,
    pub recycled: usize,
    pub inserted: usize,
    pub removed: usize,
    pub frames: usize,
    pub attributes_set: usize,
    pub attributes_cleared: usize,
    pub animations: usize,
}

impl MutationCounters {
    /// Total structural and property changes.
    pub fn mutations(&self) -> usize {
        self.created
            + self.recycled
            + self.inserted
            + self.removed
            + self.frames
            + self.attributes_set
            + self.attributes_cleared
    }
}

/// In-memory view hierarchy with a per-class recycle pool.
#[derive(Debug)]
pub struct MemoryViewContainer {
    views: Vec<MemoryView>,
    root: ViewId,
    pool: HashMap<ViewClass, Vec<ViewId>>,
    counters: MutationCounters,
}

impl Default for MemoryViewContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryViewContainer {
    pub fn new() -> Self {
        Self {
            views: vec![MemoryView::new(CONTAINER_CLASS)],
            root: 0,
            pool: HashMap::default(),
            counters: MutationCounters::default(),
        }
    }

    pub fn view(&self, id: ViewId) -> Option<&MemoryView> {
        self.views.get(id).filter(|view| view.live)
    }

    pub fn children(&self, id: ViewId) -> &[ViewId] {
        self.view(id).map(|view| view.children.as_slice()).unwrap_or(&[])
    }

    /// Number of live views, excluding the root.
    pub fn live_count(&self) -> usize {
        self.views.iter().filter(|view| view.live).count() - 1
    }

    /// Views waiting in the recycle pool.
    pub fn pooled(&self) -> usize {
        self.pool.values().map(Vec::len).sum()
    }

    pub fn counters(&self) -> MutationCounters {
        self.counters
    }

    pub fn reset_counters(&mut self) {
        self.counters = MutationCounters::default();
    }

    /// Live views of `class`, in id order.
    pub fn views_of_class(&self, class: &str) -> Vec<ViewId> {
        self.views
            .iter()
            .enumerate()
            .filter(|(_, view)| view.live && view.class.name() == class)
            .map(|(id, _)| id)
            .collect()
    }

    /// Text rendering of the attached hierarchy, one view per line.
    pub fn dump_tree(&self) -> String {
        let mut output = String::new();
        self.dump_view(&mut output, self.root, 0);
        output
    }

    fn dump_view(&self, output: &mut String, id: ViewId, depth: usize) {
        let indent = "  ".repeat(depth);
        let Some(view) = self.view(id) else {
            let _ = writeln!(output, "{indent}[{id}] (missing)");
            return;
        };
        let _ = write!(output, "{indent}[{id}] {} {}", view.class, view.frame);
        for (name, value) in &view.attributes {
            let _ = write!(output, " {name}={value:?}");
        }
        output.push('\n');
        for child in &view.children {
            self.dump_view(output, *child, depth + 1);
        }
    }

    fn live_mut(&mut self, id: ViewId) -> Result<&mut MemoryView, ViewError> {
        self.views
            .get_mut(id)
            .filter(|view| view.live)
            .ok_or(ViewError::Missing { id })
    }

    fn detach(&mut self, id: ViewId) {
        let Some(parent) = self.views.get_mut(id).and_then(|view| view.parent.take()) else {
            return;
        };
        if let Some(parent) = self.views.get_mut(parent) {
            parent.children.retain(|child| *child != id);
        }
    }
}

impl ViewContainer for MemoryViewContainer {
    fn root(&self) -> ViewId {
        self.root
    }

    fn create_view(&mut self, class: ViewClass) -> ViewId {
        if let Some(id) = self.pool.get_mut(&class).and_then(Vec::pop) {
            self.counters.recycled += 1;
            self.views[id] = MemoryView::new(class);
            return id;
        }
        self.counters.created += 1;
        self.views.push(MemoryView::new(class));
        self.views.len() - 1
    }

    fn class_of(&self, view: ViewId) -> Result<ViewClass, ViewError> {
        self.view(view)
            .map(|v| v.class)
            .ok_or(ViewError::Missing { id: view })
    }

    fn parent_of(&self, view: ViewId) -> Option<(ViewId, usize)> {
        let parent = self.view(view)?.parent?;
        let index = self.view(parent)?.children.iter().position(|c| *c == view)?;
        Some((parent, index))
    }

    fn insert_child(&mut self, parent: ViewId, child: ViewId, index: usize) -> Result<(), ViewError> {
        self.live_mut(parent)?;
        self.live_mut(child)?;
        self.detach(child);
        let siblings = &mut self.live_mut(parent)?.children;
        let index = index.min(siblings.len());
        siblings.insert(index, child);
        self.live_mut(child)?.parent = Some(parent);
        self.counters.inserted += 1;
        Ok(())
    }

    fn remove_view(&mut self, view: ViewId) -> Result<(), ViewError> {
        // The root outlives every mount.
        if view == self.root {
            return Ok(());
        }
        let class = self.live_mut(view)?.class;
        self.detach(view);
        let children = std::mem::take(&mut self.live_mut(view)?.children);
        for child in children {
            if let Some(child) = self.views.get_mut(child) {
                child.parent = None;
            }
        }
        self.live_mut(view)?.live = false;
        self.pool.entry(class).or_default().push(view);
        self.counters.removed += 1;
        Ok(())
    }

    fn set_frame(&mut self, view: ViewId, frame: Rect) -> Result<(), ViewError> {
        self.live_mut(view)?.frame = frame;
        self.counters.frames += 1;
        Ok(())
    }

    fn set_attribute(
        &mut self,
        view: ViewId,
        name: &'static str,
        value: &AttributeValue,
    ) -> Result<(), ViewError> {
        self.live_mut(view)?.attributes.insert(name, value.clone());
        self.counters.attributes_set += 1;
        Ok(())
    }

    fn clear_attribute(&mut self, view: ViewId, name: &'static str) -> Result<(), ViewError> {
        self.live_mut(view)?.attributes.shift_remove(name);
        self.counters.attributes_cleared += 1;
        Ok(())
    }

    fn animate(&mut self, view: ViewId, animation: &Animation) {
        if let Ok(target) = self.live_mut(view) {
            target.animations.push(animation.clone());
            self.counters.animations += 1;
        }
    }
}

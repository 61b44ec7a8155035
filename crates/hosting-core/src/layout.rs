//! Layout pass over a built component tree.
//!
//! Layout is a pure function of the tree and the root constraints. Each
//! component measures its own children through a [`ChildMeasurer`] and
//! returns their offsets; children it never measures are laid out at the
//! origin with zero size.

use hosting_ui_graphics::{Point, Rect, Size};
use hosting_ui_layout::Constraints;

use crate::component::Component;
use crate::scope::ScopePath;
use crate::tree::{ComponentTree, NodeIndex};

/// What a component's `measure` returns: its own size and one offset per
/// child, in child order. Missing offsets default to the origin.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeasureResult {
    pub size: Size,
    pub placements: Vec<Point>,
}

impl MeasureResult {
    pub fn new(size: Size, placements: Vec<Point>) -> Self {
        Self { size, placements }
    }

    /// A childless node of `size`.
    pub fn leaf(size: Size) -> Self {
        Self {
            size,
            placements: Vec::new(),
        }
    }
}

struct MeasuredNode {
    index: NodeIndex,
    size: Size,
    children: Vec<Option<MeasuredNode>>,
    placements: Vec<Point>,
}

/// Gives a component access to its children during measurement.
pub struct ChildMeasurer<'t> {
    tree: &'t ComponentTree,
    children: &'t [NodeIndex],
    measured: Vec<Option<MeasuredNode>>,
}

impl<'t> ChildMeasurer<'t> {
    fn new(tree: &'t ComponentTree, children: &'t [NodeIndex]) -> Self {
        Self {
            tree,
            children,
            measured: children.iter().map(|_| None).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// The `i`th child component, for components that lay out by child type.
    pub fn component(&self, i: usize) -> Option<&'t dyn Component> {
        let index = *self.children.get(i)?;
        Some(self.tree.node(index)?.component())
    }

    /// Measures child `i` (and its subtree) under `constraints`.
    ///
    /// Measuring the same child twice keeps the last measurement. Out of
    /// range indices measure as zero.
    pub fn measure(&mut self, i: usize, constraints: Constraints) -> Size {
        let Some(&index) = self.children.get(i) else {
            return Size::ZERO;
        };
        let measured = measure_node(self.tree, index, constraints);
        let size = measured.size;
        self.measured[i] = Some(measured);
        size
    }

    /// Stacks every child at the origin under loosened constraints and takes
    /// the largest child extent.
    pub fn overlay(&mut self, constraints: Constraints) -> MeasureResult {
        let child_constraints = constraints.loosen();
        let mut size = constraints.min_size();
        for i in 0..self.len() {
            let child = self.measure(i, child_constraints);
            size.width = size.width.max(child.width);
            size.height = size.height.max(child.height);
        }
        MeasureResult {
            size: constraints.constrain_size(size),
            placements: Vec::new(),
        }
    }
}

fn measure_node(tree: &ComponentTree, index: NodeIndex, constraints: Constraints) -> MeasuredNode {
    let constraints = constraints.normalized();
    let Some(node) = tree.node(index) else {
        return MeasuredNode {
            index,
            size: Size::ZERO,
            children: Vec::new(),
            placements: Vec::new(),
        };
    };
    let mut measurer = ChildMeasurer::new(tree, node.children());
    let result = node.component().measure(constraints, &mut measurer);
    MeasuredNode {
        index,
        size: constraints.constrain_size(result.size),
        children: measurer.measured,
        placements: result.placements,
    }
}

fn place_node(tree: &ComponentTree, measured: MeasuredNode, origin: Point) -> LayoutBox {
    let Some(node) = tree.node(measured.index) else {
        return LayoutBox::new(measured.index, ScopePath::root(), Rect::new(origin, measured.size), Vec::new());
    };
    let mut children = Vec::with_capacity(node.children().len());
    for (position, (child_index, child)) in node
        .children()
        .iter()
        .copied()
        .zip(measured.children)
        .enumerate()
    {
        let offset = measured.placements.get(position).copied().unwrap_or(Point::ZERO);
        let child = child.unwrap_or_else(|| measure_node(tree, child_index, Constraints::tight(0.0, 0.0)));
        children.push(place_node(tree, child, offset));
    }
    LayoutBox::new(
        measured.index,
        node.path().clone(),
        Rect::new(origin, measured.size),
        children,
    )
}

/// Layout result for one node. `rect` is relative to the parent box.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutBox {
    pub node: NodeIndex,
    pub path: ScopePath,
    pub rect: Rect,
    pub children: Vec<LayoutBox>,
}

impl LayoutBox {
    pub fn new(node: NodeIndex, path: ScopePath, rect: Rect, children: Vec<LayoutBox>) -> Self {
        Self {
            node,
            path,
            rect,
            children,
        }
    }

    /// Visits this box and its descendants in pre-order with absolute frames.
    pub fn walk(&self, parent_origin: Point, visit: &mut impl FnMut(&LayoutBox, Rect)) {
        let frame = self.rect.translate(parent_origin);
        visit(self, frame);
        for child in &self.children {
            child.walk(frame.origin, visit);
        }
    }
}

/// Result of running layout for a component tree.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutTree {
    root: LayoutBox,
}

impl LayoutTree {
    pub fn root(&self) -> &LayoutBox {
        &self.root
    }

    pub fn size(&self) -> Size {
        self.root.rect.size
    }

    /// Every box with its absolute frame, in pre-order.
    pub fn frames(&self) -> Vec<(&LayoutBox, Rect)> {
        let mut frames = Vec::new();
        collect_frames(&self.root, Point::ZERO, &mut frames);
        frames
    }

    /// Absolute frame of the node at `path`.
    pub fn frame_of(&self, path: &ScopePath) -> Option<Rect> {
        self.frames()
            .into_iter()
            .find(|(layout, _)| &layout.path == path)
            .map(|(_, frame)| frame)
    }
}

fn collect_frames<'l>(layout: &'l LayoutBox, parent_origin: Point, out: &mut Vec<(&'l LayoutBox, Rect)>) {
    let frame = layout.rect.translate(parent_origin);
    out.push((layout, frame));
    for child in &layout.children {
        collect_frames(child, frame.origin, out);
    }
}

/// Lays `tree` out under `constraints`, placing the root at the origin.
pub fn compute_layout(tree: &ComponentTree, constraints: Constraints) -> LayoutTree {
    let measured = measure_node(tree, ComponentTree::ROOT, constraints);
    LayoutTree {
        root: place_node(tree, measured, Point::ZERO),
    }
}

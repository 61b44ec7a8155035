//! Small components with predictable layout, views and lifecycle counters.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use hosting_core::prelude::*;
use hosting_core::{Animation, AnimationPhase};

/// Leaf of a fixed size with no view.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedBox {
    pub size: Size,
}

impl FixedBox {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Size::new(width, height),
        }
    }
}

impl Component for FixedBox {
    fn measure(&self, constraints: Constraints, _children: &mut ChildMeasurer<'_>) -> MeasureResult {
        MeasureResult::leaf(constraints.constrain_size(self.size))
    }
}

/// Leaf whose layout always panics.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Unmeasurable;

impl Component for Unmeasurable {
    fn measure(&self, _constraints: Constraints, _children: &mut ChildMeasurer<'_>) -> MeasureResult {
        panic!("unmeasurable component")
    }
}

/// Stacks children top to bottom, as wide as the widest child.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Column {
    pub spacing: f32,
}

impl Component for Column {
    fn measure(&self, constraints: Constraints, children: &mut ChildMeasurer<'_>) -> MeasureResult {
        let child_constraints = Constraints::loose(constraints.max_width, f32::INFINITY);
        let mut placements = Vec::with_capacity(children.len());
        let mut width: f32 = 0.0;
        let mut y = 0.0;
        for i in 0..children.len() {
            if i > 0 {
                y += self.spacing;
            }
            let size = children.measure(i, child_constraints);
            placements.push(Point::new(0.0, y));
            width = width.max(size.width);
            y += size.height;
        }
        MeasureResult::new(constraints.constrain_size(Size::new(width, y)), placements)
    }

    fn view(&self) -> Option<ViewSpec> {
        Some(ViewSpec::new("column"))
    }
}

/// Text leaf sized at 8 points per character by 16 points.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub text: String,
}

impl Label {
    pub const CHAR_WIDTH: f32 = 8.0;
    pub const LINE_HEIGHT: f32 = 16.0;

    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Component for Label {
    fn measure(&self, constraints: Constraints, _children: &mut ChildMeasurer<'_>) -> MeasureResult {
        let width = self.text.chars().count() as f32 * Self::CHAR_WIDTH;
        MeasureResult::leaf(constraints.constrain_size(Size::new(width, Self::LINE_HEIGHT)))
    }

    fn view(&self) -> Option<ViewSpec> {
        Some(ViewSpec::new("label").with("text", self.text.as_str()))
    }
}

/// Stateful leaf that renders its count. Fades in on first appearance and
/// fades out on removal.
#[derive(Clone, Debug, PartialEq)]
pub struct Counter {
    pub count: i64,
}

impl Component for Counter {
    fn measure(&self, constraints: Constraints, _children: &mut ChildMeasurer<'_>) -> MeasureResult {
        MeasureResult::leaf(constraints.constrain_size(Size::new(40.0, 20.0)))
    }

    fn view(&self) -> Option<ViewSpec> {
        Some(ViewSpec::new("counter").with("count", self.count))
    }

    fn animations(&self, phase: AnimationPhase) -> Vec<Animation> {
        match phase {
            AnimationPhase::Initial => vec![Animation::initial("opacity", 0.0f32)],
            AnimationPhase::Change => Vec::new(),
            AnimationPhase::Final => vec![Animation::to_final("opacity", 0.0f32)],
        }
    }
}

/// Emits a [`Counter`] whose count lives in the node's scope and which owns
/// a [`CounterController`].
pub fn counter(node: &mut NodeBuilder<'_, '_>) -> Counter {
    let count = node.state(|| 0i64);
    node.controller(CounterController::default);
    Counter { count: *count }
}

/// Counts the lifecycle hooks it receives.
#[derive(Debug, Default)]
pub struct CounterController {
    mounts: AtomicUsize,
    updates: AtomicUsize,
    invalidated: AtomicBool,
}

impl CounterController {
    pub fn mounts(&self) -> usize {
        self.mounts.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::SeqCst)
    }
}

impl ComponentController for CounterController {
    fn did_mount(&self) {
        self.mounts.fetch_add(1, Ordering::SeqCst);
    }

    fn did_update(&self) {
        self.updates.fetch_add(1, Ordering::SeqCst);
    }

    fn invalidate(&self) {
        self.invalidated.store(true, Ordering::SeqCst);
    }
}

/// Model used by most pipeline tests: a titled column of keyed counters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListModel {
    pub title: String,
    pub items: Vec<String>,
}

impl ListModel {
    pub fn new(title: &str, items: &[&str]) -> Self {
        Self {
            title: title.to_owned(),
            items: items.iter().map(|item| (*item).to_owned()).collect(),
        }
    }
}

/// Provider for [`ListModel`]: a [`Column`] holding a [`Label`] title and one
/// keyed [`counter`] per item.
pub fn list_provider<C>(
    model: &ListModel,
    _context: &C,
    tree: &mut TreeBuilder<'_>,
) -> Result<(), ProviderError> {
    tree.child(|column| {
        column.children(|tree| {
            tree.leaf(Label::new(model.title.clone()));
            for item in &model.items {
                tree.keyed_child(item.as_str(), counter);
            }
        });
        Column::default()
    });
    Ok(())
}

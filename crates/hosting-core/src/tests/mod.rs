use std::sync::atomic::{AtomicUsize, Ordering};

use crate::prelude::*;
use crate::scope::{CommitOutcome, ScopeRoot, ScopeStore, StateUpdate};
use crate::tree::{CollisionPolicy, ComponentTree};
use crate::StructuralError;

mod predicate_tests;
mod scope_store_tests;
mod tree_tests;

#[derive(Debug, Clone, PartialEq)]
struct Leaf {
    width: f32,
    height: f32,
}

impl Leaf {
    fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Component for Leaf {
    fn measure(&self, constraints: Constraints, _children: &mut ChildMeasurer<'_>) -> MeasureResult {
        MeasureResult::leaf(constraints.constrain_size(Size::new(self.width, self.height)))
    }
}

/// Uses the default overlay measurement.
#[derive(Debug, Default)]
struct Stack;

impl Component for Stack {}

/// Lays children out left to right.
#[derive(Debug, Default)]
struct Row;

impl Component for Row {
    fn measure(&self, constraints: Constraints, children: &mut ChildMeasurer<'_>) -> MeasureResult {
        let mut x = 0.0;
        let mut height: f32 = 0.0;
        let mut placements = Vec::new();
        for i in 0..children.len() {
            let size = children.measure(i, constraints.loosen());
            placements.push(Point::new(x, 0.0));
            x += size.width;
            height = height.max(size.height);
        }
        MeasureResult::new(Size::new(x, height), placements)
    }

    fn view(&self) -> Option<ViewSpec> {
        Some(ViewSpec::new("row"))
    }
}

#[derive(Debug, Default)]
struct Tracker {
    mounts: AtomicUsize,
}

impl ComponentController for Tracker {
    fn did_mount(&self) {
        self.mounts.fetch_add(1, Ordering::SeqCst);
    }
}

fn build_tree(
    previous: &ScopeRoot,
    updates: &[StateUpdate],
    policy: CollisionPolicy,
    content: impl FnOnce(&mut TreeBuilder<'_>),
) -> Result<(ComponentTree, CommitOutcome), StructuralError> {
    let store = ScopeStore::new(previous, updates);
    let mut builder = TreeBuilder::new(store, policy)?;
    content(&mut builder);
    let (tree, store) = builder.finish()?;
    Ok((tree, store.commit(previous.generation() + 1)))
}

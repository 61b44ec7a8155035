use std::panic::{self, AssertUnwindSafe};
use std::thread;

use hosting_core::prelude::*;
use hosting_core::{
    AnimationPhase, AttributeValue, BuildEngine, CollisionPolicy, PredicateSet, ScopeRoot, SizeRange,
};
use hosting_mount::{MemoryViewContainer, MountCoordinator, MountError, ViewContainer, ViewError};
use hosting_testing::{list_provider, CounterController, ListModel};

fn engine() -> BuildEngine<ListModel, ()> {
    BuildEngine::new(list_provider::<()>, PredicateSet::new(), CollisionPolicy::Fail)
}

fn range() -> SizeRange {
    SizeRange::new(Size::ZERO, Size::new(320.0, 480.0))
}

fn build(engine: &BuildEngine<ListModel, ()>, items: &[&str], previous: Option<&BuildResult>, generation: u64) -> BuildResult {
    let empty = ScopeRoot::empty();
    let root = previous.map(|result| result.scope_root()).unwrap_or(&empty);
    engine
        .build(&ListModel::new("Inbox", items), &(), range(), root, generation)
        .expect("build")
}

fn counter_views(container: &MemoryViewContainer) -> Vec<usize> {
    let column = container.views_of_class("column")[0];
    container
        .children(column)
        .iter()
        .copied()
        .filter(|id| container.view(*id).is_some_and(|v| v.class.name() == "counter"))
        .collect()
}

#[test]
fn first_mount_creates_the_hierarchy() {
    let engine = engine();
    let mut coordinator = MountCoordinator::new();
    let mut container = MemoryViewContainer::new();
    let result = build(&engine, &["a", "b"], None, 1);

    let stats = coordinator.apply(&result, &mut container).expect("mount");
    assert_eq!(stats.created, 4);
    assert_eq!(stats.removed, 0);
    assert_eq!(coordinator.last_applied(), 1);
    assert_eq!(container.live_count(), 4);

    let dump = container.dump_tree();
    let classes: Vec<&str> = dump
        .lines()
        .map(|line| line.split_whitespace().nth(1).unwrap_or(""))
        .collect();
    assert_eq!(classes, vec!["container", "column", "label", "counter", "counter"]);

    let counters = counter_views(&container);
    let b = container.view(counters[1]).expect("b");
    assert_eq!(b.frame, Rect::from_xywh(0.0, 36.0, 40.0, 20.0));
    assert_eq!(b.attributes.get("count"), Some(&AttributeValue::Int(0)));
}

#[test]
fn mounting_twice_changes_nothing() {
    let engine = engine();
    let mut coordinator = MountCoordinator::new();
    let mut container = MemoryViewContainer::new();
    let first = build(&engine, &["a", "b"], None, 1);
    coordinator.apply(&first, &mut container).expect("mount");
    let before = container.dump_tree();
    container.reset_counters();

    let again = coordinator.apply(&first, &mut container).expect("remount");
    assert!(again.skipped);

    let rebuilt = build(&engine, &["a", "b"], Some(&first), 2);
    let stats = coordinator.apply(&rebuilt, &mut container).expect("equal result");
    assert_eq!(stats.created, 0);
    assert_eq!(stats.reused, 4);
    assert_eq!(stats.updated, 0);
    assert_eq!(container.counters().mutations(), 0);
    assert_eq!(container.dump_tree(), before);
}

#[test]
fn keyed_views_follow_their_path() {
    let engine = engine();
    let mut coordinator = MountCoordinator::new();
    let mut container = MemoryViewContainer::new();
    let first = build(&engine, &["a", "b"], None, 1);
    coordinator.apply(&first, &mut container).expect("mount");
    let before = counter_views(&container);

    let swapped = build(&engine, &["b", "a"], Some(&first), 2);
    let stats = coordinator.apply(&swapped, &mut container).expect("mount swapped");
    assert_eq!(stats.created, 0);
    assert!(stats.moved > 0);
    let after = counter_views(&container);
    assert_eq!(after, vec![before[1], before[0]]);
    let top = container.view(after[0]).expect("b view");
    assert_eq!(top.frame.origin, Point::new(0.0, 16.0));
}

#[test]
fn removed_nodes_lose_views_and_controllers() {
    let engine = engine();
    let mut coordinator = MountCoordinator::new();
    let mut container = MemoryViewContainer::new();
    let first = build(&engine, &["a", "b"], None, 1);
    coordinator.apply(&first, &mut container).expect("mount");
    let b_handle = first
        .scope_root()
        .handles()
        .into_iter()
        .filter_map(|handle| handle.controller_as::<CounterController>())
        .nth(1)
        .expect("b controller");
    assert_eq!(b_handle.mounts(), 1);
    container.reset_counters();

    let second = build(&engine, &["a"], Some(&first), 2);
    let stats = coordinator.apply(&second, &mut container).expect("mount");
    assert_eq!(stats.removed, 1);
    assert_eq!(stats.invalidated, 1);
    assert!(b_handle.is_invalidated());
    assert_eq!(container.pooled(), 1);
    // The fade-out requested by the removed counter.
    assert_eq!(container.counters().animations, 1);
    assert_eq!(counter_views(&container).len(), 1);
}

#[test]
fn controllers_see_mount_then_update() {
    let engine = engine();
    let mut coordinator = MountCoordinator::new();
    let mut container = MemoryViewContainer::new();
    let first = build(&engine, &["a"], None, 1);
    coordinator.apply(&first, &mut container).expect("mount");
    let controller = first
        .scope_root()
        .handles()
        .into_iter()
        .find_map(|handle| handle.controller_as::<CounterController>())
        .expect("controller");

    let second = build(&engine, &["a"], Some(&first), 2);
    coordinator.apply(&second, &mut container).expect("mount");
    assert_eq!(controller.mounts(), 1);
    assert_eq!(controller.updates(), 1);
    assert!(!controller.is_invalidated());
}

#[test]
fn results_from_another_root_remount_controllers() {
    let engine = engine();
    let mut coordinator = MountCoordinator::new();
    let mut container = MemoryViewContainer::new();
    let local = build(&engine, &["a"], None, 1);
    coordinator.apply(&local, &mut container).expect("mount local");
    let a = local
        .scope_root()
        .handles()
        .into_iter()
        .find_map(|handle| handle.controller_as::<CounterController>())
        .expect("a controller");

    // Built elsewhere from an empty root, so its scope ids overlap the local ones.
    let upstream = build(&engine, &["x"], None, 2);
    let stats = coordinator.apply(&upstream, &mut container).expect("mount upstream");
    let x = upstream
        .scope_root()
        .handles()
        .into_iter()
        .find_map(|handle| handle.controller_as::<CounterController>())
        .expect("x controller");

    assert!(a.is_invalidated());
    assert_eq!(stats.invalidated, 1);
    assert_eq!((x.mounts(), x.updates()), (1, 0));
    assert!(!x.is_invalidated());
}

#[test]
fn a_lost_view_fails_the_apply_before_any_mutation() {
    let engine = engine();
    let mut coordinator = MountCoordinator::new();
    let mut container = MemoryViewContainer::new();
    let first = build(&engine, &["a"], None, 1);
    coordinator.apply(&first, &mut container).expect("mount");
    let counter = counter_views(&container)[0];
    container.remove_view(counter).expect("remove behind the coordinator's back");
    let before = container.dump_tree();
    container.reset_counters();

    let second = build(&engine, &["a", "b"], Some(&first), 2);
    let err = coordinator.apply(&second, &mut container).unwrap_err();
    assert_eq!(err, MountError::View(ViewError::Missing { id: counter }));
    assert_eq!(container.counters().mutations(), 0);
    assert_eq!(container.dump_tree(), before);
    assert_eq!(coordinator.last_applied(), 1);
}

#[test]
fn initial_hints_reach_new_views() {
    let engine = engine();
    let mut coordinator = MountCoordinator::new();
    let mut container = MemoryViewContainer::new();
    let result = build(&engine, &["a"], None, 1);
    coordinator.apply(&result, &mut container).expect("mount");

    let counter = counter_views(&container)[0];
    let animations = &container.view(counter).expect("counter").animations;
    assert_eq!(animations.len(), 1);
    assert_eq!(animations[0].phase, AnimationPhase::Initial);
}

#[test]
fn older_generations_are_rejected() {
    let engine = engine();
    let mut coordinator = MountCoordinator::new();
    let mut container = MemoryViewContainer::new();
    let old = build(&engine, &["a"], None, 1);
    let new = build(&engine, &["a", "b"], None, 2);
    coordinator.apply(&new, &mut container).expect("mount newer");
    let before = container.dump_tree();

    assert_eq!(
        coordinator.apply(&old, &mut container),
        Err(MountError::Stale {
            generation: 1,
            last_applied: 2
        })
    );
    assert_eq!(container.dump_tree(), before);
    assert_eq!(coordinator.last_applied(), 2);
}

#[derive(Debug)]
struct Switch {
    on: bool,
}

impl Component for Switch {
    fn measure(&self, constraints: Constraints, _children: &mut ChildMeasurer<'_>) -> MeasureResult {
        MeasureResult::leaf(constraints.constrain_size(Size::new(10.0, 10.0)))
    }

    fn view(&self) -> Option<ViewSpec> {
        Some(ViewSpec::new(if self.on { "lamp" } else { "shade" }))
    }
}

fn switch_provider(on: &bool, _: &(), tree: &mut TreeBuilder<'_>) -> Result<(), ProviderError> {
    tree.leaf(Switch { on: *on });
    Ok(())
}

#[test]
fn class_changes_replace_the_view() {
    let engine = BuildEngine::new(switch_provider, PredicateSet::new(), CollisionPolicy::Fail);
    let mut coordinator = MountCoordinator::new();
    let mut container = MemoryViewContainer::new();
    let on = engine
        .build(&true, &(), range(), &ScopeRoot::empty(), 1)
        .expect("on");
    coordinator.apply(&on, &mut container).expect("mount on");
    let off = engine
        .build(&false, &(), range(), on.scope_root(), 2)
        .expect("off");
    let stats = coordinator.apply(&off, &mut container).expect("mount off");

    assert_eq!((stats.removed, stats.created, stats.reused), (1, 1, 0));
    assert!(container.views_of_class("lamp").is_empty());
    assert_eq!(container.views_of_class("shade").len(), 1);
}

#[test]
fn hit_test_finds_the_topmost_view() {
    let engine = engine();
    let mut coordinator = MountCoordinator::new();
    let mut container = MemoryViewContainer::new();
    let result = build(&engine, &["a", "b"], None, 1);
    coordinator.apply(&result, &mut container).expect("mount");

    let hit = coordinator.hit_test(Point::new(5.0, 20.0)).expect("hit");
    assert_eq!(Some(&hit.path), result.tree().node(2).map(|node| node.path()));
    assert_eq!(coordinator.view_for(&hit.path), Some(hit.view));
    assert!(coordinator.hit_test(Point::new(300.0, 300.0)).is_none());
}

#[test]
fn apply_off_the_render_thread_panics() {
    let engine = engine();
    let result = build(&engine, &["a"], None, 1);
    let mut coordinator = MountCoordinator::new();
    let panicked = thread::spawn(move || {
        let mut container = MemoryViewContainer::new();
        panic::catch_unwind(AssertUnwindSafe(|| {
            let _ = coordinator.apply(&result, &mut container);
        }))
        .is_err()
    })
    .join()
    .expect("worker thread");
    assert!(panicked);
}

#[test]
fn container_root_is_the_mount_point() {
    let engine = engine();
    let mut coordinator = MountCoordinator::new();
    let mut container = MemoryViewContainer::new();
    coordinator
        .apply(&build(&engine, &[], None, 1), &mut container)
        .expect("mount");
    let root = container.root();
    assert_eq!(container.children(root).len(), 1);
    assert_eq!(coordinator.mounted_len(), 2);
}

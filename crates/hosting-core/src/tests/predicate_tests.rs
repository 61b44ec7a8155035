use std::sync::Arc;

use super::*;
use crate::component::ComponentController;
use crate::predicate::{PredicateMatches, PredicateSet};

fn is_leaf(component: &dyn Component) -> bool {
    component.is::<Leaf>()
}

fn has_view(component: &dyn Component) -> bool {
    component.view().is_some()
}

fn never(_: &dyn Component) -> bool {
    false
}

fn is_tracker(controller: &dyn ComponentController) -> bool {
    controller.downcast_ref::<Tracker>().is_some()
}

fn sample_tree() -> ComponentTree {
    let empty = ScopeRoot::empty();
    let (tree, _) = build_tree(&empty, &[], CollisionPolicy::Fail, |tree| {
        tree.child(|row| {
            row.children(|tree| {
                tree.leaf(Leaf::new(1.0, 1.0));
                tree.child(|stack| {
                    stack.controller(Tracker::default);
                    stack.children(|tree| {
                        tree.leaf(Leaf::new(1.0, 1.0));
                        tree.child(|row| {
                            row.controller(Tracker::default);
                            Row
                        });
                    });
                    Stack
                });
                tree.leaf(Leaf::new(1.0, 1.0));
            });
            Row
        });
    })
    .expect("build");
    tree
}

#[test]
fn matches_follow_traversal_order() {
    let tree = sample_tree();
    let set = Arc::new(
        PredicateSet::new()
            .with_component("leaf", is_leaf)
            .with_component("view", has_view)
            .with_controller("tracked", is_tracker),
    );
    let matches = PredicateMatches::evaluate(&tree, &set);

    assert_eq!(matches.components_matching("leaf"), &[1, 3, 5]);
    assert_eq!(matches.components_matching("view"), &[0, 4]);
    assert_eq!(matches.controllers_matching("tracked"), &[2, 4]);
    assert_eq!(matches.total(), 7);
}

#[test]
fn total_is_bounded_by_nodes_times_predicates() {
    let tree = sample_tree();
    let always: fn(&dyn Component) -> bool = |_| true;
    let set = Arc::new(
        PredicateSet::new()
            .with_component("all", always)
            .with_component("leaf", is_leaf)
            .with_component("never", never),
    );
    let matches = PredicateMatches::evaluate(&tree, &set);

    assert!(matches.total() <= tree.len() * set.component_count());
    let all = matches.components_matching("all");
    let mut deduped = all.to_vec();
    deduped.dedup();
    assert_eq!(all.len(), tree.len());
    assert_eq!(deduped.len(), all.len());
    assert!(matches.components_matching("never").is_empty());
}

#[test]
fn unknown_names_and_ids_match_nothing() {
    let tree = sample_tree();
    let set = Arc::new(PredicateSet::new().with_component("leaf", is_leaf));
    let matches = PredicateMatches::evaluate(&tree, &set);
    assert!(matches.components_matching("missing").is_empty());
    assert!(matches.controllers_matching("leaf").is_empty());
    let id = set.component_id("leaf").expect("registered");
    assert_eq!(matches.component_matches(id), &[1, 3, 5]);
}

#[test]
fn re_registering_a_name_replaces_in_place() {
    let set = PredicateSet::new()
        .with_component("a", is_leaf)
        .with_component("b", has_view)
        .with_component("a", never);
    assert_eq!(set.component_count(), 2);
    assert_eq!(set.component_id("a").map(|id| id.0), Some(0));
    let matches = PredicateMatches::evaluate(&sample_tree(), &Arc::new(set));
    assert!(matches.components_matching("a").is_empty());
}

use super::*;
use crate::scope::SegmentKey;

fn keys(tree: &ComponentTree) -> Vec<String> {
    tree.iter().map(|(_, node)| node.path().to_string()).collect()
}

#[test]
fn siblings_are_numbered_per_type() {
    let empty = ScopeRoot::empty();
    let (tree, _) = build_tree(&empty, &[], CollisionPolicy::Fail, |tree| {
        tree.child(|row| {
            row.children(|tree| {
                tree.leaf(Leaf::new(1.0, 1.0));
                tree.leaf(Stack);
                tree.leaf(Leaf::new(2.0, 2.0));
            });
            Row
        });
    })
    .expect("build");

    assert_eq!(
        keys(&tree),
        vec!["/Row[0]", "/Row[0]/Leaf[0]", "/Row[0]/Stack[0]", "/Row[0]/Leaf[1]"]
    );
    assert_eq!(tree.root().children(), &[1, 2, 3]);
    assert_eq!(tree.node(3).and_then(|n| n.parent()), Some(0));
}

fn keyed_leaves(order: &[&'static str], tree: &mut TreeBuilder<'_>) {
    tree.child(|stack| {
        stack.children(|tree| {
            for key in order {
                tree.keyed_child(*key, |node| {
                    node.state(|| key.len());
                    Leaf::new(1.0, 1.0)
                });
            }
        });
        Stack
    });
}

#[test]
fn keyed_children_keep_their_path_when_reordered() {
    let empty = ScopeRoot::empty();
    let (first, outcome) = build_tree(&empty, &[], CollisionPolicy::Fail, |tree| {
        keyed_leaves(&["a", "bb"], tree)
    })
    .expect("build");
    let (second, _) = build_tree(&outcome.root, &[], CollisionPolicy::Fail, |tree| {
        keyed_leaves(&["bb", "a"], tree)
    })
    .expect("build");

    assert_eq!(first.node(1).map(|n| n.path()), second.node(2).map(|n| n.path()));
    assert_eq!(first.node(1).and_then(|n| n.scope()), second.node(2).and_then(|n| n.scope()));
    assert!(matches!(
        first.node(1).and_then(|n| n.path().last()).map(|s| s.key),
        Some(SegmentKey::Keyed(_))
    ));
}

#[test]
fn duplicate_keys_fail_under_fail_policy() {
    let empty = ScopeRoot::empty();
    let err = build_tree(&empty, &[], CollisionPolicy::Fail, |tree| {
        tree.child(|stack| {
            stack.children(|tree| {
                tree.keyed_child("dup", |_| Leaf::new(1.0, 1.0));
                tree.keyed_child("dup", |_| Leaf::new(1.0, 1.0));
            });
            Stack
        });
    })
    .unwrap_err();
    assert!(matches!(err, StructuralError::DuplicatePath { .. }));
}

fn three_duplicates(tree: &mut TreeBuilder<'_>) {
    tree.child(|stack| {
        stack.children(|tree| {
            for _ in 0..3 {
                tree.keyed_child("dup", |node| {
                    node.state(|| 0u8);
                    Leaf::new(1.0, 1.0)
                });
            }
        });
        Stack
    });
}

#[test]
fn duplicate_keys_are_disambiguated_deterministically() {
    let empty = ScopeRoot::empty();
    let (first, outcome) =
        build_tree(&empty, &[], CollisionPolicy::Disambiguate, three_duplicates).expect("build");
    let (second, _) =
        build_tree(&outcome.root, &[], CollisionPolicy::Disambiguate, three_duplicates)
            .expect("build");

    assert_eq!(keys(&first), keys(&second));
    let occurrences: Vec<_> = first
        .iter()
        .skip(1)
        .filter_map(|(_, node)| node.path().last().map(|s| s.key))
        .collect();
    assert!(matches!(occurrences[0], SegmentKey::Keyed(_)));
    assert!(matches!(
        occurrences[1],
        SegmentKey::Disambiguated { occurrence: 1, .. }
    ));
    assert!(matches!(
        occurrences[2],
        SegmentKey::Disambiguated { occurrence: 2, .. }
    ));
    assert_eq!(outcome.root.len(), 4);
}

#[test]
fn provider_must_emit_exactly_one_root() {
    let empty = ScopeRoot::empty();
    let err = build_tree(&empty, &[], CollisionPolicy::Fail, |_| {}).unwrap_err();
    assert_eq!(err, StructuralError::NoRoot);

    let err = build_tree(&empty, &[], CollisionPolicy::Fail, |tree| {
        tree.leaf(Stack);
        tree.leaf(Stack);
    })
    .unwrap_err();
    assert!(matches!(err, StructuralError::MultipleRoots { .. }));
}

#[test]
fn nodes_without_state_have_no_scope() {
    let empty = ScopeRoot::empty();
    let (tree, outcome) = build_tree(&empty, &[], CollisionPolicy::Fail, |tree| {
        tree.child(|stack| {
            stack.controller(Tracker::default);
            stack.children(|tree| {
                tree.leaf(Leaf::new(1.0, 1.0));
            });
            Stack
        });
    })
    .expect("build");

    assert!(tree.root().scope().is_some());
    assert!(tree.node(1).and_then(|n| n.scope()).is_none());
    // The empty root path plus the stack.
    assert_eq!(outcome.root.len(), 2);
    let controllers: Vec<_> = tree.controllers().map(|(index, _, _)| index).collect();
    assert_eq!(controllers, vec![0]);
}

#[test]
fn state_type_change_fails_the_build() {
    let empty = ScopeRoot::empty();
    let (_, outcome) = build_tree(&empty, &[], CollisionPolicy::Fail, |tree| {
        tree.child(|node| {
            node.state(|| 1u32);
            Stack
        });
    })
    .expect("build");
    let err = build_tree(&outcome.root, &[], CollisionPolicy::Fail, |tree| {
        tree.child(|node| {
            node.state(|| "text".to_owned());
            Stack
        });
    })
    .unwrap_err();
    assert!(matches!(err, StructuralError::StateTypeMismatch { .. }));
}

use std::sync::Arc;

use super::*;
use crate::scope::{ComponentKind, PathSegment, ScopeId, SegmentKey};

fn path(names: &[u32]) -> ScopePath {
    ScopePath::from_segments(
        names
            .iter()
            .map(|n| PathSegment::new(ComponentKind::of::<Leaf>(), SegmentKey::Ordinal(*n))),
    )
}

fn commit_with(previous: &ScopeRoot, paths: &[ScopePath], generation: u64) -> CommitOutcome {
    let mut store = ScopeStore::new(previous, &[]);
    for path in paths {
        store.resolve(path).expect("resolve");
        store.state(path, || path.depth() as i32).expect("state");
    }
    store.commit(generation)
}

#[test]
fn resolve_carries_identity_and_state() {
    let empty = ScopeRoot::empty();
    let p = path(&[0]);
    let mut store = ScopeStore::new(&empty, &[]);
    let first = store.resolve(&p).expect("resolve");
    assert!(first.is_fresh());
    assert_eq!(*store.state(&p, || 5i32).expect("state"), 5);
    let root1 = store.commit(1).root;
    assert_eq!(root1.generation(), 1);

    let mut store = ScopeStore::new(&root1, &[]);
    let second = store.resolve(&p).expect("resolve");
    assert!(!second.is_fresh());
    assert_eq!(second.id, first.id);
    assert_eq!(*store.state(&p, || 0i32).expect("state"), 5);
    let root2 = store.commit(2).root;

    let before = root1.handle(&p).expect("handle");
    let after = root2.handle(&p).expect("handle");
    assert!(before.ptr_eq(after));
    assert!(root2.shares_all_handles_with(&root1));
}

#[test]
fn resolving_a_path_twice_is_a_collision() {
    let empty = ScopeRoot::empty();
    let p = path(&[3]);
    let mut store = ScopeStore::new(&empty, &[]);
    store.resolve(&p).expect("first resolve");
    assert_eq!(
        store.resolve(&p).unwrap_err(),
        StructuralError::DuplicatePath { path: p.clone() }
    );
}

#[test]
fn dropped_paths_are_retired_in_id_order() {
    let empty = ScopeRoot::empty();
    let (a, b, c) = (path(&[0]), path(&[1]), path(&[2]));
    let root1 = commit_with(&empty, &[a.clone(), b.clone(), c.clone()], 1).root;
    let outcome = commit_with(&root1, &[b.clone()], 2);

    let retired: Vec<_> = outcome.retired.iter().map(|h| h.path().clone()).collect();
    assert_eq!(retired, vec![a, c]);
    assert!(outcome.retired[0].id() < outcome.retired[1].id());
    assert_eq!(outcome.root.len(), 1);
    // Retiring leaves the previous root intact for concurrent readers.
    assert_eq!(root1.len(), 3);
}

#[test]
fn ids_are_not_reused_after_retirement() {
    let empty = ScopeRoot::empty();
    let (a, b) = (path(&[0]), path(&[1]));
    let root1 = commit_with(&empty, &[a.clone()], 1).root;
    let root2 = commit_with(&root1, &[], 2).root;
    let root3 = commit_with(&root2, &[b.clone()], 3).root;
    let old = root1.handle(&a).expect("a").id();
    let new = root3.handle(&b).expect("b").id();
    assert!(new > old);
}

#[test]
fn pending_updates_apply_once_in_sequence_order() {
    let empty = ScopeRoot::empty();
    let p = path(&[0]);
    let root1 = commit_with(&empty, &[p.clone()], 1).root;
    let id = root1.handle(&p).expect("handle").id();
    let updates = [
        StateUpdate::new::<i32, _>(1, id, |v| v + 10),
        StateUpdate::new::<i32, _>(2, id, |v| v * 2),
    ];

    let mut store = ScopeStore::new(&root1, &updates);
    store.resolve(&p).expect("resolve");
    assert_eq!(*store.state(&p, || 0i32).expect("state"), 22);
    assert_eq!(*store.state(&p, || 0i32).expect("state"), 22);
    let root2 = store.commit(2).root;

    let handle = root2.handle(&p).expect("handle");
    assert_eq!(handle.id(), id);
    assert_eq!(handle.state::<i32>().as_deref(), Some(&22));
    assert!(!handle.ptr_eq(root1.handle(&p).expect("old")));
}

#[test]
fn update_for_fresh_scope_applies_after_init() {
    let empty = ScopeRoot::empty();
    let p = path(&[0]);
    let mut store = ScopeStore::new(&empty, &[]);
    let id = store.resolve(&p).expect("resolve").id;
    drop(store);

    let updates = [StateUpdate::new::<i32, _>(1, id, |v| v + 1)];
    let mut store = ScopeStore::new(&empty, &updates);
    store.resolve(&p).expect("resolve");
    assert_eq!(*store.state(&p, || 41i32).expect("state"), 42);
}

#[test]
fn mistyped_update_is_ignored() {
    let empty = ScopeRoot::empty();
    let p = path(&[0]);
    let root1 = commit_with(&empty, &[p.clone()], 1).root;
    let id = root1.handle(&p).expect("handle").id();
    let updates = [StateUpdate::new::<String, _>(1, id, |s| format!("{s}!"))];

    let mut store = ScopeStore::new(&root1, &updates);
    store.resolve(&p).expect("resolve");
    assert_eq!(*store.state(&p, || 0i32).expect("state"), 1);
}

#[test]
fn updates_for_unread_or_missing_scopes_are_reported() {
    let empty = ScopeRoot::empty();
    let (a, b) = (path(&[0]), path(&[1]));
    let root1 = commit_with(&empty, &[a.clone(), b.clone()], 1).root;
    let a_id = root1.handle(&a).expect("a").id();
    let b_id = root1.handle(&b).expect("b").id();
    let updates = [
        StateUpdate::new::<i32, _>(1, a_id, |v| v + 1),
        StateUpdate::new::<i32, _>(2, b_id, |v| v + 1),
        StateUpdate::new::<i32, _>(3, ScopeId(999), |v| v + 1),
    ];

    let mut store = ScopeStore::new(&root1, &updates);
    store.resolve(&a).expect("resolve a");
    store.resolve(&b).expect("resolve b");
    assert_eq!(*store.state(&a, || 0i32).expect("state"), 2);
    let outcome = store.commit(2);

    assert_eq!(outcome.unapplied, vec![2, 3]);
    // The unread scope keeps its carried state untouched.
    let b_handle = outcome.root.handle(&b).expect("b");
    assert!(b_handle.ptr_eq(root1.handle(&b).expect("old b")));
}

#[test]
fn state_type_mismatch_is_reported() {
    let empty = ScopeRoot::empty();
    let p = path(&[0]);
    let root1 = commit_with(&empty, &[p.clone()], 1).root;
    let mut store = ScopeStore::new(&root1, &[]);
    store.resolve(&p).expect("resolve");
    let err = store.state(&p, String::new).unwrap_err();
    assert!(matches!(err, StructuralError::StateTypeMismatch { .. }));
}

#[test]
fn unresolved_paths_are_rejected() {
    let empty = ScopeRoot::empty();
    let mut store = ScopeStore::new(&empty, &[]);
    let err = store.state(&path(&[9]), || 1u8).unwrap_err();
    assert!(matches!(err, StructuralError::UnresolvedScope { .. }));
}

#[test]
fn controllers_survive_and_downcast() {
    let empty = ScopeRoot::empty();
    let p = path(&[0]);
    let mut store = ScopeStore::new(&empty, &[]);
    store.resolve(&p).expect("resolve");
    let (tracker, _) = store.controller(&p, Tracker::default).expect("controller");
    let root1 = store.commit(1).root;

    let mut store = ScopeStore::new(&root1, &[]);
    store.resolve(&p).expect("resolve");
    let (again, erased) = store
        .controller(&p, || -> Tracker { panic!("controller must be carried") })
        .expect("controller");
    assert!(Arc::ptr_eq(&tracker, &again));
    erased.did_mount();
    assert_eq!(tracker.mounts.load(Ordering::SeqCst), 1);
    let root2 = store.commit(2).root;
    assert!(root2.handle(&p).expect("handle").ptr_eq(root1.handle(&p).expect("handle")));
}

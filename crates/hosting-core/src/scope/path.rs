use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Type identity of a component, used as the first half of a path segment.
#[derive(Clone, Copy)]
pub struct ComponentKind {
    id: TypeId,
    name: &'static str,
}

impl ComponentKind {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified type name.
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path.
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for ComponentKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentKind {}

impl Hash for ComponentKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Distinguishes siblings of the same component type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SegmentKey {
    /// n-th un-keyed sibling of this type under the same parent.
    Ordinal(u32),
    /// Caller-supplied key, hashed.
    Keyed(u64),
    /// A repeated caller key, made unique by its occurrence count.
    Disambiguated { key: u64, occurrence: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PathSegment {
    pub kind: ComponentKind,
    pub key: SegmentKey,
}

impl PathSegment {
    pub fn new(kind: ComponentKind, key: SegmentKey) -> Self {
        Self { kind, key }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.kind.short_name();
        match self.key {
            SegmentKey::Ordinal(n) => write!(f, "{name}[{n}]"),
            SegmentKey::Keyed(key) => write!(f, "{name}#{key:x}"),
            SegmentKey::Disambiguated { key, occurrence } => {
                write!(f, "{name}#{key:x}~{occurrence}")
            }
        }
    }
}

/// Stable structural address of a node: the segments from the root down.
///
/// The same path is used by the scope store to find a node's state and by the
/// mount coordinator to find a node's view, so nothing holds back-pointers.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ScopePath(Arc<[PathSegment]>);

impl ScopePath {
    /// The empty path, owned by the root scope handle.
    pub fn root() -> Self {
        Self(Arc::from(Vec::new()))
    }

    pub fn from_segments(segments: impl IntoIterator<Item = PathSegment>) -> Self {
        Self(segments.into_iter().collect::<Vec<_>>().into())
    }

    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend_from_slice(&self.0);
        segments.push(segment);
        Self(segments.into())
    }

    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].into()))
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// True when `self` is a proper ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &ScopePath) -> bool {
        self.0.len() < other.0.len() && other.0[..self.0.len()] == self.0[..]
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for segment in self.0.iter() {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScopePath({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row;
    struct Label;

    #[test]
    fn paths_compare_structurally() {
        let row = PathSegment::new(ComponentKind::of::<Row>(), SegmentKey::Ordinal(0));
        let label = PathSegment::new(ComponentKind::of::<Label>(), SegmentKey::Keyed(7));
        let a = ScopePath::root().child(row).child(label);
        let b = ScopePath::from_segments([row, label]);
        assert_eq!(a, b);
        assert_eq!(a.depth(), 2);
        assert_eq!(a.parent(), Some(ScopePath::root().child(row)));
        assert!(ScopePath::root().is_ancestor_of(&a));
        assert!(!a.is_ancestor_of(&a));
        assert_eq!(a.to_string(), "/Row[0]/Label#7");
    }

    #[test]
    fn kinds_differ_by_type() {
        let row = PathSegment::new(ComponentKind::of::<Row>(), SegmentKey::Ordinal(0));
        let label = PathSegment::new(ComponentKind::of::<Label>(), SegmentKey::Ordinal(0));
        assert_ne!(
            ScopePath::root().child(row),
            ScopePath::root().child(label)
        );
    }
}

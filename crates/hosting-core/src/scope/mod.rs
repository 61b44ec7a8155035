//! Persistent per-node state across build generations.
//!
//! Every stateful node is addressed by its [`ScopePath`]. A build opens a
//! [`ScopeStore`] over the previous [`ScopeRoot`], resolves the paths it
//! meets, and commits a new root. Handles whose path survives keep their
//! identity and state; handles whose path disappears are retired.

mod handle;
mod path;
mod store;
mod updates;

pub use handle::{ScopeHandle, ScopeId, ScopeRoot, StateValue};
pub use path::{ComponentKind, PathSegment, ScopePath, SegmentKey};
pub use store::{CommitOutcome, ResolvedScope, ScopeStore};
pub use updates::{StateUpdate, StateUpdateQueue};

//! Applies build results to a native view hierarchy.

mod container;
mod coordinator;
mod error;
mod memory;

pub use container::{ViewContainer, ViewId};
pub use coordinator::{Hit, MountCoordinator, MountStats};
pub use error::{MountError, ViewError};
pub use memory::{MemoryView, MemoryViewContainer, MutationCounters};

pub mod prelude {
    pub use crate::container::{ViewContainer, ViewId};
    pub use crate::coordinator::{MountCoordinator, MountStats};
    pub use crate::memory::MemoryViewContainer;
}

//! The hosting controller: owns one component hierarchy, decides when it is
//! rebuilt and mounts the winning build.

mod controller;
mod error;
mod ledger;
mod options;

pub use controller::HostingController;
pub use error::HostingError;
pub use ledger::RETAINED_TERMINAL_GENERATIONS;
pub use options::HostingOptions;

pub mod prelude {
    pub use crate::{HostingController, HostingError, HostingOptions};
    pub use hosting_core::{BuildMode, GenerationState};
    pub use hosting_mount::{MemoryViewContainer, ViewContainer};
}

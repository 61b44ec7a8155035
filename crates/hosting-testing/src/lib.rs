//! Testing fixtures for the view-hosting pipeline

pub mod components;
pub mod listener;
pub mod worker;

pub use components::*;
pub use listener::*;
pub use worker::*;

pub mod prelude {
    pub use crate::components::*;
    pub use crate::listener::{ListenerEvent, RecordingListener};
    pub use crate::worker::ManualWorker;
}

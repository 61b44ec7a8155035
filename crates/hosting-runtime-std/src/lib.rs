//! Standard runtime services backed by Rust's `std` library.
//!
//! This crate provides concrete implementations of the worker seam defined in
//! `hosting-core` and a wake signal a render loop can hand to a hosting
//! controller as its [`Waker`](std::task::Waker).

mod signal;
mod worker;

pub use signal::RenderSignal;
pub use worker::{StdBuildWorker, ThreadPerTaskWorker};

#[cfg(test)]
mod tests;

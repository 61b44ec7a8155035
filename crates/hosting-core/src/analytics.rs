//! Lifecycle notifications for an optional analytics sink.

use crate::build::BuildResult;
use crate::error::BuildError;
use crate::generation::Generation;

/// Receives build and mount lifecycle events from a hosting instance.
///
/// Every method is fire-and-forget. Build events may arrive on any thread;
/// mount events arrive on the rendering thread.
pub trait AnalyticsListener: Send + Sync {
    fn will_build(&self, _generation: Generation) {}

    fn did_build(&self, _result: &BuildResult) {}

    fn build_failed(&self, _generation: Generation, _error: &BuildError) {}

    /// A finished result lost to a newer generation and was dropped.
    fn result_superseded(&self, _generation: Generation, _newest: Generation) {}

    fn will_mount(&self, _result: &BuildResult) {}

    fn did_mount(&self, _result: &BuildResult) {}
}

/// Listener that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopListener;

impl AnalyticsListener for NoopListener {}

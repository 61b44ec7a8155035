//! Analytics listener that records every event it receives.

use std::sync::Mutex;

use hosting_core::{AnalyticsListener, BuildError, BuildResult, Generation};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListenerEvent {
    WillBuild(Generation),
    DidBuild(Generation),
    BuildFailed(Generation),
    Superseded { generation: Generation, newest: Generation },
    WillMount(Generation),
    DidMount(Generation),
}

#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<ListenerEvent>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ListenerEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Generations that reached `DidMount`, in order.
    pub fn mounted(&self) -> Vec<Generation> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ListenerEvent::DidMount(generation) => Some(generation),
                _ => None,
            })
            .collect()
    }

    pub fn superseded(&self) -> Vec<Generation> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ListenerEvent::Superseded { generation, .. } => Some(generation),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    fn push(&self, event: ListenerEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl AnalyticsListener for RecordingListener {
    fn will_build(&self, generation: Generation) {
        self.push(ListenerEvent::WillBuild(generation));
    }

    fn did_build(&self, result: &BuildResult) {
        self.push(ListenerEvent::DidBuild(result.generation()));
    }

    fn build_failed(&self, generation: Generation, _error: &BuildError) {
        self.push(ListenerEvent::BuildFailed(generation));
    }

    fn result_superseded(&self, generation: Generation, newest: Generation) {
        self.push(ListenerEvent::Superseded { generation, newest });
    }

    fn will_mount(&self, result: &BuildResult) {
        self.push(ListenerEvent::WillMount(result.generation()));
    }

    fn did_mount(&self, result: &BuildResult) {
        self.push(ListenerEvent::DidMount(result.generation()));
    }
}

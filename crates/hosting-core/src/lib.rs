#![doc = r"Scope store, predicate cache and build engine for the view-hosting pipeline."]

pub mod analytics;
pub mod animation;
pub mod build;
pub mod collections;
pub mod component;
pub mod error;
pub mod generation;
pub mod hash;
pub mod layout;
pub mod predicate;
pub mod scope;
pub mod thread;
pub mod tree;
pub mod worker;

pub use analytics::{AnalyticsListener, NoopListener};
pub use animation::{
    Animation, AnimationError, AnimationHint, AnimationPhase, AnimationTarget, GroupKind, TimingFunction,
};
pub use build::{BuildEngine, BuildInputs, BuildMode, BuildResult};
pub use component::{
    AttributeValue, Attributes, Component, ComponentController, ComponentProvider, ViewClass,
    ViewSpec,
};
pub use error::{BuildError, ProviderError, StructuralError};
pub use generation::{AppliedGeneration, Generation, GenerationCounter, GenerationState};
pub use layout::{compute_layout, ChildMeasurer, LayoutBox, LayoutTree, MeasureResult};
pub use predicate::{
    ComponentPredicate, ControllerPredicate, PredicateId, PredicateMatches, PredicateSet,
};
pub use scope::{
    CommitOutcome, ComponentKind, PathSegment, ResolvedScope, ScopeHandle, ScopeId, ScopePath,
    ScopeRoot, ScopeStore, SegmentKey, StateUpdate, StateUpdateQueue, StateValue,
};
pub use thread::RenderThread;
pub use tree::{CollisionPolicy, ComponentNode, ComponentTree, NodeBuilder, NodeIndex, TreeBuilder};
pub use worker::{BuildTask, BuildWorker, InlineWorker};

pub use hosting_ui_graphics::{Point, Rect, Size};
pub use hosting_ui_layout::{Constraints, FlexibleSizeRange, SizeRange, SizeRangeProvider};

pub mod prelude {
    pub use crate::component::{Component, ComponentController, ViewSpec};
    pub use crate::layout::{ChildMeasurer, MeasureResult};
    pub use crate::tree::{NodeBuilder, TreeBuilder};
    pub use crate::{BuildMode, BuildResult, ProviderError, ScopePath};
    pub use hosting_ui_graphics::{Point, Rect, Size};
    pub use hosting_ui_layout::Constraints;
}

#[cfg(test)]
mod tests;

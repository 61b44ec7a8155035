//! The node abstraction the component provider builds trees from.

use std::any::Any;
use std::fmt;

use hosting_ui_layout::Constraints;
use indexmap::IndexMap;

use crate::animation::{Animation, AnimationPhase};
use crate::error::ProviderError;
use crate::layout::{ChildMeasurer, MeasureResult};
use crate::tree::TreeBuilder;

/// One node of the declarative tree for one generation.
///
/// Components are immutable values shared across threads. Their capabilities
/// are split into small defaulted methods: layout, the native view they want
/// mounted, and the animations they request.
pub trait Component: Any + Send + Sync + fmt::Debug {
    /// Measures this node and positions its children.
    ///
    /// The default lays every child out at the origin with loosened
    /// constraints and takes the largest child size.
    fn measure(&self, constraints: Constraints, children: &mut ChildMeasurer<'_>) -> MeasureResult {
        children.overlay(constraints)
    }

    /// The native view this node needs, if any.
    fn view(&self) -> Option<ViewSpec> {
        None
    }

    fn animations(&self, _phase: AnimationPhase) -> Vec<Animation> {
        Vec::new()
    }
}

impl dyn Component {
    pub fn as_any(&self) -> &dyn Any {
        self
    }

    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: Component>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// Long-lived companion object owned by a node's scope.
///
/// Hooks run on the rendering thread, after the mount that caused them.
pub trait ComponentController: Any + Send + Sync {
    fn did_mount(&self) {}
    fn did_update(&self) {}
    /// The owning scope disappeared from the applied tree.
    fn invalidate(&self) {}
}

impl dyn ComponentController {
    pub fn as_any(&self) -> &dyn Any {
        self
    }

    pub fn downcast_ref<T: ComponentController>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Class of native view, e.g. `"label"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ViewClass(pub &'static str);

impl ViewClass {
    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ViewClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f32),
    Text(String),
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<f32> for AttributeValue {
    fn from(value: f32) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

/// View attributes in the order they should be applied.
pub type Attributes = IndexMap<&'static str, AttributeValue>;

/// The native view a component wants, with the attributes to set on it.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewSpec {
    pub class: ViewClass,
    pub attributes: Attributes,
}

impl ViewSpec {
    pub fn new(class: &'static str) -> Self {
        Self {
            class: ViewClass(class),
            attributes: Attributes::new(),
        }
    }

    pub fn with(mut self, name: &'static str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name, value.into());
        self
    }
}

/// Turns a model and context into a component tree.
///
/// Called once per build on whichever thread runs the build. Must emit
/// exactly one root through the [`TreeBuilder`].
pub trait ComponentProvider<M, C>: Send + Sync + 'static {
    fn provide(&self, model: &M, context: &C, tree: &mut TreeBuilder<'_>)
        -> Result<(), ProviderError>;
}

impl<M, C, F> ComponentProvider<M, C> for F
where
    F: Fn(&M, &C, &mut TreeBuilder<'_>) -> Result<(), ProviderError> + Send + Sync + 'static,
{
    fn provide(
        &self,
        model: &M,
        context: &C,
        tree: &mut TreeBuilder<'_>,
    ) -> Result<(), ProviderError> {
        self(model, context, tree)
    }
}

use hosting_core::{Animation, AttributeValue, ViewClass};
use hosting_ui_graphics::Rect;

use crate::ViewError;

pub type ViewId = usize;

/// The native view hierarchy a mount coordinator drives.
///
/// Every method is called on the rendering thread. Frames are relative to
/// the view's parent.
pub trait ViewContainer {
    /// The view everything is mounted into.
    fn root(&self) -> ViewId;

    /// Creates (or recycles) a detached view of `class`.
    fn create_view(&mut self, class: ViewClass) -> ViewId;

    fn class_of(&self, view: ViewId) -> Result<ViewClass, ViewError>;

    /// Parent and position of an attached view.
    fn parent_of(&self, view: ViewId) -> Option<(ViewId, usize)>;

    /// Attaches `child` under `parent` at `index`, detaching it from any
    /// previous parent first. Indices past the end append.
    fn insert_child(&mut self, parent: ViewId, child: ViewId, index: usize) -> Result<(), ViewError>;

    /// Detaches `view` and releases it. Children still attached to it are
    /// detached as well.
    fn remove_view(&mut self, view: ViewId) -> Result<(), ViewError>;

    fn set_frame(&mut self, view: ViewId, frame: Rect) -> Result<(), ViewError>;

    fn set_attribute(
        &mut self,
        view: ViewId,
        name: &'static str,
        value: &AttributeValue,
    ) -> Result<(), ViewError>;

    fn clear_attribute(&mut self, view: ViewId, name: &'static str) -> Result<(), ViewError>;

    /// Runs or schedules `animation` on `view`.
    fn animate(&mut self, _view: ViewId, _animation: &Animation) {}
}

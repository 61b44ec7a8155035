//! Pure geometry shared by the hosting pipeline.
//!
//! Sizes, points and rectangles are plain `f32` value types. Nothing in this
//! crate knows about components, scopes or views.

mod geometry;

pub use geometry::*;

pub mod prelude {
    pub use crate::geometry::{Point, Rect, Size};
}

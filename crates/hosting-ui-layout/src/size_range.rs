//! Size ranges handed to a build, and the policies that derive them from a
//! bounding box.

use hosting_ui_graphics::Size;

use crate::Constraints;

/// Minimum and maximum size a root layout may take.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizeRange {
    pub min: Size,
    pub max: Size,
}

impl SizeRange {
    pub fn new(min: Size, max: Size) -> Self {
        Self { min, max }
    }

    /// A range that admits exactly `size`.
    pub fn exactly(size: Size) -> Self {
        Self {
            min: size,
            max: size,
        }
    }

    /// Clamps `size` into the range.
    pub fn clamp(&self, size: Size) -> Size {
        self.to_constraints().constrain_size(size)
    }

    pub fn to_constraints(&self) -> Constraints {
        Constraints {
            min_width: self.min.width,
            max_width: self.max.width,
            min_height: self.min.height,
            max_height: self.max.height,
        }
        .normalized()
    }
}

impl From<SizeRange> for Constraints {
    fn from(range: SizeRange) -> Self {
        range.to_constraints()
    }
}

/// Turns a bounding box into the size range used for one build.
///
/// Called once per build, possibly off the rendering thread.
pub trait SizeRangeProvider: Send + Sync + 'static {
    fn size_range(&self, bounding: Size) -> SizeRange;
}

impl<F> SizeRangeProvider for F
where
    F: Fn(Size) -> SizeRange + Send + Sync + 'static,
{
    fn size_range(&self, bounding: Size) -> SizeRange {
        self(bounding)
    }
}

/// Policy that pins some dimensions to the bounding box and lets others grow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FlexibleSizeRange {
    /// Both dimensions match the bounding box exactly.
    #[default]
    None,
    /// Width may range from zero to unbounded; height matches the box.
    FlexibleWidth,
    /// Height may range from zero to unbounded; width matches the box.
    FlexibleHeight,
    /// Neither dimension is pinned.
    FlexibleWidthAndHeight,
}

impl SizeRangeProvider for FlexibleSizeRange {
    fn size_range(&self, bounding: Size) -> SizeRange {
        let (flex_width, flex_height) = match self {
            FlexibleSizeRange::None => (false, false),
            FlexibleSizeRange::FlexibleWidth => (true, false),
            FlexibleSizeRange::FlexibleHeight => (false, true),
            FlexibleSizeRange::FlexibleWidthAndHeight => (true, true),
        };
        let (min_width, max_width) = if flex_width {
            (0.0, f32::INFINITY)
        } else {
            (bounding.width, bounding.width)
        };
        let (min_height, max_height) = if flex_height {
            (0.0, f32::INFINITY)
        } else {
            (bounding.height, bounding.height)
        };
        SizeRange {
            min: Size::new(min_width, min_height),
            max: Size::new(max_width, max_height),
        }
    }
}

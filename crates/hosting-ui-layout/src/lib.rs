//! Layout contracts & size-range policies for the hosting pipeline

mod constraints;
mod size_range;

pub use constraints::*;
pub use size_range::*;

pub mod prelude {
    pub use crate::constraints::Constraints;
    pub use crate::size_range::{FlexibleSizeRange, SizeRange, SizeRangeProvider};
}

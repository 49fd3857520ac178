//! Safe bounding box types and functions in inclusive pixel coordinates.

mod common;

pub use transform::*;
mod transform;

pub use rect::*;
pub mod rect;

pub use xyxy::*;
pub mod xyxy;

pub use size::*;
pub mod size;

pub use crop::*;
pub mod crop;

pub mod prelude {
    pub use crate::rect::{Rect, RectFloat, RectNum};
}

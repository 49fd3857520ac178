//! Pairwise intersection over union.

use crate::common::*;

/// Compute the IoU of every pair of boxes.
///
/// The output has one row per box in `lhs` and one column per box in `rhs`.
/// Pairs involving a box with zero area have IoU zero.
pub fn compute_overlaps<L, R>(lhs: &[L], rhs: &[R]) -> Array2<f32>
where
    L: Rect<Type = f32>,
    R: Rect<Type = f32>,
{
    let lhs_areas: Vec<f32> = lhs.iter().map(|rect| rect.area()).collect();
    let rhs_areas: Vec<f32> = rhs.iter().map(|rect| rect.area()).collect();

    Array2::from_shape_fn((lhs.len(), rhs.len()), |(row, col)| {
        lhs[row].iou_with_areas(&rhs[col], lhs_areas[row], rhs_areas[col])
    })
}

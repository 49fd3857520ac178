use super::XYXY;
use crate::common::*;

/// The generic rectangle in inclusive pixel coordinates.
///
/// The rectangle covers every pixel from `xmin` to `xmax` and from `ymin` to
/// `ymax`, both ends included.
pub trait Rect {
    type Type;

    fn xmin(&self) -> Self::Type;
    fn ymin(&self) -> Self::Type;
    fn xmax(&self) -> Self::Type;
    fn ymax(&self) -> Self::Type;

    fn try_from_xyxy(xyxy: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;
}

pub trait RectNum: Rect
where
    Self::Type: Copy + Num + PartialOrd,
{
    fn from_xyxy(xyxy: [Self::Type; 4]) -> Self
    where
        Self: Sized,
    {
        Self::try_from_xyxy(xyxy).unwrap()
    }

    /// Width in pixels, `xmax - xmin + 1`.
    fn w(&self) -> Self::Type {
        self.xmax() - self.xmin() + Self::Type::one()
    }

    /// Height in pixels, `ymax - ymin + 1`.
    fn h(&self) -> Self::Type {
        self.ymax() - self.ymin() + Self::Type::one()
    }

    fn cx(&self) -> Self::Type {
        let two = Self::Type::one() + Self::Type::one();
        self.xmin() + self.w() / two
    }

    fn cy(&self) -> Self::Type {
        let two = Self::Type::one() + Self::Type::one();
        self.ymin() + self.h() / two
    }

    fn xyxy(&self) -> [Self::Type; 4] {
        [self.xmin(), self.ymin(), self.xmax(), self.ymax()]
    }

    fn to_xyxy(&self) -> XYXY<Self::Type> {
        XYXY {
            xmin: self.xmin(),
            ymin: self.ymin(),
            xmax: self.xmax(),
            ymax: self.ymax(),
        }
    }

    fn area(&self) -> Self::Type {
        self.w() * self.h()
    }

    /// A box collapsed onto a line. Such boxes are dropped from ground truth.
    fn is_degenerate(&self) -> bool {
        self.xmin() == self.xmax() || self.ymin() == self.ymax()
    }
}

pub trait RectFloat: RectNum
where
    Self::Type: Float,
{
    /// Compute the intersection area in pixels.
    ///
    /// Sides of the overlapping region are counted inclusively, so two boxes
    /// sharing a single column intersect by one pixel width.
    fn intersection_area_with<R>(&self, other: &R) -> Self::Type
    where
        R: Rect<Type = Self::Type>,
    {
        let zero = Self::Type::zero();
        let one = Self::Type::one();
        let iw = self.xmax().min(other.xmax()) - self.xmin().max(other.xmin()) + one;
        if iw <= zero {
            return zero;
        }
        let ih = self.ymax().min(other.ymax()) - self.ymin().max(other.ymin()) + one;
        if ih <= zero {
            return zero;
        }
        iw * ih
    }

    /// Intersection over union with precomputed areas of both boxes.
    fn iou_with_areas<R>(&self, other: &R, area: Self::Type, other_area: Self::Type) -> Self::Type
    where
        R: Rect<Type = Self::Type>,
    {
        let zero = Self::Type::zero();
        if area <= zero || other_area <= zero {
            return zero;
        }
        let inter_area = self.intersection_area_with(other);
        let union_area = area + other_area - inter_area;
        if union_area <= zero {
            return zero;
        }
        inter_area / union_area
    }

    fn iou_with<R>(&self, other: &R) -> Self::Type
    where
        R: Rect<Type = Self::Type>,
    {
        self.iou_with_areas(other, self.area(), other.area())
    }
}

impl<T> RectNum for T
where
    T: Rect,
    T::Type: Copy + Num + PartialOrd,
{
}

impl<T> RectFloat for T
where
    T: Rect,
    T::Type: Float,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rect_inclusive_size() {
        let rect = XYXY::from_xyxy([0.0, 0.0, 15.0, 15.0]);
        assert_eq!(rect.w(), 16.0);
        assert_eq!(rect.h(), 16.0);
        assert_eq!(rect.cx(), 8.0);
        assert_eq!(rect.area(), 256.0);
    }

    #[test]
    fn rect_iou() {
        let lhs = XYXY::from_xyxy([0.0, 0.0, 15.0, 15.0]);
        let rhs = XYXY::from_xyxy([8.0, 8.0, 23.0, 23.0]);
        let far = XYXY::from_xyxy([100.0, 100.0, 120.0, 130.0]);

        assert_abs_diff_eq!(lhs.iou_with(&lhs), 1.0);
        assert_abs_diff_eq!(lhs.iou_with(&rhs), 64.0 / 448.0);
        assert_eq!(lhs.iou_with(&rhs), rhs.iou_with(&lhs));
        assert_eq!(lhs.iou_with(&far), 0.0);
        assert_eq!(far.iou_with(&lhs), 0.0);
    }

    #[test]
    fn rect_iou_touching_edge() {
        // sharing the column x = 15 is a one pixel wide overlap
        let lhs = XYXY::from_xyxy([0.0f32, 0.0, 15.0, 15.0]);
        let rhs = XYXY::from_xyxy([15.0f32, 0.0, 30.0, 15.0]);
        assert_abs_diff_eq!(lhs.intersection_area_with(&rhs), 16.0);

        let rhs = XYXY::from_xyxy([16.0f32, 0.0, 30.0, 15.0]);
        assert_eq!(lhs.intersection_area_with(&rhs), 0.0);
    }

    #[test]
    fn rect_iou_zero_area() {
        let rect = XYXY::from_xyxy([0.0f32, 0.0, 15.0, 15.0]);
        let empty = XYXY::from_xyxy([4.0f32, 4.0, 4.0, 10.0]);
        assert_eq!(rect.iou_with_areas(&empty, rect.area(), 0.0), 0.0);
        assert_eq!(empty.iou_with_areas(&rect, 0.0, rect.area()), 0.0);
    }

    #[test]
    fn rect_degenerate() {
        assert!(XYXY::from_xyxy([4.0, 1.0, 4.0, 10.0]).is_degenerate());
        assert!(XYXY::from_xyxy([1.0, 4.0, 10.0, 4.0]).is_degenerate());
        assert!(!XYXY::from_xyxy([1.0, 4.0, 10.0, 5.0]).is_degenerate());
    }
}

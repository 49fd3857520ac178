use super::{Rect, XYXY};
use crate::{common::*, CropBox};

/// The box transform mirroring the crop, flip and resize done on the paired image.
///
/// Steps are applied in order: translate into the crop and clamp to its
/// extent, mirror horizontally, then multiply by `scale`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transform<T> {
    pub crop: Option<CropBox<T>>,
    /// Mirror around this width when set.
    pub flip_width: Option<T>,
    pub scale: T,
}

impl<T> Transform<T>
where
    T: Float,
{
    /// Build the transform from the crop of the paired image.
    ///
    /// Flipping mirrors around the crop width.
    pub fn from_crop(crop: CropBox<T>, flip: bool, scale: T) -> Self {
        Self {
            crop: Some(crop),
            flip_width: flip.then(|| crop.w),
            scale,
        }
    }

    pub fn apply<R>(&self, rect: &R) -> XYXY<T>
    where
        R: Rect<Type = T>,
    {
        let zero = T::zero();
        let one = T::one();
        let [mut xmin, mut ymin, mut xmax, mut ymax] =
            [rect.xmin(), rect.ymin(), rect.xmax(), rect.ymax()];

        if let Some(crop) = &self.crop {
            xmin = (xmin - crop.x).max(zero).min(crop.w);
            ymin = (ymin - crop.y).max(zero).min(crop.h);
            xmax = (xmax - crop.x).max(zero).min(crop.w);
            ymax = (ymax - crop.y).max(zero).min(crop.h);
        }

        if let Some(width) = self.flip_width {
            let orig_xmin = xmin;
            xmin = width - xmax - one;
            xmax = width - orig_xmin - one;
        }

        XYXY {
            xmin: xmin * self.scale,
            ymin: ymin * self.scale,
            xmax: xmax * self.scale,
            ymax: ymax * self.scale,
        }
    }
}

impl<T> Mul<&XYXY<T>> for &Transform<T>
where
    T: Float,
{
    type Output = XYXY<T>;

    fn mul(self, rhs: &XYXY<T>) -> Self::Output {
        self.apply(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RectNum, Size};

    #[test]
    fn transform_flip_then_scale() {
        let rect = XYXY::from_xyxy([10.0f32, 20.0, 90.0, 120.0]);
        let crop = CropBox::whole(Size::from_wh([500.0f32, 375.0]));
        let transform = Transform::from_crop(crop, true, 1.6);
        let output = &transform * &rect;

        assert_eq!(output.xmin(), 409.0f32 * 1.6);
        assert_eq!(output.xmax(), 489.0f32 * 1.6);
        assert_eq!(output.ymin(), 20.0f32 * 1.6);
        assert_eq!(output.ymax(), 120.0f32 * 1.6);
    }

    #[test]
    fn transform_crop_clamps() {
        let crop = CropBox {
            x: 100.0f32,
            y: 37.0,
            w: 300.0,
            h: 300.0,
        };
        let transform = Transform::from_crop(crop, false, 2.0);

        let partial = XYXY::from_xyxy([59.0f32, 84.0, 262.0, 373.0]);
        assert_eq!(
            (&transform * &partial).xyxy(),
            [0.0, 94.0, 324.0, 600.0]
        );

        let outside = XYXY::from_xyxy([10.0f32, 50.0, 30.0, 70.0]);
        let output = &transform * &outside;
        assert_eq!(output.xyxy(), [0.0, 26.0, 0.0, 66.0]);
        assert!(output.is_degenerate());
    }
}

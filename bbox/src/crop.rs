use crate::{common::*, Size};

/// Crop rectangle in source image pixels.
///
/// `x` and `y` locate the top-left corner, `w` and `h` give the extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropBox<T> {
    pub x: T,
    pub y: T,
    pub w: T,
    pub h: T,
}

impl<T> CropBox<T>
where
    T: Copy + Num + PartialOrd,
{
    /// The crop that keeps the whole image.
    pub fn whole(size: Size<T>) -> Self {
        Self {
            x: T::zero(),
            y: T::zero(),
            w: size.w(),
            h: size.h(),
        }
    }

    pub fn size(&self) -> Size<T> {
        Size::from_wh([self.w, self.h])
    }

    /// Check if the crop lies entirely within an image of `size`.
    pub fn fits_in(&self, size: &Size<T>) -> bool {
        self.x + self.w <= size.w() && self.y + self.h <= size.h()
    }
}

impl<T> CropBox<T> {
    pub fn try_cast<V>(self) -> Option<CropBox<V>>
    where
        T: ToPrimitive,
        V: NumCast,
    {
        Some(CropBox {
            x: V::from(self.x)?,
            y: V::from(self.y)?,
            w: V::from(self.w)?,
            h: V::from(self.h)?,
        })
    }

    pub fn cast<V>(self) -> CropBox<V>
    where
        T: ToPrimitive,
        V: NumCast,
    {
        self.try_cast().unwrap()
    }
}

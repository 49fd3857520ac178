use bbox::{Rect, RectNum, Transform, XYXY};
use num_traits::{Float, Num};
use std::ops::Mul;

/// An annotated object: a box with its class and the difficult flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label<R, C>
where
    R: Rect,
{
    pub rect: R,
    pub class: C,
    pub difficult: bool,
}

impl<R, C> Label<R, C>
where
    R: Rect,
    R::Type: Copy + Num + PartialOrd,
{
    pub fn is_degenerate(&self) -> bool {
        self.rect.is_degenerate()
    }
}

impl<'a, T, C> Mul<&'a Label<XYXY<T>, C>> for &'a Transform<T>
where
    T: Float,
    C: Copy,
{
    type Output = Label<XYXY<T>, C>;

    fn mul(self, rhs: &'a Label<XYXY<T>, C>) -> Self::Output {
        Label {
            rect: self * &rhs.rect,
            class: rhs.class,
            difficult: rhs.difficult,
        }
    }
}

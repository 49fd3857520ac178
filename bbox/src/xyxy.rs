use super::Rect;
use crate::common::*;

/// Bounding box given by its inclusive corner coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct XYXY<T> {
    pub(crate) xmin: T,
    pub(crate) ymin: T,
    pub(crate) xmax: T,
    pub(crate) ymax: T,
}

impl<T> XYXY<T>
where
    T: Copy + Num,
{
    /// Move the box by `dx` pixels right and `dy` pixels down.
    pub fn shift(&self, dx: T, dy: T) -> Self {
        XYXY {
            xmin: self.xmin + dx,
            ymin: self.ymin + dy,
            xmax: self.xmax + dx,
            ymax: self.ymax + dy,
        }
    }
}

impl<T> Rect for XYXY<T>
where
    T: Copy + Num + PartialOrd,
{
    type Type = T;

    fn xmin(&self) -> Self::Type {
        self.xmin
    }

    fn ymin(&self) -> Self::Type {
        self.ymin
    }

    fn xmax(&self) -> Self::Type {
        self.xmax
    }

    fn ymax(&self) -> Self::Type {
        self.ymax
    }

    fn try_from_xyxy(xyxy: [Self::Type; 4]) -> Result<Self> {
        let [xmin, ymin, xmax, ymax] = xyxy;
        ensure!(
            xmax >= xmin && ymax >= ymin,
            "xmax >= xmin and ymax >= ymin must hold"
        );
        Ok(Self {
            xmin,
            ymin,
            xmax,
            ymax,
        })
    }
}

impl<T> From<XYXY<T>> for [T; 4] {
    fn from(from: XYXY<T>) -> Self {
        let XYXY {
            xmin,
            ymin,
            xmax,
            ymax,
        } = from;
        [xmin, ymin, xmax, ymax]
    }
}

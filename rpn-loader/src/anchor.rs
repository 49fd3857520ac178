//! Anchor lattice generation.

use crate::common::*;

/// Generate the anchors centered on the first feature cell.
///
/// The reference window is the square `[0, 0, base_size - 1, base_size - 1]`.
/// For each ratio the window is reshaped to keep its area, then it is enlarged
/// by every scale. Ratios vary slowest. Widths and heights are rounded half to
/// even, and a window rounded down to zero pixels is an error.
pub fn generate_base_anchors(
    base_size: f32,
    ratios: &[f32],
    scales: &[f32],
) -> Result<Vec<XYXY<f32>>> {
    let base_size = base_size as f64;
    let center = (base_size - 1.0) / 2.0;
    let area = base_size * base_size;

    iproduct!(ratios, scales)
        .map(|(&ratio, &scale)| {
            let ratio_w = (area / ratio as f64).sqrt().round_ties_even();
            let ratio_h = (ratio_w * ratio as f64).round_ties_even();
            let w = ratio_w * scale as f64;
            let h = ratio_h * scale as f64;
            ensure!(
                w >= 1.0 && h >= 1.0,
                "the anchor of base size {}, ratio {} and scale {} is {}x{} pixels, \
                 but must be at least one pixel wide and high",
                base_size,
                ratio,
                scale,
                w,
                h
            );

            XYXY::try_from_xyxy([
                (center - (w - 1.0) / 2.0) as f32,
                (center - (h - 1.0) / 2.0) as f32,
                (center + (w - 1.0) / 2.0) as f32,
                (center + (h - 1.0) / 2.0) as f32,
            ])
        })
        .try_collect()
}

/// The anchors tiled over every cell of the feature grid.
///
/// Anchors are ordered by cell in row-major order. Within a cell, the base
/// anchors keep their order. The lattice is immutable once generated.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorLattice {
    num_base_anchors: usize,
    anchors: Vec<XYXY<f32>>,
}

impl AnchorLattice {
    pub fn generate(
        base_size: f32,
        ratios: &[f32],
        scales: &[f32],
        feature_size: Size<usize>,
        stride: usize,
    ) -> Result<Self> {
        let base_anchors = generate_base_anchors(base_size, ratios, scales)?;
        let anchors: Vec<_> = iproduct!(0..feature_size.h(), 0..feature_size.w())
            .flat_map(|(y, x)| {
                let shift_x = (x * stride) as f32;
                let shift_y = (y * stride) as f32;
                base_anchors
                    .iter()
                    .map(move |anchor| anchor.shift(shift_x, shift_y))
            })
            .collect();

        trace!(
            "generated {} anchors over {}x{} cells",
            anchors.len(),
            feature_size.w(),
            feature_size.h()
        );

        Ok(Self {
            num_base_anchors: base_anchors.len(),
            anchors,
        })
    }

    /// The number of anchors per feature cell.
    pub fn num_base_anchors(&self) -> usize {
        self.num_base_anchors
    }

    pub fn anchors(&self) -> &[XYXY<f32>] {
        &self.anchors
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Indices of anchors lying within the image extended by `border` pixels
    /// on every side.
    pub fn inside_indices(&self, image_size: Size<usize>, border: f32) -> Vec<usize> {
        let width = image_size.w() as f32;
        let height = image_size.h() as f32;

        self.anchors
            .iter()
            .enumerate()
            .filter(|(_, anchor)| {
                anchor.xmin() >= -border
                    && anchor.ymin() >= -border
                    && anchor.xmax() < width + border
                    && anchor.ymax() < height + border
            })
            .map(|(index, _)| index)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATIOS: [f32; 3] = [0.5, 1.0, 2.0];
    const SCALES: [f32; 3] = [8.0, 16.0, 32.0];

    #[test]
    fn base_anchors_reference() {
        let expect: [[f32; 4]; 9] = [
            [-84.0, -40.0, 99.0, 55.0],
            [-176.0, -88.0, 191.0, 103.0],
            [-360.0, -184.0, 375.0, 199.0],
            [-56.0, -56.0, 71.0, 71.0],
            [-120.0, -120.0, 135.0, 135.0],
            [-248.0, -248.0, 263.0, 263.0],
            [-36.0, -80.0, 51.0, 95.0],
            [-80.0, -168.0, 95.0, 183.0],
            [-168.0, -344.0, 183.0, 359.0],
        ];
        let anchors = generate_base_anchors(16.0, &RATIOS, &SCALES).unwrap();

        assert_eq!(anchors.len(), expect.len());
        anchors.iter().zip(expect).for_each(|(anchor, expect)| {
            assert_eq!(anchor.xyxy(), expect);
        });
    }

    #[test]
    fn lattice_size_and_order() {
        let feature_size = Size::from_wh([62, 62]);
        let lattice = AnchorLattice::generate(16.0, &RATIOS, &SCALES, feature_size, 16).unwrap();
        assert_eq!(lattice.len(), 9 * 62 * 62);
        assert_eq!(lattice.len(), 34596);
        assert_eq!(lattice.num_base_anchors(), 9);

        let anchors = lattice.anchors();
        assert_eq!(anchors[0].xyxy(), [-84.0, -40.0, 99.0, 55.0]);
        assert_eq!(anchors[9].xyxy(), [-84.0 + 16.0, -40.0, 99.0 + 16.0, 55.0]);
        assert_eq!(
            anchors[9 * 62 + 3].xyxy(),
            [-56.0, -56.0 + 16.0, 71.0, 71.0 + 16.0]
        );
    }

    #[test]
    fn lattice_is_deterministic() {
        let feature_size = Size::from_wh([25, 18]);
        let lhs = AnchorLattice::generate(16.0, &RATIOS, &SCALES, feature_size, 16).unwrap();
        let rhs = AnchorLattice::generate(16.0, &RATIOS, &SCALES, feature_size, 16).unwrap();
        assert_eq!(lhs, rhs);
        assert_eq!(lhs.len(), 9 * 25 * 18);
    }

    #[test]
    fn inside_anchors() {
        let lattice =
            AnchorLattice::generate(16.0, &[1.0], &[1.0], Size::from_wh([3, 3]), 16).unwrap();
        let image_size = Size::from_wh([40, 40]);

        assert_eq!(lattice.inside_indices(image_size, 0.0), vec![0, 1, 3, 4]);
        assert_eq!(lattice.inside_indices(image_size, 8.0).len(), 9);
    }

    #[test]
    fn reject_empty_base_anchor() {
        // sqrt(1 / 4) rounds to zero pixels
        assert!(generate_base_anchors(1.0, &[4.0], &[1.0]).is_err());
        assert!(
            AnchorLattice::generate(1.0, &[4.0], &[1.0], Size::from_wh([2, 2]), 16).is_err()
        );
        assert!(generate_base_anchors(1.0, &[1.0], &[1.0]).is_ok());
    }
}

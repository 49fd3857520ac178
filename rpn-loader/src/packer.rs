//! Packing of transformed examples into flat output buffers.

use crate::{assign::AnchorLabel, common::*, config::LocalizationConfig, transformer::Transformed};

/// Owned storage for every localization output buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputBuffers {
    pub bbtargets: Vec<f32>,
    pub bbtargets_mask: Vec<f32>,
    pub labels_flat: Vec<i32>,
    pub labels_mask: Vec<i32>,
    pub im_shape: Vec<i32>,
    pub gt_boxes: Vec<f32>,
    pub num_gt_boxes: Vec<i32>,
    pub gt_classes: Vec<i32>,
    pub im_scale: Vec<f32>,
    pub gt_difficult: Vec<i32>,
}

impl OutputBuffers {
    /// Allocate zeroed buffers sized by the configuration.
    pub fn new(config: &LocalizationConfig) -> Self {
        let num_anchors = config.num_anchors();
        let max_gt_boxes = config.max_gt_boxes();

        Self {
            bbtargets: vec![0.0; num_anchors * 4],
            bbtargets_mask: vec![0.0; num_anchors * 4],
            labels_flat: vec![0; num_anchors * 2],
            labels_mask: vec![0; num_anchors * 2],
            im_shape: vec![0; 2],
            gt_boxes: vec![0.0; max_gt_boxes * 4],
            num_gt_boxes: vec![0; 1],
            gt_classes: vec![0; max_gt_boxes],
            im_scale: vec![0.0; 1],
            gt_difficult: vec![0; max_gt_boxes],
        }
    }

    pub fn slices(&mut self) -> OutputSlices<'_> {
        OutputSlices {
            bbtargets: &mut self.bbtargets,
            bbtargets_mask: &mut self.bbtargets_mask,
            labels_flat: &mut self.labels_flat,
            labels_mask: &mut self.labels_mask,
            im_shape: &mut self.im_shape,
            gt_boxes: &mut self.gt_boxes,
            num_gt_boxes: &mut self.num_gt_boxes,
            gt_classes: &mut self.gt_classes,
            im_scale: &mut self.im_scale,
            gt_difficult: &mut self.gt_difficult,
        }
    }
}

/// Caller owned destination buffers, in packing order.
#[derive(Debug)]
pub struct OutputSlices<'a> {
    pub bbtargets: &'a mut [f32],
    pub bbtargets_mask: &'a mut [f32],
    pub labels_flat: &'a mut [i32],
    pub labels_mask: &'a mut [i32],
    pub im_shape: &'a mut [i32],
    pub gt_boxes: &'a mut [f32],
    pub num_gt_boxes: &'a mut [i32],
    pub gt_classes: &'a mut [i32],
    pub im_scale: &'a mut [f32],
    pub gt_difficult: &'a mut [i32],
}

/// Writes [Transformed] examples into output buffers.
#[derive(Debug, Clone)]
pub struct Packer {
    config: Arc<LocalizationConfig>,
}

impl Packer {
    pub fn new(config: Arc<LocalizationConfig>) -> Self {
        Self { config }
    }

    /// Fill every buffer from the transformed example.
    ///
    /// Regression targets are written for foreground anchors only. Foreground
    /// anchors are labeled `[0, 1]` and all others `[1, 0]`, while the label
    /// mask marks the sampled anchors. Unused ground truth slots are zero.
    ///
    /// # Panics
    /// It panics if a buffer length disagrees with the configuration.
    pub fn pack(&self, transformed: &Transformed, out: OutputSlices<'_>) {
        let OutputSlices {
            bbtargets,
            bbtargets_mask,
            labels_flat,
            labels_mask,
            im_shape,
            gt_boxes,
            num_gt_boxes,
            gt_classes,
            im_scale,
            gt_difficult,
        } = out;
        let Transformed {
            gt_boxes: gt,
            image_size,
            image_scale,
            assignment,
        } = transformed;

        let num_anchors = self.config.num_anchors();
        let max_gt_boxes = self.config.max_gt_boxes();

        assert_eq!(bbtargets.len(), num_anchors * 4, "bbtargets size mismatch");
        assert_eq!(
            bbtargets_mask.len(),
            num_anchors * 4,
            "bbtargets_mask size mismatch"
        );
        assert_eq!(labels_flat.len(), num_anchors * 2, "labels_flat size mismatch");
        assert_eq!(labels_mask.len(), num_anchors * 2, "labels_mask size mismatch");
        assert_eq!(im_shape.len(), 2, "im_shape size mismatch");
        assert_eq!(gt_boxes.len(), max_gt_boxes * 4, "gt_boxes size mismatch");
        assert_eq!(num_gt_boxes.len(), 1, "num_gt_boxes size mismatch");
        assert_eq!(gt_classes.len(), max_gt_boxes, "gt_classes size mismatch");
        assert_eq!(im_scale.len(), 1, "im_scale size mismatch");
        assert_eq!(gt_difficult.len(), max_gt_boxes, "gt_difficult size mismatch");
        assert_eq!(
            assignment.num_anchors(),
            num_anchors,
            "assignment anchor count mismatch"
        );
        assert!(gt.len() <= max_gt_boxes, "too many ground truth boxes");

        // regression targets
        bbtargets.fill(0.0);
        bbtargets_mask.fill(0.0);
        izip!(assignment.foreground_index(), assignment.targets()).for_each(
            |(&index, target)| {
                let range = (index * 4)..(index * 4 + 4);
                bbtargets[range.clone()].copy_from_slice(&target.to_array());
                bbtargets_mask[range].fill(1.0);
            },
        );

        // labels
        izip!(
            assignment.labels(),
            labels_flat.chunks_exact_mut(2),
            labels_mask.chunks_exact_mut(2)
        )
        .for_each(|(label, flat, mask)| {
            let scores = match label {
                AnchorLabel::Foreground => [0, 1],
                AnchorLabel::Background | AnchorLabel::Ignore => [1, 0],
            };
            flat.copy_from_slice(&scores);
            mask.fill(label.is_active() as i32);
        });

        // image
        im_shape[0] = image_size.w() as i32;
        im_shape[1] = image_size.h() as i32;
        im_scale[0] = *image_scale;

        // ground truth
        gt_boxes.fill(0.0);
        gt_classes.fill(0);
        gt_difficult.fill(0);
        num_gt_boxes[0] = gt.len() as i32;
        izip!(
            gt,
            gt_boxes.chunks_exact_mut(4),
            gt_classes.iter_mut(),
            gt_difficult.iter_mut()
        )
        .for_each(|(label, rect, class, difficult)| {
            rect.copy_from_slice(&label.rect.xyxy());
            *class = label.class as i32;
            *difficult = label.difficult as i32;
        });

        trace!(
            "packed {} ground truth boxes and {} sampled anchors",
            gt.len(),
            assignment.anchor_index().len()
        );
    }

    /// Allocate buffers and pack the example into them.
    pub fn pack_owned(&self, transformed: &Transformed) -> OutputBuffers {
        let mut buffers = OutputBuffers::new(&self.config);
        self.pack(transformed, buffers.slices());
        buffers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{ImageConfig, LocalizationInit},
        extractor::Decoded,
        params::ImageParams,
        sampler::FirstN,
        transformer::Transformer,
    };

    fn config() -> Arc<LocalizationConfig> {
        let config = LocalizationInit {
            class_names: vec!["person".into(), "dog".into()],
            max_gt_boxes: 4,
            ratios: vec![r64(1.0)],
            scales: vec![r64(1.0)],
            rois_per_image: 6,
            ..Default::default()
        }
        .build(ImageConfig::with_size(64, 64))
        .unwrap();
        Arc::new(config)
    }

    fn transformed(config: &Arc<LocalizationConfig>, boxes: Vec<GroundTruth>) -> Transformed {
        let decoded = Decoded {
            size: Size::from_wh([64, 64]),
            boxes,
        };
        let params = ImageParams::whole(decoded.size, 1.0);
        Transformer::new(config.clone())
            .transform_with_source(&params, &decoded, &mut FirstN)
            .unwrap()
    }

    #[test]
    fn pack_example() {
        let config = config();
        let transformed = transformed(
            &config,
            vec![Label {
                rect: XYXY::from_xyxy([16.0, 0.0, 31.0, 15.0]),
                class: 1,
                difficult: true,
            }],
        );
        let packer = Packer::new(config.clone());
        let buffers = packer.pack_owned(&transformed);

        assert_eq!(transformed.assignment.anchor_index(), &[1, 0, 2, 3, 4, 5]);

        assert_eq!(&buffers.bbtargets[4..8], &[0.0; 4]);
        assert_eq!(&buffers.bbtargets_mask[4..8], &[1.0; 4]);
        assert!(buffers
            .bbtargets_mask
            .chunks_exact(4)
            .enumerate()
            .all(|(index, mask)| mask == [(index == 1) as i32 as f32; 4]));

        assert_eq!(&buffers.labels_flat[0..4], &[1, 0, 0, 1]);
        assert_eq!(&buffers.labels_mask[0..12], &[1; 12]);
        assert_eq!(&buffers.labels_mask[12..], &[0; 20]);
        assert_eq!(&buffers.labels_flat[12..14], &[1, 0]);

        assert_eq!(buffers.im_shape, vec![64, 64]);
        assert_eq!(buffers.im_scale, vec![1.0]);
        assert_eq!(buffers.num_gt_boxes, vec![1]);
        assert_eq!(&buffers.gt_boxes[0..4], &[16.0, 0.0, 31.0, 15.0]);
        assert_eq!(&buffers.gt_boxes[4..], &[0.0; 12]);
        assert_eq!(buffers.gt_classes, vec![1, 0, 0, 0]);
        assert_eq!(buffers.gt_difficult, vec![1, 0, 0, 0]);
    }

    #[test]
    fn pack_is_idempotent() {
        let config = config();
        let transformed = transformed(
            &config,
            vec![Label {
                rect: XYXY::from_xyxy([8.0, 8.0, 40.0, 30.0]),
                class: 0,
                difficult: false,
            }],
        );
        let packer = Packer::new(config.clone());

        let mut buffers = OutputBuffers::new(&config);
        buffers.labels_flat.fill(7);
        buffers.gt_boxes.fill(3.0);
        packer.pack(&transformed, buffers.slices());
        let first = buffers.clone();
        packer.pack(&transformed, buffers.slices());

        assert_eq!(first, buffers);
        assert_eq!(first, packer.pack_owned(&transformed));
    }

    #[test]
    fn pack_without_ground_truth() {
        let config = config();
        let transformed = transformed(&config, vec![]);
        let buffers = Packer::new(config.clone()).pack_owned(&transformed);

        assert_eq!(buffers.num_gt_boxes, vec![0]);
        assert!(buffers.bbtargets_mask.iter().all(|&value| value == 0.0));
        assert!(buffers.gt_boxes.iter().all(|&value| value == 0.0));
        assert_eq!(buffers.labels_mask.iter().filter(|&&value| value == 1).count(), 12);
    }

    #[test]
    #[should_panic]
    fn pack_rejects_wrong_buffer() {
        let config = config();
        let transformed = transformed(&config, vec![]);
        let mut buffers = OutputBuffers::new(&config);
        buffers.bbtargets.pop();
        Packer::new(config).pack(&transformed, buffers.slices());
    }
}

//! Per-example ground truth transform and anchor assignment.

use crate::{
    assign::{assign, Assignment},
    common::*,
    config::LocalizationConfig,
    extractor::Decoded,
    params::ImageParams,
    sampler::{FirstN, RandomSource, SampleSource},
};

/// The ground truth and anchor assignment of one example on the output image.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed {
    /// Surviving ground truth in output image pixels.
    pub gt_boxes: Vec<GroundTruth>,
    /// The extent of the output image.
    pub image_size: Size<usize>,
    pub image_scale: f32,
    pub assignment: Assignment,
}

/// Maps decoded ground truth through the image transform and assigns anchors.
#[derive(Debug, Clone)]
pub struct Transformer {
    config: Arc<LocalizationConfig>,
}

impl Transformer {
    pub fn new(config: Arc<LocalizationConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocalizationConfig {
        &self.config
    }

    /// Transform with a fresh entropy seeded sampler, or the deterministic
    /// sampler if the parameters ask for it.
    pub fn transform(&self, params: &ImageParams, decoded: &Decoded) -> Result<Transformed> {
        if params.debug_deterministic {
            self.transform_with_source(params, decoded, &mut FirstN)
        } else {
            self.transform_with_source(params, decoded, &mut RandomSource::from_entropy())
        }
    }

    pub fn transform_with_rng<R>(
        &self,
        params: &ImageParams,
        decoded: &Decoded,
        rng: &mut R,
    ) -> Result<Transformed>
    where
        R: Rng,
    {
        if params.debug_deterministic {
            self.transform_with_source(params, decoded, &mut FirstN)
        } else {
            self.transform_with_source(params, decoded, &mut RandomSource::new(rng))
        }
    }

    pub fn transform_with_source<S>(
        &self,
        params: &ImageParams,
        decoded: &Decoded,
        source: &mut S,
    ) -> Result<Transformed>
    where
        S: SampleSource + ?Sized,
    {
        ensure!(
            params.cropbox.fits_in(&decoded.size),
            "the crop {:?} does not fit in the {}x{} image",
            params.cropbox,
            decoded.size.w(),
            decoded.size.h()
        );
        ensure!(
            params.scale.is_finite() && params.scale > 0.0,
            "image scale must be positive, but get {}",
            params.scale
        );

        let gt_boxes = self.transform_boxes(params, &decoded.boxes);
        let image_size = params.output_size();
        let assignment = assign(&self.config, &gt_boxes, image_size, source);

        Ok(Transformed {
            gt_boxes,
            image_size,
            image_scale: params.scale,
            assignment,
        })
    }

    /// Apply crop, flip and scale to the boxes.
    ///
    /// Degenerate boxes are dropped and at most `max_gt_boxes` boxes are kept.
    pub fn transform_boxes(&self, params: &ImageParams, boxes: &[GroundTruth]) -> Vec<GroundTruth> {
        let transform = params.box_transform();
        let mut output: Vec<GroundTruth> = boxes
            .iter()
            .map(|label| &transform * label)
            .filter(|label| !label.is_degenerate())
            .collect();

        let max_gt_boxes = self.config.max_gt_boxes();
        if output.len() > max_gt_boxes {
            warn!(
                "{} ground truth boxes exceed the limit {}, the rest are discarded",
                output.len(),
                max_gt_boxes
            );
            output.truncate(max_gt_boxes);
        }

        output
    }
}

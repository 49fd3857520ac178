//! Anchor label assignment and sampling.

use crate::{
    common::*, config::LocalizationConfig, overlap::compute_overlaps, sampler::SampleSource,
    target::Target,
};

/// The training role of an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr)]
pub enum AnchorLabel {
    /// Not sampled. Excluded from the losses.
    Ignore,
    Background,
    Foreground,
}

impl AnchorLabel {
    /// The numeric label: -1 for ignored, 0 for background and 1 for foreground.
    pub fn value(&self) -> i32 {
        match self {
            Self::Ignore => -1,
            Self::Background => 0,
            Self::Foreground => 1,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Ignore)
    }
}

/// The outcome of labeling and sampling the anchor lattice for one example.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct Assignment {
    /// One label per anchor in lattice order.
    #[getset(get = "pub")]
    labels: Vec<AnchorLabel>,
    /// Sampled anchors: foreground in ascending order, then background in ascending order.
    #[getset(get = "pub")]
    anchor_index: Vec<usize>,
    #[getset(get_copy = "pub")]
    num_foreground: usize,
    /// Regression targets aligned with the foreground part of `anchor_index`.
    #[getset(get = "pub")]
    targets: Vec<Target>,
    /// The best matching ground truth of each foreground anchor.
    #[getset(get = "pub")]
    matched_gt: Vec<usize>,
}

impl Assignment {
    pub fn num_anchors(&self) -> usize {
        self.labels.len()
    }

    pub fn num_background(&self) -> usize {
        self.anchor_index.len() - self.num_foreground
    }

    pub fn foreground_index(&self) -> &[usize] {
        &self.anchor_index[..self.num_foreground]
    }

    pub fn background_index(&self) -> &[usize] {
        &self.anchor_index[self.num_foreground..]
    }
}

/// Label the anchors against the ground truth and sample a training subset.
///
/// Anchors outside `image_size` extended by the allowed border are ignored.
/// Among the rest, an anchor is background if its best IoU is below the
/// negative threshold. It is foreground if its best IoU reaches the positive
/// threshold, or if it attains the best IoU of some ground truth box. The
/// latter rule wins over the background rule, and every tied anchor is kept.
/// An anchor overlapping no ground truth box is never foreground, even when a
/// box overlaps no inside anchor at all.
/// Foreground anchors are then subsampled to the foreground cap and background
/// anchors fill the remaining sample slots.
pub fn assign<S>(
    config: &LocalizationConfig,
    gt: &[GroundTruth],
    image_size: Size<usize>,
    sampler: &mut S,
) -> Assignment
where
    S: SampleSource + ?Sized,
{
    let lattice = config.anchors();
    let anchors = lattice.anchors();
    let mut labels = vec![AnchorLabel::Ignore; anchors.len()];
    let inside = lattice.inside_indices(image_size, config.allowed_border());
    let mut best_gt = vec![0; anchors.len()];

    if gt.is_empty() {
        inside
            .iter()
            .for_each(|&index| labels[index] = AnchorLabel::Background);
    } else {
        let inside_anchors: Vec<_> = inside.iter().map(|&index| anchors[index]).collect();
        let gt_rects: Vec<_> = gt.iter().map(|label| label.rect).collect();
        let overlaps = compute_overlaps(&inside_anchors, &gt_rects);

        // best IoU of each ground truth box over inside anchors
        let gt_max: Vec<f32> = overlaps
            .columns()
            .into_iter()
            .map(|col| col.iter().cloned().fold(f32::NEG_INFINITY, f32::max))
            .collect();

        izip!(&inside, overlaps.rows()).for_each(|(&index, row)| {
            let (argmax, max) = row
                .iter()
                .cloned()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |(best_col, best), (col, iou)| {
                    if iou > best {
                        (col, iou)
                    } else {
                        (best_col, best)
                    }
                });
            best_gt[index] = argmax;

            if max < config.negative_overlap() {
                labels[index] = AnchorLabel::Background;
            }

            // anchors overlapping no ground truth are never foreground
            if max <= 0.0 {
                return;
            }
            if izip!(row.iter(), &gt_max).any(|(&iou, &gt_max)| iou > 0.0 && iou == gt_max) {
                labels[index] = AnchorLabel::Foreground;
            }
            if max >= config.positive_overlap() {
                labels[index] = AnchorLabel::Foreground;
            }
        });
    }

    // subsample foreground
    let fg_pool: Vec<usize> = inside
        .iter()
        .cloned()
        .filter(|&index| labels[index] == AnchorLabel::Foreground)
        .collect();
    let foreground = subsample(
        &fg_pool,
        config.foreground_count(),
        &mut labels,
        sampler,
    );

    // subsample background
    let num_background = config.rois_per_image() - foreground.len();
    let bg_pool: Vec<usize> = inside
        .iter()
        .cloned()
        .filter(|&index| labels[index] == AnchorLabel::Background)
        .collect();
    let background = subsample(&bg_pool, num_background, &mut labels, sampler);

    let matched_gt: Vec<usize> = foreground.iter().map(|&index| best_gt[index]).collect();
    let targets: Vec<Target> = izip!(&foreground, &matched_gt)
        .map(|(&index, &gt_index)| Target::encode(&gt[gt_index].rect, &anchors[index]))
        .collect();

    debug!(
        "assigned {} foreground and {} background anchors out of {} inside anchors",
        foreground.len(),
        background.len(),
        inside.len()
    );

    let num_foreground = foreground.len();
    let anchor_index: Vec<usize> = foreground.into_iter().chain(background).collect();

    Assignment {
        labels,
        anchor_index,
        num_foreground,
        targets,
        matched_gt,
    }
}

/// Keep at most `count` entries of the pool and mark the dropped ones ignored.
fn subsample<S>(
    pool: &[usize],
    count: usize,
    labels: &mut [AnchorLabel],
    sampler: &mut S,
) -> Vec<usize>
where
    S: SampleSource + ?Sized,
{
    if pool.len() <= count {
        return pool.to_vec();
    }

    let kept = sampler.uniform_sample(pool, count);
    pool.iter()
        .filter(|&&index| kept.binary_search(&index).is_err())
        .for_each(|&index| labels[index] = AnchorLabel::Ignore);
    trace!("subsampled {} out of {} anchors", kept.len(), pool.len());
    kept
}

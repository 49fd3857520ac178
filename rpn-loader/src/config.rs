//! Localization configuration format.

use crate::{anchor::AnchorLattice, common::*, shape::OutputShape};

/// The configuration file holding the image settings and the localization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub image: ImageConfig,
    pub localization: LocalizationInit,
}

impl ProviderConfig {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read config file '{}'", path.display()))?;
        let config = json5::from_str(&text)
            .with_context(|| format!("unable to parse config file '{}'", path.display()))?;
        Ok(config)
    }

    pub fn build(self) -> Result<LocalizationConfig> {
        let Self {
            image,
            localization,
        } = self;
        localization.build(image)
    }
}

/// Options of the paired image pipeline that the box transform must follow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Output image width in pixels.
    pub width: usize,
    /// Output image height in pixels.
    pub height: usize,
    /// If set, each example is mirrored horizontally with probability one half.
    #[serde(default)]
    pub flip_enable: bool,
    /// If set, the image is resized without distorting its aspect ratio.
    #[serde(default)]
    pub fixed_aspect_ratio: bool,
    /// Fixed resize factor. It only takes effect with `fixed_aspect_ratio`.
    pub fixed_scaling_factor: Option<R64>,
    /// The range of the crop size relative to the largest crop having the
    /// output aspect ratio. Cropping is enabled when it is set.
    pub scale: Option<(R64, R64)>,
    /// The range of rotation angles in degrees.
    pub angle: Option<(R64, R64)>,
    /// Disable every random choice: centered crops, minimal crop scale, no
    /// flip and no random anchor subsampling.
    #[serde(default)]
    pub debug_deterministic: bool,
}

impl ImageConfig {
    pub fn with_size(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            flip_enable: false,
            fixed_aspect_ratio: false,
            fixed_scaling_factor: None,
            scale: None,
            angle: None,
            debug_deterministic: false,
        }
    }

    pub fn output_size(&self) -> Size<usize> {
        Size::from_wh([self.width, self.height])
    }

    pub fn check(&self) -> Result<()> {
        ensure!(
            self.width > 0 && self.height > 0,
            "image width and height must be positive"
        );
        if let Some(factor) = self.fixed_scaling_factor {
            ensure!(factor > 0.0, "fixed_scaling_factor must be positive");
        }
        if let Some((lo, up)) = self.scale {
            ensure!(lo > 0.0, "scale min must be positive");
            ensure!(up <= 1.0, "scale max must not exceed 1");
            ensure!(lo <= up, "scale min must not exceed scale max");
        }
        if let Some((lo, up)) = self.angle {
            ensure!(lo <= up, "angle min must not exceed angle max");
        }
        Ok(())
    }
}

/// The localization options before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizationInit {
    /// Ordered class names. A class id is the position in this list.
    pub class_names: Vec<String>,
    /// The number of ground truth slots in the output buffers.
    #[serde(default = "default_max_gt_boxes")]
    pub max_gt_boxes: usize,
    #[serde(default = "default_base_size")]
    pub base_size: R64,
    #[serde(default = "default_ratios")]
    pub ratios: Vec<R64>,
    #[serde(default = "default_scales")]
    pub scales: Vec<R64>,
    /// Pixel distance between adjacent feature map cells.
    #[serde(default = "default_feature_stride")]
    pub feature_stride: usize,
    /// Anchors overlapping some ground truth by at least this IoU are foreground.
    #[serde(default = "default_positive_overlap")]
    pub positive_overlap: R64,
    /// Anchors overlapping every ground truth below this IoU are background.
    #[serde(default = "default_negative_overlap")]
    pub negative_overlap: R64,
    /// Maximum share of foreground anchors among the sampled anchors.
    #[serde(default = "default_foreground_fraction")]
    pub foreground_fraction: R64,
    /// The number of sampled anchors per image.
    #[serde(default = "default_rois_per_image")]
    pub rois_per_image: usize,
    /// Anchors may cross the image boundary by this many pixels.
    #[serde(default = "default_allowed_border")]
    pub allowed_border: R64,
}

impl Default for LocalizationInit {
    fn default() -> Self {
        Self {
            class_names: vec![],
            max_gt_boxes: default_max_gt_boxes(),
            base_size: default_base_size(),
            ratios: default_ratios(),
            scales: default_scales(),
            feature_stride: default_feature_stride(),
            positive_overlap: default_positive_overlap(),
            negative_overlap: default_negative_overlap(),
            foreground_fraction: default_foreground_fraction(),
            rois_per_image: default_rois_per_image(),
            allowed_border: default_allowed_border(),
        }
    }
}

impl LocalizationInit {
    pub fn build(self, image: ImageConfig) -> Result<LocalizationConfig> {
        let Self {
            class_names,
            max_gt_boxes,
            base_size,
            ratios,
            scales,
            feature_stride,
            positive_overlap,
            negative_overlap,
            foreground_fraction,
            rois_per_image,
            allowed_border,
        } = self;

        image.check()?;
        if let Some((lo, up)) = image.angle {
            ensure!(
                lo == 0.0 && up == 0.0,
                "rotation is not supported by localization, but angle range ({}, {}) is given",
                lo,
                up
            );
        }

        ensure!(!class_names.is_empty(), "class_names must not be empty");
        let class_names: IndexSet<String> = {
            let num_names = class_names.len();
            let set: IndexSet<_> = class_names.into_iter().collect();
            ensure!(set.len() == num_names, "class_names must not contain duplicates");
            set
        };

        ensure!(max_gt_boxes > 0, "max_gt_boxes must be positive");
        ensure!(base_size > 0.0, "base_size must be positive");
        ensure!(!ratios.is_empty(), "ratios must not be empty");
        ensure!(
            ratios.iter().all(|&ratio| ratio > 0.0),
            "ratios must be positive"
        );
        ensure!(!scales.is_empty(), "scales must not be empty");
        ensure!(
            scales.iter().all(|&scale| scale > 0.0),
            "scales must be positive"
        );
        ensure!(feature_stride > 0, "feature_stride must be positive");
        ensure!(
            (0.0..=1.0).contains(&positive_overlap.raw()),
            "positive_overlap must be within [0, 1]"
        );
        ensure!(
            (0.0..=1.0).contains(&negative_overlap.raw()),
            "negative_overlap must be within [0, 1]"
        );
        ensure!(
            negative_overlap <= positive_overlap,
            "negative_overlap must not exceed positive_overlap"
        );
        ensure!(
            (0.0..=1.0).contains(&foreground_fraction.raw()),
            "foreground_fraction must be within [0, 1]"
        );
        ensure!(rois_per_image > 0, "rois_per_image must be positive");
        ensure!(allowed_border >= 0.0, "allowed_border must be non-negative");

        let feature_size = Size::from_wh([
            image.width / feature_stride,
            image.height / feature_stride,
        ]);
        ensure!(
            !feature_size.is_empty(),
            "the output image {}x{} is smaller than the feature stride {}",
            image.width,
            image.height,
            feature_stride
        );

        let base_size = base_size.raw() as f32;
        let ratios: Vec<f32> = ratios.into_iter().map(|ratio| ratio.raw() as f32).collect();
        let scales: Vec<f32> = scales.into_iter().map(|scale| scale.raw() as f32).collect();
        let anchors = AnchorLattice::generate(
            base_size,
            &ratios,
            &scales,
            feature_size,
            feature_stride,
        )?;
        let foreground_count = (foreground_fraction.raw() * rois_per_image as f64).floor() as usize;

        info!(
            "localization: {} classes, {}x{} feature grid, {} anchors, {} rois per image",
            class_names.len(),
            feature_size.w(),
            feature_size.h(),
            anchors.len(),
            rois_per_image
        );

        Ok(LocalizationConfig {
            class_names,
            max_gt_boxes,
            feature_size,
            positive_overlap: positive_overlap.raw() as f32,
            negative_overlap: negative_overlap.raw() as f32,
            foreground_count,
            rois_per_image,
            allowed_border: allowed_border.raw() as f32,
            image,
            anchors: Arc::new(anchors),
        })
    }
}

/// Validated localization configuration.
///
/// It is built once per loading session and shared read-only by every example.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct LocalizationConfig {
    #[getset(get = "pub")]
    class_names: IndexSet<String>,
    #[getset(get_copy = "pub")]
    max_gt_boxes: usize,
    #[getset(get_copy = "pub")]
    feature_size: Size<usize>,
    #[getset(get_copy = "pub")]
    positive_overlap: f32,
    #[getset(get_copy = "pub")]
    negative_overlap: f32,
    /// The cap on sampled foreground anchors.
    #[getset(get_copy = "pub")]
    foreground_count: usize,
    #[getset(get_copy = "pub")]
    rois_per_image: usize,
    #[getset(get_copy = "pub")]
    allowed_border: f32,
    #[getset(get = "pub")]
    image: ImageConfig,
    #[getset(get = "pub")]
    anchors: Arc<AnchorLattice>,
}

impl LocalizationConfig {
    /// Look up the class id of a class name.
    pub fn class_index(&self, name: &str) -> Option<usize> {
        self.class_names.get_index_of(name)
    }

    pub fn num_anchors(&self) -> usize {
        self.anchors.len()
    }

    /// The buffers filled per example, in packing order.
    pub fn output_shapes(&self) -> Vec<OutputShape> {
        OutputShape::localization(self.num_anchors(), self.max_gt_boxes)
    }
}

fn default_max_gt_boxes() -> usize {
    64
}

fn default_base_size() -> R64 {
    r64(16.0)
}

fn default_ratios() -> Vec<R64> {
    vec![r64(0.5), r64(1.0), r64(2.0)]
}

fn default_scales() -> Vec<R64> {
    vec![r64(8.0), r64(16.0), r64(32.0)]
}

fn default_feature_stride() -> usize {
    16
}

fn default_positive_overlap() -> R64 {
    r64(0.7)
}

fn default_negative_overlap() -> R64 {
    r64(0.3)
}

fn default_foreground_fraction() -> R64 {
    r64(0.5)
}

fn default_rois_per_image() -> usize {
    256
}

fn default_allowed_border() -> R64 {
    r64(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASS_NAMES: &[&str] = &[
        "person",
        "dog",
        "lion",
        "tiger",
        "eel",
        "puma",
        "rat",
        "tick",
        "flea",
        "bicycle",
        "hovercraft",
    ];

    fn class_names() -> Vec<String> {
        CLASS_NAMES.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn config_defaults() -> Result<()> {
        let config = LocalizationInit {
            class_names: class_names(),
            max_gt_boxes: 100,
            ..Default::default()
        }
        .build(ImageConfig::with_size(400, 300))?;

        assert_eq!(config.feature_size(), Size::from_wh([25, 18]));
        assert_eq!(config.num_anchors(), 9 * 25 * 18);
        assert_eq!(config.foreground_count(), 128);
        assert_eq!(config.class_index("dog"), Some(1));
        assert_eq!(config.class_index("unicorn"), None);
        Ok(())
    }

    #[test]
    fn config_rotate() {
        let image = ImageConfig {
            angle: Some((r64(0.0), r64(90.0))),
            ..ImageConfig::with_size(400, 300)
        };
        let result = LocalizationInit {
            class_names: class_names(),
            ..Default::default()
        }
        .build(image);
        assert!(result.is_err());
    }

    #[test]
    fn config_reject_invalid() {
        let build = |init: LocalizationInit| init.build(ImageConfig::with_size(400, 300));

        assert!(build(LocalizationInit::default()).is_err());
        assert!(build(LocalizationInit {
            class_names: vec!["dog".into(), "dog".into()],
            ..Default::default()
        })
        .is_err());
        assert!(build(LocalizationInit {
            class_names: class_names(),
            negative_overlap: r64(0.8),
            ..Default::default()
        })
        .is_err());
        assert!(build(LocalizationInit {
            class_names: class_names(),
            ratios: vec![],
            ..Default::default()
        })
        .is_err());
        assert!(build(LocalizationInit {
            class_names: class_names(),
            feature_stride: 1000,
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn config_reject_empty_anchor() {
        let result = LocalizationInit {
            class_names: class_names(),
            base_size: r64(1.0),
            ratios: vec![r64(4.0)],
            scales: vec![r64(1.0)],
            ..Default::default()
        }
        .build(ImageConfig::with_size(400, 300));
        assert!(result.is_err());
    }

    #[test]
    fn config_from_json5() -> Result<()> {
        let text = r#"{
            image: { width: 1000, height: 1000, fixed_aspect_ratio: true, fixed_scaling_factor: 1.6 },
            localization: { class_names: ["bicycle", "person"], max_gt_boxes: 64 },
        }"#;
        let config: ProviderConfig = json5::from_str(text)?;
        let config = config.build()?;
        assert_eq!(config.num_anchors(), 34596);
        assert_eq!(config.max_gt_boxes(), 64);
        assert_eq!(config.rois_per_image(), 256);
        Ok(())
    }
}

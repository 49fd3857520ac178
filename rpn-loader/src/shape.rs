//! Shapes of the packed output buffers.

use crate::common::*;

/// The element type of an output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ElementKind {
    F32,
    I32,
}

impl ElementKind {
    pub fn size(&self) -> usize {
        match self {
            Self::F32 => std::mem::size_of::<f32>(),
            Self::I32 => std::mem::size_of::<i32>(),
        }
    }
}

/// A named output buffer with its dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputShape {
    pub name: String,
    pub dims: Vec<usize>,
    pub kind: ElementKind,
}

impl OutputShape {
    pub fn new(name: &str, dims: &[usize], kind: ElementKind) -> Self {
        Self {
            name: name.to_string(),
            dims: dims.to_vec(),
            kind,
        }
    }

    /// The output buffers of the localization modality in packing order.
    pub fn localization(num_anchors: usize, max_gt_boxes: usize) -> Vec<Self> {
        use ElementKind::*;

        vec![
            Self::new("bbtargets", &[num_anchors, 4], F32),
            Self::new("bbtargets_mask", &[num_anchors, 4], F32),
            Self::new("labels_flat", &[num_anchors, 2], I32),
            Self::new("labels_mask", &[num_anchors, 2], I32),
            Self::new("im_shape", &[2], I32),
            Self::new("gt_boxes", &[max_gt_boxes, 4], F32),
            Self::new("num_gt_boxes", &[1], I32),
            Self::new("gt_classes", &[max_gt_boxes], I32),
            Self::new("im_scale", &[1], F32),
            Self::new("gt_difficult", &[max_gt_boxes], I32),
        ]
    }

    pub fn element_count(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn byte_size(&self) -> usize {
        self.element_count() * self.kind.size()
    }
}

impl fmt::Display for OutputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.name,
            self.dims.iter().map(|dim| dim.to_string()).join(", "),
            self.kind
        )
    }
}

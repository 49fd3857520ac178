//! Per-example image parameters shared with the paired image pipeline.

use crate::{common::*, config::ImageConfig};

/// The crop, resize and flip applied to one example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageParams {
    /// Crop rectangle in source image pixels.
    pub cropbox: CropBox<usize>,
    /// Resize factor applied after cropping.
    pub scale: f32,
    pub flip: bool,
    /// Disables random anchor subsampling.
    pub debug_deterministic: bool,
}

impl ImageParams {
    /// Parameters keeping the whole source image at the given scale.
    pub fn whole(source_size: Size<usize>, scale: f32) -> Self {
        Self {
            cropbox: CropBox::whole(source_size),
            scale,
            flip: false,
            debug_deterministic: false,
        }
    }

    /// The extent of the resized image.
    pub fn output_size(&self) -> Size<usize> {
        let w = (self.cropbox.w as f32 * self.scale).round() as usize;
        let h = (self.cropbox.h as f32 * self.scale).round() as usize;
        Size::from_wh([w, h])
    }

    /// The transform moving source pixel boxes onto the output image.
    pub fn box_transform(&self) -> Transform<f32> {
        Transform::from_crop(self.cropbox.cast(), self.flip, self.scale)
    }
}

/// Draws [ImageParams] for source images according to an [ImageConfig].
#[derive(Debug, Clone)]
pub struct ParamFactory {
    config: ImageConfig,
}

impl ParamFactory {
    pub fn new(config: ImageConfig) -> Result<Self> {
        config.check()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    pub fn make_params<R>(&self, source_size: Size<usize>, rng: &mut R) -> Result<ImageParams>
    where
        R: Rng,
    {
        let ImageConfig {
            width,
            height,
            flip_enable,
            fixed_aspect_ratio,
            fixed_scaling_factor,
            scale: scale_range,
            debug_deterministic,
            ..
        } = self.config;
        ensure!(
            !source_size.is_empty(),
            "source image size must be positive, but get {}x{}",
            source_size.w(),
            source_size.h()
        );

        let src_w = source_size.w() as f64;
        let src_h = source_size.h() as f64;
        let out_w = width as f64;
        let out_h = height as f64;

        let (cropbox, scale) = if fixed_aspect_ratio {
            let scale = match fixed_scaling_factor {
                Some(factor) => factor.raw(),
                None => (out_w / src_w).min(out_h / src_h),
            };
            (CropBox::whole(source_size), scale)
        } else if let Some((lo, up)) = scale_range {
            let fraction = if debug_deterministic || lo == up {
                lo.raw()
            } else {
                rng.gen_range(lo.raw()..=up.raw())
            };

            // the largest rectangle having the output aspect ratio
            let out_aspect = out_w / out_h;
            let (max_w, max_h) = if src_w / src_h > out_aspect {
                (src_h * out_aspect, src_h)
            } else {
                (src_w, src_w / out_aspect)
            };
            let crop_w = ((max_w * fraction).floor() as usize).clamp(1, source_size.w());
            let crop_h = ((max_h * fraction).floor() as usize).clamp(1, source_size.h());

            let free_x = source_size.w() - crop_w;
            let free_y = source_size.h() - crop_h;
            let (x, y) = if debug_deterministic {
                (free_x / 2, free_y / 2)
            } else {
                (rng.gen_range(0..=free_x), rng.gen_range(0..=free_y))
            };

            let cropbox = CropBox {
                x,
                y,
                w: crop_w,
                h: crop_h,
            };
            (cropbox, out_w / crop_w as f64)
        } else {
            (CropBox::whole(source_size), out_w / src_w)
        };

        let flip = flip_enable && !debug_deterministic && rng.gen_bool(0.5);

        let params = ImageParams {
            cropbox,
            scale: scale as f32,
            flip,
            debug_deterministic,
        };
        trace!("image params {:?}", params);
        Ok(params)
    }
}

//! Random crop and random resized crop.

use crate::{
    common::*,
    fill::{Fill, Interpolation, PadBy, PaddingMode},
    kernel,
    transform::{item_wise_transform, plane_size, Candidates, ItemWise},
};

#[derive(Debug, Clone, PartialEq)]
pub struct RandomCropInit {
    /// Output size as (height, width).
    pub size: (i64, i64),
    /// Padding applied before cropping.
    pub padding: Option<PadBy>,
    /// Grow the canvas further when it is still smaller than `size`.
    pub pad_if_needed: bool,
    pub fill: Fill,
    pub padding_mode: PaddingMode,
}

impl RandomCropInit {
    pub fn new(size: (i64, i64)) -> Self {
        Self {
            size,
            padding: None,
            pad_if_needed: false,
            fill: Fill::Zero,
            padding_mode: PaddingMode::Constant,
        }
    }

    pub fn build(self) -> Result<RandomCrop> {
        let Self {
            size,
            padding,
            pad_if_needed,
            fill,
            padding_mode,
        } = self;
        ensure_config!(
            size.0 > 0 && size.1 > 0,
            "crop size must be positive, but get {:?}",
            size
        );
        fill.validate()?;

        Ok(RandomCrop {
            size,
            padding,
            pad_if_needed,
            fill,
            padding_mode,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RandomCrop {
    size: (i64, i64),
    padding: Option<PadBy>,
    pad_if_needed: bool,
    fill: Fill,
    padding_mode: PaddingMode,
}

#[derive(Debug)]
pub struct CropParams {
    pub padding: PadBy,
    pub top: i64,
    pub left: i64,
}

impl ItemWise for RandomCrop {
    type Params = CropParams;

    fn kinds(&self) -> KindSet {
        if self.padding.is_some() || self.pad_if_needed {
            // decoded rasters cannot be padded; keep them out of the pass
            KindSet::SPATIAL.without(ItemKind::DynImage)
        } else {
            KindSet::SPATIAL
        }
    }

    fn resolve(
        &self,
        candidates: &Candidates<'_>,
        rng: &mut StdRng,
    ) -> Result<Option<CropParams>> {
        let reference = candidates.spatial_reference()?;
        let (crop_h, crop_w) = self.size;

        let mut padding = self.padding.unwrap_or(PadBy {
            left: 0,
            top: 0,
            right: 0,
            bottom: 0,
        });
        let padded_h = reference.h + padding.vertical();
        let padded_w = reference.w + padding.horizontal();

        if self.pad_if_needed {
            if padded_h < crop_h {
                let deficit = crop_h - padded_h;
                padding.top += deficit / 2;
                padding.bottom += deficit - deficit / 2;
            }
            if padded_w < crop_w {
                let deficit = crop_w - padded_w;
                padding.left += deficit / 2;
                padding.right += deficit - deficit / 2;
            }
        }

        let padded_h = reference.h + padding.vertical();
        let padded_w = reference.w + padding.horizontal();
        ensure_config!(
            padded_h >= crop_h && padded_w >= crop_w,
            "crop size {:?} exceeds the padded input {}x{}",
            self.size,
            padded_h,
            padded_w
        );

        let top = rng.gen_range(0..=padded_h - crop_h);
        let left = rng.gen_range(0..=padded_w - crop_w);
        Ok(Some(CropParams { padding, top, left }))
    }

    fn apply_item(&self, item: Item, params: &CropParams) -> Result<Item> {
        let (crop_h, crop_w) = self.size;
        let CropParams { padding, top, left } = *params;

        Ok(match item {
            Item::Image(image) => Item::Image(image.map(|data| {
                let padded = kernel::pad(&data, padding, self.padding_mode, &self.fill);
                kernel::crop(&padded, top, left, crop_h, crop_w)
            })),
            Item::Video(video) => Item::Video(video.map(|data| {
                let padded = kernel::pad(&data, padding, self.padding_mode, &self.fill);
                kernel::crop(&padded, top, left, crop_h, crop_w)
            })),
            Item::Tensor(data) => {
                let padded = kernel::pad(&data, padding, self.padding_mode, &self.fill);
                Item::Tensor(kernel::crop(&padded, top, left, crop_h, crop_w))
            }
            Item::Mask(mask) => Item::Mask(mask.map(|data| {
                let padded = kernel::pad(&data, padding, PaddingMode::Constant, &Fill::Zero);
                kernel::crop(&padded, top, left, crop_h, crop_w)
            })),
            Item::BoundingBoxes(boxes) => {
                let padded = kernel::pad_boxes(&boxes, padding);
                Item::BoundingBoxes(kernel::crop_boxes(&padded, top, left, crop_h, crop_w))
            }
            Item::DynImage(image) => {
                // padding is not supported on decoded rasters; crop within bounds
                Item::DynImage(kernel::crop_dyn_image(&image, top, left, crop_h, crop_w))
            }
            other => other,
        })
    }
}

item_wise_transform!(RandomCrop);

#[derive(Debug, Clone, PartialEq)]
pub struct RandomResizedCropInit {
    pub size: (i64, i64),
    /// Area fraction bounds of the source crop.
    pub scale: (R64, R64),
    /// Aspect ratio bounds of the source crop.
    pub ratio: (R64, R64),
    pub interpolation: Interpolation,
}

impl RandomResizedCropInit {
    pub fn new(size: (i64, i64)) -> Self {
        Self {
            size,
            scale: (r64(0.08), r64(1.0)),
            ratio: (r64(3.0 / 4.0), r64(4.0 / 3.0)),
            interpolation: Interpolation::Bilinear,
        }
    }

    pub fn build(self) -> Result<RandomResizedCrop> {
        let Self {
            size,
            scale,
            ratio,
            interpolation,
        } = self;
        ensure_config!(size.0 > 0 && size.1 > 0, "crop size must be positive");
        ensure_config!(
            scale.0 > 0.0 && scale.0 <= scale.1,
            "scale bounds must be positive and ordered"
        );
        ensure_config!(
            ratio.0 > 0.0 && ratio.0 <= ratio.1,
            "ratio bounds must be positive and ordered"
        );

        Ok(RandomResizedCrop {
            size,
            scale: (scale.0.raw(), scale.1.raw()),
            ratio: (ratio.0.raw(), ratio.1.raw()),
            interpolation,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RandomResizedCrop {
    size: (i64, i64),
    scale: (f64, f64),
    ratio: (f64, f64),
    interpolation: Interpolation,
}

#[derive(Debug)]
pub struct ResizedCropParams {
    pub top: i64,
    pub left: i64,
    pub height: i64,
    pub width: i64,
}

impl RandomResizedCrop {
    fn draw_window(
        &self,
        reference: PixelSize<i64>,
        rng: &mut StdRng,
    ) -> ResizedCropParams {
        let area = (reference.h * reference.w) as f64;
        let log_ratio = (self.ratio.0.ln(), self.ratio.1.ln());

        for _ in 0..10 {
            let target_area = area * rng.gen_range(self.scale.0..=self.scale.1);
            let aspect = rng.gen_range(log_ratio.0..=log_ratio.1).exp();

            let width = (target_area * aspect).sqrt().round() as i64;
            let height = (target_area / aspect).sqrt().round() as i64;
            if width > 0 && width <= reference.w && height > 0 && height <= reference.h {
                let top = rng.gen_range(0..=reference.h - height);
                let left = rng.gen_range(0..=reference.w - width);
                return ResizedCropParams {
                    top,
                    left,
                    height,
                    width,
                };
            }
        }

        // center fallback clamped to the most extreme representable ratio
        let in_ratio = reference.w as f64 / reference.h as f64;
        let (width, height) = if in_ratio < self.ratio.0 {
            let width = reference.w;
            (width, (width as f64 / self.ratio.0).round() as i64)
        } else if in_ratio > self.ratio.1 {
            let height = reference.h;
            ((height as f64 * self.ratio.1).round() as i64, height)
        } else {
            (reference.w, reference.h)
        };
        ResizedCropParams {
            top: (reference.h - height) / 2,
            left: (reference.w - width) / 2,
            height,
            width,
        }
    }
}

impl ItemWise for RandomResizedCrop {
    type Params = ResizedCropParams;

    fn resolve(
        &self,
        candidates: &Candidates<'_>,
        rng: &mut StdRng,
    ) -> Result<Option<ResizedCropParams>> {
        let reference = candidates.spatial_reference()?;
        Ok(Some(self.draw_window(reference, rng)))
    }

    fn apply_item(&self, item: Item, params: &ResizedCropParams) -> Result<Item> {
        let ResizedCropParams {
            top,
            left,
            height,
            width,
        } = *params;
        let out_size = PixelSize {
            h: self.size.0,
            w: self.size.1,
        };

        Ok(match item {
            Item::Image(image) => Item::Image(image.map(|data| {
                let cropped = kernel::crop(&data, top, left, height, width);
                kernel::resize(&cropped, out_size, self.interpolation)
            })),
            Item::Video(video) => Item::Video(video.map(|data| {
                let cropped = kernel::crop(&data, top, left, height, width);
                kernel::resize(&cropped, out_size, self.interpolation)
            })),
            Item::Tensor(data) => {
                let cropped = kernel::crop(&data, top, left, height, width);
                Item::Tensor(kernel::resize(&cropped, out_size, self.interpolation))
            }
            Item::Mask(mask) => Item::Mask(mask.map(|data| {
                let cropped = kernel::crop(&data, top, left, height, width);
                kernel::resize(&cropped, out_size, Interpolation::Nearest)
            })),
            Item::BoundingBoxes(boxes) => {
                let cropped = kernel::crop_boxes(&boxes, top, left, height, width);
                Item::BoundingBoxes(kernel::resize_boxes(&cropped, out_size))
            }
            Item::DynImage(image) => {
                let cropped = kernel::crop_dyn_image(&image, top, left, height, width);
                Item::DynImage(kernel::resize_dyn_image(
                    &cropped,
                    out_size,
                    self.interpolation,
                ))
            }
            other => other,
        })
    }
}

item_wise_transform!(RandomResizedCrop);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_window_stays_in_bounds() {
        let transform = RandomResizedCropInit::new((4, 4)).build().unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let window = transform.draw_window(PixelSize { h: 12, w: 9 }, &mut rng);
            assert!(window.top >= 0 && window.left >= 0);
            assert!(window.top + window.height <= 12);
            assert!(window.left + window.width <= 9);
        }
    }

    #[test]
    fn oversized_crop_without_padding_is_rejected() {
        let transform = RandomCropInit::new((8, 8)).build().unwrap();
        let image = Image::new(Tensor::zeros(&[3, 4, 4], FLOAT_CPU)).unwrap();
        let item = Item::Image(image);
        let candidates = Candidates::new(vec![&item]);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            transform.resolve(&candidates, &mut rng),
            Err(TransformError::InvalidConfiguration(_))
        ));
    }
}

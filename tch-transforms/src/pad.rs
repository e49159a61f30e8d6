//! Deterministic padding and random zoom-out.

use crate::{
    common::*,
    fill::{Fill, PadBy, PaddingMode},
    kernel,
    transform::{item_wise_transform, Candidates, ItemWise},
};

/// Pad every spatial item by a fixed amount.
#[derive(Debug, Clone)]
pub struct Pad {
    padding: PadBy,
    fill: Fill,
    mode: PaddingMode,
}

impl Pad {
    pub fn new(padding: PadBy, fill: Fill, mode: PaddingMode) -> Result<Self> {
        fill.validate()?;
        Ok(Self {
            padding,
            fill,
            mode,
        })
    }

    /// Normalize the 1/2/4-element padding shapes accepted by callers.
    pub fn from_arity(padding: &[i64], fill: Fill, mode: PaddingMode) -> Result<Self> {
        Self::new(PadBy::from_arity(padding)?, fill, mode)
    }
}

fn pad_item(item: Item, padding: PadBy, mode: PaddingMode, fill: &Fill) -> Item {
    match item {
        Item::Image(image) => Item::Image(image.map(|data| kernel::pad(&data, padding, mode, fill))),
        Item::Video(video) => Item::Video(video.map(|data| kernel::pad(&data, padding, mode, fill))),
        Item::Tensor(data) => Item::Tensor(kernel::pad(&data, padding, mode, fill)),
        Item::Mask(mask) => Item::Mask(mask.map(|data| {
            kernel::pad(&data, padding, PaddingMode::Constant, &Fill::Zero)
        })),
        Item::BoundingBoxes(boxes) => Item::BoundingBoxes(kernel::pad_boxes(&boxes, padding)),
        other => other,
    }
}

impl ItemWise for Pad {
    type Params = ();

    fn kinds(&self) -> KindSet {
        KindSet::SPATIAL.without(ItemKind::DynImage)
    }

    fn resolve(&self, _candidates: &Candidates<'_>, _rng: &mut StdRng) -> Result<Option<()>> {
        Ok(Some(()))
    }

    fn apply_item(&self, item: Item, _params: &()) -> Result<Item> {
        Ok(pad_item(item, self.padding, self.mode, &self.fill))
    }
}

/// Zoom out by placing the input on a randomly positioned larger canvas.
#[derive(Debug, Clone)]
pub struct RandomZoomOut {
    fill: Fill,
    side_range: (f64, f64),
    p: f64,
}

impl RandomZoomOut {
    pub fn new(fill: Fill, side_range: (R64, R64), p: f64) -> Result<Self> {
        fill.validate()?;
        ensure_config!(
            side_range.0 >= 1.0 && side_range.0 <= side_range.1,
            "invalid canvas side range {:?}",
            side_range
        );
        ensure_config!(
            (0.0..=1.0).contains(&p),
            "probability must be in range 0.0..=1.0, but get {}",
            p
        );
        Ok(Self {
            fill,
            side_range: (side_range.0.raw(), side_range.1.raw()),
            p,
        })
    }
}

#[derive(Debug)]
pub struct ZoomOutParams {
    pub padding: PadBy,
}

impl ItemWise for RandomZoomOut {
    type Params = ZoomOutParams;

    fn kinds(&self) -> KindSet {
        KindSet::SPATIAL.without(ItemKind::DynImage)
    }

    fn resolve(
        &self,
        candidates: &Candidates<'_>,
        rng: &mut StdRng,
    ) -> Result<Option<ZoomOutParams>> {
        if !rng.gen_bool(self.p) {
            return Ok(None);
        }

        let reference = candidates.spatial_reference()?;
        let ratio = rng.gen_range(self.side_range.0..=self.side_range.1);
        let canvas_h = (reference.h as f64 * ratio) as i64;
        let canvas_w = (reference.w as f64 * ratio) as i64;

        let top = rng.gen_range(0..=canvas_h - reference.h);
        let left = rng.gen_range(0..=canvas_w - reference.w);
        Ok(Some(ZoomOutParams {
            padding: PadBy {
                left,
                top,
                right: canvas_w - reference.w - left,
                bottom: canvas_h - reference.h - top,
            },
        }))
    }

    fn apply_item(&self, item: Item, params: &ZoomOutParams) -> Result<Item> {
        Ok(pad_item(
            item,
            params.padding,
            PaddingMode::Constant,
            &self.fill,
        ))
    }
}

item_wise_transform!(Pad, RandomZoomOut);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Transform;

    #[test]
    fn pad_grows_image_and_boxes_together() {
        let transform = Pad::from_arity(&[2], Fill::Zero, PaddingMode::Constant).unwrap();
        let sample = Sample::map(vec![
            (
                "image",
                Sample::from(Image::new(Tensor::ones(&[3, 4, 4], FLOAT_CPU)).unwrap()),
            ),
            (
                "boxes",
                Sample::from(
                    BoundingBoxes::new(
                        Tensor::of_slice(&[1.0f32, 1.0, 3.0, 3.0]),
                        BoxFormat::Xyxy,
                        PixelSize { h: 4, w: 4 },
                    )
                    .unwrap(),
                ),
            ),
        ]);

        let mut rng = StdRng::seed_from_u64(0);
        let out = transform.transform(sample, &mut rng).unwrap();
        let leaves = out.leaves();
        match (leaves[0], leaves[1]) {
            (Item::Image(image), Item::BoundingBoxes(boxes)) => {
                assert_eq!(image.spatial_size(), PixelSize { h: 8, w: 8 });
                assert_eq!(boxes.canvas(), PixelSize { h: 8, w: 8 });
            }
            _ => panic!("unexpected leaf kinds"),
        }
    }

    #[test]
    fn zoom_out_side_range_validated() {
        assert!(RandomZoomOut::new(Fill::Zero, (r64(0.5), r64(2.0)), 0.5).is_err());
        assert!(RandomZoomOut::new(Fill::Zero, (r64(1.0), r64(4.0)), 0.5).is_ok());
    }
}

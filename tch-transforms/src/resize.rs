//! Deterministic and randomized resizing.

use crate::{
    common::*,
    fill::Interpolation,
    kernel,
    transform::{item_wise_transform, Candidates, ItemWise},
};

fn resize_item(item: Item, size: PixelSize<i64>, interpolation: Interpolation) -> Item {
    match item {
        Item::Image(image) => {
            Item::Image(image.map(|data| kernel::resize(&data, size, interpolation)))
        }
        Item::Video(video) => {
            Item::Video(video.map(|data| kernel::resize(&data, size, interpolation)))
        }
        Item::Tensor(data) => Item::Tensor(kernel::resize(&data, size, interpolation)),
        Item::Mask(mask) => {
            Item::Mask(mask.map(|data| kernel::resize(&data, size, Interpolation::Nearest)))
        }
        Item::BoundingBoxes(boxes) => Item::BoundingBoxes(kernel::resize_boxes(&boxes, size)),
        Item::DynImage(image) => {
            Item::DynImage(kernel::resize_dyn_image(&image, size, interpolation))
        }
        other => other,
    }
}

/// Resize every spatial item to a fixed size.
#[derive(Debug, Clone)]
pub struct Resize {
    size: PixelSize<i64>,
    interpolation: Interpolation,
}

impl Resize {
    pub fn new(size: PixelSize<i64>, interpolation: Interpolation) -> Result<Self> {
        ensure_config!(
            size.h > 0 && size.w > 0,
            "resize target must be positive, but get {}",
            size
        );
        Ok(Self {
            size,
            interpolation,
        })
    }
}

impl ItemWise for Resize {
    type Params = ();

    fn resolve(&self, _candidates: &Candidates<'_>, _rng: &mut StdRng) -> Result<Option<()>> {
        Ok(Some(()))
    }

    fn apply_item(&self, item: Item, _params: &()) -> Result<Item> {
        Ok(resize_item(item, self.size, self.interpolation))
    }
}

/// Resize to a square side drawn uniformly from `min_size..max_size`.
#[derive(Debug, Clone)]
pub struct RandomResize {
    min_size: i64,
    max_size: i64,
    interpolation: Interpolation,
}

impl RandomResize {
    pub fn new(min_size: i64, max_size: i64, interpolation: Interpolation) -> Result<Self> {
        ensure_config!(
            0 < min_size && min_size <= max_size,
            "invalid size range {}..{}",
            min_size,
            max_size
        );
        Ok(Self {
            min_size,
            max_size,
            interpolation,
        })
    }
}

#[derive(Debug)]
pub struct RandomResizeParams {
    pub size: PixelSize<i64>,
}

impl ItemWise for RandomResize {
    type Params = RandomResizeParams;

    fn resolve(
        &self,
        _candidates: &Candidates<'_>,
        rng: &mut StdRng,
    ) -> Result<Option<RandomResizeParams>> {
        let side = rng.gen_range(self.min_size..=self.max_size);
        Ok(Some(RandomResizeParams {
            size: PixelSize { h: side, w: side },
        }))
    }

    fn apply_item(&self, item: Item, params: &RandomResizeParams) -> Result<Item> {
        Ok(resize_item(item, params.size, self.interpolation))
    }
}

item_wise_transform!(Resize, RandomResize);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Transform;

    #[test]
    fn resize_scales_boxes_with_image() {
        let transform =
            Resize::new(PixelSize { h: 8, w: 16 }, Interpolation::Bilinear).unwrap();
        let sample = Sample::tuple(vec![
            Sample::from(Image::new(Tensor::ones(&[3, 4, 8], FLOAT_CPU)).unwrap()),
            Sample::from(
                BoundingBoxes::new(
                    Tensor::of_slice(&[1.0f32, 1.0, 3.0, 3.0]),
                    BoxFormat::Xyxy,
                    PixelSize { h: 4, w: 8 },
                )
                .unwrap(),
            ),
        ]);

        let mut rng = StdRng::seed_from_u64(0);
        let out = transform.transform(sample, &mut rng).unwrap();
        let leaves = out.leaves();
        match (leaves[0], leaves[1]) {
            (Item::Image(image), Item::BoundingBoxes(boxes)) => {
                assert_eq!(image.spatial_size(), PixelSize { h: 8, w: 16 });
                assert_eq!(boxes.canvas(), PixelSize { h: 8, w: 16 });
                assert_eq!(
                    boxes.data(),
                    &Tensor::of_slice(&[2.0f32, 2.0, 6.0, 6.0]).view([1, 4])
                );
            }
            _ => panic!("unexpected leaf kinds"),
        }
    }
}

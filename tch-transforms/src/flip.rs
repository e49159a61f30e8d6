//! Randomized horizontal and vertical flips.

use crate::{
    common::*,
    kernel,
    transform::{item_wise_transform, Candidates, ItemWise},
};

/// Flip the sample horizontally with probability `p`.
///
/// The coin is flipped once per sample; on skip no further randomness is
/// consumed.
#[derive(Debug, Clone)]
pub struct RandomHorizontalFlip {
    p: f64,
}

impl RandomHorizontalFlip {
    pub fn new(p: f64) -> Result<Self> {
        ensure_config!(
            (0.0..=1.0).contains(&p),
            "probability must be in range 0.0..=1.0, but get {}",
            p
        );
        Ok(Self { p })
    }
}

impl ItemWise for RandomHorizontalFlip {
    type Params = ();

    fn resolve(&self, _candidates: &Candidates<'_>, rng: &mut StdRng) -> Result<Option<()>> {
        Ok(rng.gen_bool(self.p).then(|| ()))
    }

    fn apply_item(&self, item: Item, _params: &()) -> Result<Item> {
        Ok(match item {
            Item::Image(image) => Item::Image(image.map(|data| kernel::hflip(&data))),
            Item::Video(video) => Item::Video(video.map(|data| kernel::hflip(&data))),
            Item::Mask(mask) => Item::Mask(mask.map(|data| kernel::hflip(&data))),
            Item::Tensor(data) => Item::Tensor(kernel::hflip(&data)),
            Item::BoundingBoxes(boxes) => Item::BoundingBoxes(kernel::hflip_boxes(&boxes)),
            Item::DynImage(image) => Item::DynImage(image.fliph()),
            other => other,
        })
    }
}

/// Flip the sample vertically with probability `p`.
#[derive(Debug, Clone)]
pub struct RandomVerticalFlip {
    p: f64,
}

impl RandomVerticalFlip {
    pub fn new(p: f64) -> Result<Self> {
        ensure_config!(
            (0.0..=1.0).contains(&p),
            "probability must be in range 0.0..=1.0, but get {}",
            p
        );
        Ok(Self { p })
    }
}

impl ItemWise for RandomVerticalFlip {
    type Params = ();

    fn resolve(&self, _candidates: &Candidates<'_>, rng: &mut StdRng) -> Result<Option<()>> {
        Ok(rng.gen_bool(self.p).then(|| ()))
    }

    fn apply_item(&self, item: Item, _params: &()) -> Result<Item> {
        Ok(match item {
            Item::Image(image) => Item::Image(image.map(|data| kernel::vflip(&data))),
            Item::Video(video) => Item::Video(video.map(|data| kernel::vflip(&data))),
            Item::Mask(mask) => Item::Mask(mask.map(|data| kernel::vflip(&data))),
            Item::Tensor(data) => Item::Tensor(kernel::vflip(&data)),
            Item::BoundingBoxes(boxes) => Item::BoundingBoxes(kernel::vflip_boxes(&boxes)),
            Item::DynImage(image) => Item::DynImage(image.flipv()),
            other => other,
        })
    }
}

item_wise_transform!(RandomHorizontalFlip, RandomVerticalFlip);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Transform;

    #[test]
    fn p_out_of_range_is_rejected() {
        assert!(matches!(
            RandomHorizontalFlip::new(1.5),
            Err(TransformError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn p_zero_is_identity() {
        let transform = RandomHorizontalFlip::new(0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let data = Tensor::of_slice(&[0.0f32, 1.0, 0.0, 1.0]).view([1, 2, 2]);
        let sample = Sample::from(Image::new(data.shallow_clone()).unwrap());
        let out = transform.transform(sample, &mut rng).unwrap();
        match out {
            Sample::Leaf(Item::Image(image)) => assert_eq!(image.data(), &data),
            _ => panic!("expected an image leaf"),
        }
    }
}

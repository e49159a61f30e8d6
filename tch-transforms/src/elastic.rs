//! Elastic distortion driven by a smoothed random displacement field.

use crate::{
    common::*,
    fill::{Fill, Interpolation},
    kernel::{elastic_boxes, elastic_grid, gaussian_blur, warp_with_grid},
    transform::{item_wise_transform, plane_size, Candidates, ItemWise},
};

#[derive(Debug, Clone, PartialEq)]
pub struct ElasticTransformInit {
    /// Displacement magnitude in pixels, per axis.
    pub alpha: (R64, R64),
    /// Gaussian smoothing sigma in pixels, per axis.
    pub sigma: (R64, R64),
    pub interpolation: Interpolation,
    pub fill: Fill,
}

impl ElasticTransformInit {
    pub fn build(self) -> Result<ElasticTransform> {
        let Self {
            alpha,
            sigma,
            interpolation,
            fill,
        } = self;
        ensure_config!(
            alpha.0 >= 0.0 && alpha.1 >= 0.0,
            "alpha must be non-negative"
        );
        ensure_config!(sigma.0 > 0.0 && sigma.1 > 0.0, "sigma must be positive");
        fill.validate()?;

        Ok(ElasticTransform {
            alpha: (alpha.0.raw(), alpha.1.raw()),
            sigma: (sigma.0.raw(), sigma.1.raw()),
            interpolation,
            fill,
        })
    }
}

impl Default for ElasticTransformInit {
    fn default() -> Self {
        Self {
            alpha: (r64(50.0), r64(50.0)),
            sigma: (r64(5.0), r64(5.0)),
            interpolation: Interpolation::Bilinear,
            fill: Fill::Zero,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ElasticTransform {
    alpha: (f64, f64),
    sigma: (f64, f64),
    interpolation: Interpolation,
    fill: Fill,
}

#[derive(Debug)]
pub struct ElasticParams {
    /// `[H, W, 2]` offsets in normalized grid units.
    pub displacement: Tensor,
    pub size: PixelSize<i64>,
}

impl ItemWise for ElasticTransform {
    type Params = ElasticParams;

    fn resolve(
        &self,
        candidates: &Candidates<'_>,
        rng: &mut StdRng,
    ) -> Result<Option<ElasticParams>> {
        let size = candidates.spatial_reference()?;
        let (height, width) = (size.h, size.w);

        let raw: Vec<f32> = (0..height * width * 2)
            .map(|_| rng.gen_range(-1.0f32..=1.0))
            .collect();
        // [2, H, W] so the gaussian kernel smooths each axis plane
        let field = Tensor::of_slice(&raw).view([height, width, 2]).permute(&[2, 0, 1]);

        let kernel_of = |sigma: f64| {
            let radius = (sigma * 4.0).ceil() as i64;
            radius * 2 + 1
        };
        let smoothed = gaussian_blur(
            &field,
            [kernel_of(self.sigma.1), kernel_of(self.sigma.0)],
            [self.sigma.1, self.sigma.0],
        );

        let scale = Tensor::of_slice(&[
            (self.alpha.0 * 2.0 / width as f64) as f32,
            (self.alpha.1 * 2.0 / height as f64) as f32,
        ])
        .view([2, 1, 1]);
        let displacement = (smoothed * scale).permute(&[1, 2, 0]);

        Ok(Some(ElasticParams { displacement, size }))
    }

    fn apply_item(&self, item: Item, params: &ElasticParams) -> Result<Item> {
        let size = match plane_size(&item) {
            Some(size) => size,
            None => return Ok(item),
        };
        let grid = elastic_grid(&params.displacement, size);

        Ok(match item {
            Item::Image(image) => Item::Image(
                image.map(|data| warp_with_grid(&data, &grid, self.interpolation, &self.fill)),
            ),
            Item::Video(video) => Item::Video(
                video.map(|data| warp_with_grid(&data, &grid, self.interpolation, &self.fill)),
            ),
            Item::Tensor(data) => {
                Item::Tensor(warp_with_grid(&data, &grid, self.interpolation, &self.fill))
            }
            Item::Mask(mask) => Item::Mask(mask.map(|data| {
                warp_with_grid(&data, &grid, Interpolation::Nearest, &Fill::Zero)
            })),
            Item::BoundingBoxes(boxes) => {
                Item::BoundingBoxes(elastic_boxes(&boxes, &params.displacement))
            }
            other => other,
        })
    }
}

item_wise_transform!(ElasticTransform);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigma_must_be_positive() {
        let init = ElasticTransformInit {
            sigma: (r64(0.0), r64(1.0)),
            ..ElasticTransformInit::default()
        };
        assert!(matches!(
            init.build(),
            Err(TransformError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn displacement_matches_reference_shape() {
        let transform = ElasticTransformInit::default().build().unwrap();
        let image = Image::new(Tensor::zeros(&[3, 6, 8], FLOAT_CPU)).unwrap();
        let item = Item::Image(image);
        let candidates = Candidates::new(vec![&item]);
        let mut rng = StdRng::seed_from_u64(7);
        let params = transform.resolve(&candidates, &mut rng).unwrap().unwrap();
        assert_eq!(params.displacement.size(), &[6, 8, 2]);
    }
}

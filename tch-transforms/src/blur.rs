//! Gaussian blur with a randomly drawn sigma.

use crate::{
    common::*,
    kernel,
    transform::{item_wise_transform, Candidates, ItemWise},
};

#[derive(Debug, Clone, PartialEq)]
pub struct GaussianBlurInit {
    /// Odd positive kernel extent as (height, width).
    pub kernel_size: (i64, i64),
    /// Sigma range sampled once per sample.
    pub sigma: (R64, R64),
}

impl GaussianBlurInit {
    pub fn build(self) -> Result<GaussianBlur> {
        let Self {
            kernel_size,
            sigma,
        } = self;
        ensure_config!(
            kernel_size.0 > 0 && kernel_size.0 % 2 == 1 && kernel_size.1 > 0
                && kernel_size.1 % 2 == 1,
            "kernel size must be odd and positive, but get {:?}",
            kernel_size
        );
        ensure_config!(
            sigma.0 > 0.0 && sigma.0 <= sigma.1,
            "sigma bounds must be positive and ordered, but get ({}, {})",
            sigma.0,
            sigma.1
        );

        Ok(GaussianBlur {
            kernel_size,
            sigma: (sigma.0.raw(), sigma.1.raw()),
        })
    }
}

impl Default for GaussianBlurInit {
    fn default() -> Self {
        Self {
            kernel_size: (3, 3),
            sigma: (r64(0.1), r64(2.0)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GaussianBlur {
    kernel_size: (i64, i64),
    sigma: (f64, f64),
}

#[derive(Debug)]
pub struct BlurParams {
    pub sigma: f64,
}

impl ItemWise for GaussianBlur {
    type Params = BlurParams;

    fn kinds(&self) -> KindSet {
        KindSet::of(&[ItemKind::Image, ItemKind::Video, ItemKind::Tensor])
    }

    fn resolve(
        &self,
        _candidates: &Candidates<'_>,
        rng: &mut StdRng,
    ) -> Result<Option<BlurParams>> {
        let sigma = rng.gen_range(self.sigma.0..=self.sigma.1);
        Ok(Some(BlurParams { sigma }))
    }

    fn apply_item(&self, item: Item, params: &BlurParams) -> Result<Item> {
        let (kernel_h, kernel_w) = self.kernel_size;
        let blur = |data: &Tensor| {
            kernel::gaussian_blur(data, [kernel_h, kernel_w], [params.sigma, params.sigma])
        };

        Ok(match item {
            Item::Image(image) => Item::Image(image.map(|data| blur(&data))),
            Item::Video(video) => Item::Video(video.map(|data| blur(&data))),
            Item::Tensor(data) => Item::Tensor(blur(&data)),
            other => other,
        })
    }
}

item_wise_transform!(GaussianBlur);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_kernel_is_rejected() {
        let init = GaussianBlurInit {
            kernel_size: (4, 3),
            ..GaussianBlurInit::default()
        };
        assert!(matches!(
            init.build(),
            Err(TransformError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn sigma_draw_is_within_bounds() {
        let transform = GaussianBlurInit {
            kernel_size: (3, 3),
            sigma: (r64(0.5), r64(1.5)),
        }
        .build()
        .unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let candidates = Candidates::new(vec![]);
        for _ in 0..20 {
            let params = transform.resolve(&candidates, &mut rng).unwrap().unwrap();
            assert!((0.5..=1.5).contains(&params.sigma));
        }
    }
}

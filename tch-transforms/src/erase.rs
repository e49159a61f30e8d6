//! Random rectangular erasing on image-like tensors.

use crate::{
    common::*,
    kernel,
    transform::{item_wise_transform, plane_size, Candidates, ItemWise},
};

/// What the erased window is filled with.
#[derive(Debug, Clone, PartialEq)]
pub enum EraseValue {
    /// Independent standard-normal noise per erased element.
    Random,
    Uniform(f64),
    PerChannel(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RandomErasingInit {
    pub p: R64,
    /// Erased area bounds as fractions of the input area.
    pub scale: (R64, R64),
    /// Aspect ratio bounds of the erased window.
    pub ratio: (R64, R64),
    pub value: EraseValue,
}

impl RandomErasingInit {
    pub fn build(self) -> Result<RandomErasing> {
        let Self {
            p,
            scale,
            ratio,
            value,
        } = self;
        ensure_config!(
            (0.0..=1.0).contains(&p.raw()),
            "probability must be in range 0.0..=1.0, but get {}",
            p
        );
        ensure_config!(
            scale.0 >= 0.0 && scale.0 <= scale.1 && scale.1 <= 1.0,
            "scale bounds must be ordered within 0.0..=1.0"
        );
        ensure_config!(
            ratio.0 > 0.0 && ratio.0 <= ratio.1,
            "ratio bounds must be positive and ordered"
        );
        if let EraseValue::PerChannel(values) = &value {
            ensure_config!(
                !values.is_empty(),
                "per-channel erase value must not be empty"
            );
        }

        Ok(RandomErasing {
            p: p.raw(),
            scale: (scale.0.raw(), scale.1.raw()),
            ratio: (ratio.0.raw(), ratio.1.raw()),
            value,
        })
    }
}

impl Default for RandomErasingInit {
    fn default() -> Self {
        Self {
            p: r64(0.5),
            scale: (r64(0.02), r64(0.33)),
            ratio: (r64(0.3), r64(3.3)),
            value: EraseValue::Uniform(0.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RandomErasing {
    p: f64,
    scale: (f64, f64),
    ratio: (f64, f64),
    value: EraseValue,
}

#[derive(Debug)]
pub struct EraseParams {
    pub top: i64,
    pub left: i64,
    pub height: i64,
    pub width: i64,
    pub value: Tensor,
}

impl ItemWise for RandomErasing {
    type Params = EraseParams;

    fn kinds(&self) -> KindSet {
        KindSet::of(&[ItemKind::Image, ItemKind::Video, ItemKind::Tensor])
    }

    fn resolve(
        &self,
        candidates: &Candidates<'_>,
        rng: &mut StdRng,
    ) -> Result<Option<EraseParams>> {
        if !rng.gen_bool(self.p) {
            return Ok(None);
        }

        let reference = candidates.spatial_reference().or_else(|_| {
            candidates
                .items()
                .iter()
                .find_map(|item| plane_size(item))
                .ok_or_else(|| {
                    TransformError::no_spatial_reference(
                        "random erasing requires an image-like candidate",
                    )
                })
        })?;
        let area = (reference.h * reference.w) as f64;
        let log_ratio = (self.ratio.0.ln(), self.ratio.1.ln());

        for _ in 0..10 {
            let erase_area = area * rng.gen_range(self.scale.0..=self.scale.1);
            let aspect = rng.gen_range(log_ratio.0..=log_ratio.1).exp();

            let height = (erase_area / aspect).sqrt().round() as i64;
            let width = (erase_area * aspect).sqrt().round() as i64;
            if height <= 0 || height >= reference.h || width <= 0 || width >= reference.w {
                continue;
            }

            let top = rng.gen_range(0..=reference.h - height);
            let left = rng.gen_range(0..=reference.w - width);

            let value = match &self.value {
                EraseValue::Uniform(value) => {
                    Tensor::zeros(&[1, 1, 1], FLOAT_CPU) + *value
                }
                EraseValue::PerChannel(values) => {
                    let values: Vec<f32> = values.iter().map(|&value| value as f32).collect();
                    Tensor::of_slice(&values).view([-1, 1, 1])
                }
                EraseValue::Random => {
                    let count = (height * width) as usize;
                    let noise: Vec<f32> =
                        (0..count).map(|_| rng.sample(rand_distr::StandardNormal)).collect();
                    Tensor::of_slice(&noise).view([1, height, width])
                }
            };

            return Ok(Some(EraseParams {
                top,
                left,
                height,
                width,
                value,
            }));
        }

        Ok(None)
    }

    fn apply_item(&self, item: Item, params: &EraseParams) -> Result<Item> {
        let EraseParams {
            top,
            left,
            height,
            width,
            ref value,
        } = *params;
        let erase = |data: &Tensor| kernel::erase(data, top, left, height, width, value);

        Ok(match item {
            Item::Image(image) => Item::Image(image.map(|data| erase(&data))),
            Item::Video(video) => Item::Video(video.map(|data| erase(&data))),
            Item::Tensor(data) => Item::Tensor(erase(&data)),
            other => other,
        })
    }
}

item_wise_transform!(RandomErasing);

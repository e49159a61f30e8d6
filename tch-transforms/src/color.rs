//! The random color jitter algorithm.

use crate::{
    common::*,
    kernel,
    transform::{item_wise_transform, Candidates, ItemWise},
};

#[derive(Debug, Clone, PartialEq)]
pub struct ColorJitterInit {
    /// Maximum brightness deviation from 1.0.
    pub brightness: Option<R64>,
    /// Maximum contrast deviation from 1.0.
    pub contrast: Option<R64>,
    /// Maximum saturation deviation from 1.0.
    pub saturation: Option<R64>,
    /// Maximum hue shift in turns, at most 0.5.
    pub hue: Option<R64>,
}

impl ColorJitterInit {
    pub fn build(self) -> Result<ColorJitter> {
        let Self {
            brightness,
            contrast,
            saturation,
            hue,
        } = self;

        let range_about_one = |name: &str, bound: Option<R64>| {
            bound
                .map(|bound| {
                    ensure_config!(
                        bound >= 0.0,
                        "{} deviation must be non-negative, but get {}",
                        name,
                        bound
                    );
                    Ok(((1.0 - bound.raw()).max(0.0), 1.0 + bound.raw()))
                })
                .transpose()
        };

        let brightness = range_about_one("brightness", brightness)?;
        let contrast = range_about_one("contrast", contrast)?;
        let saturation = range_about_one("saturation", saturation)?;
        let hue = hue
            .map(|bound| {
                ensure_config!(
                    (0.0..=0.5).contains(&bound.raw()),
                    "hue shift must be in range 0.0..=0.5, but get {}",
                    bound
                );
                Ok((-bound.raw(), bound.raw()))
            })
            .transpose()?;

        Ok(ColorJitter {
            brightness,
            contrast,
            saturation,
            hue,
        })
    }
}

impl Default for ColorJitterInit {
    fn default() -> Self {
        Self {
            brightness: None,
            contrast: None,
            saturation: None,
            hue: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColorJitter {
    brightness: Option<(f64, f64)>,
    contrast: Option<(f64, f64)>,
    saturation: Option<(f64, f64)>,
    hue: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorOp {
    Brightness(f64),
    Contrast(f64),
    Saturation(f64),
    Hue(f64),
}

#[derive(Debug)]
pub struct ColorJitterParams {
    /// Enabled adjustments in the order drawn for this sample.
    pub ops: Vec<ColorOp>,
}

impl ItemWise for ColorJitter {
    type Params = ColorJitterParams;

    fn kinds(&self) -> KindSet {
        KindSet::of(&[ItemKind::Image, ItemKind::Video, ItemKind::Tensor])
    }

    fn resolve(
        &self,
        _candidates: &Candidates<'_>,
        rng: &mut StdRng,
    ) -> Result<Option<ColorJitterParams>> {
        let mut ops = vec![];
        if let Some((lower, upper)) = self.brightness {
            ops.push(ColorOp::Brightness(rng.gen_range(lower..=upper)));
        }
        if let Some((lower, upper)) = self.contrast {
            ops.push(ColorOp::Contrast(rng.gen_range(lower..=upper)));
        }
        if let Some((lower, upper)) = self.saturation {
            ops.push(ColorOp::Saturation(rng.gen_range(lower..=upper)));
        }
        if let Some((lower, upper)) = self.hue {
            ops.push(ColorOp::Hue(rng.gen_range(lower..=upper)));
        }
        ops.shuffle(rng);
        Ok(Some(ColorJitterParams { ops }))
    }

    fn apply_item(&self, item: Item, params: &ColorJitterParams) -> Result<Item> {
        let adjust = |data: &Tensor| {
            params.ops.iter().fold(data.shallow_clone(), |data, op| match *op {
                ColorOp::Brightness(factor) => kernel::adjust_brightness(&data, factor),
                ColorOp::Contrast(factor) => kernel::adjust_contrast(&data, factor),
                ColorOp::Saturation(factor) => kernel::adjust_saturation(&data, factor),
                ColorOp::Hue(shift) => kernel::adjust_hue(&data, shift),
            })
        };

        Ok(match item {
            Item::Image(image) => Item::Image(image.map(|data| adjust(&data))),
            Item::Video(video) => Item::Video(video.map(|data| adjust(&data))),
            Item::Tensor(data) => Item::Tensor(adjust(&data)),
            other => other,
        })
    }
}

item_wise_transform!(ColorJitter);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hue_bound_validated() {
        let init = ColorJitterInit {
            hue: Some(r64(0.7)),
            ..ColorJitterInit::default()
        };
        assert!(matches!(
            init.build(),
            Err(TransformError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn disabled_jitter_draws_no_ops() {
        let transform = ColorJitterInit::default().build().unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let candidates = Candidates::new(vec![]);
        let params = transform.resolve(&candidates, &mut rng).unwrap().unwrap();
        assert!(params.ops.is_empty());
    }
}

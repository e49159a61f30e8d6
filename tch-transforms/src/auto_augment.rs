//! Policy-driven augmentation in the AutoAugment style.
//!
//! The policy content is pluggable: a provider supplies an ordered list of
//! (operation, probability, magnitude range) entries and the transform
//! draws one entry per sample.

use crate::{
    common::*,
    fill::{Fill, Interpolation},
    kernel::{self, warp_item, Mat3},
    transform::{item_wise_transform, plane_size, Candidates, ItemWise},
};
use once_cell::sync::Lazy;

/// Operations a policy entry can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyOp {
    Identity,
    ShearX,
    ShearY,
    TranslateX,
    TranslateY,
    Rotate,
    Brightness,
    Contrast,
    Saturation,
    Hue,
    Posterize,
    Solarize,
    Invert,
}

impl PolicyOp {
    /// Signed ops draw a random direction on top of the magnitude.
    fn is_signed(self) -> bool {
        matches!(
            self,
            PolicyOp::ShearX
                | PolicyOp::ShearY
                | PolicyOp::TranslateX
                | PolicyOp::TranslateY
                | PolicyOp::Rotate
                | PolicyOp::Brightness
                | PolicyOp::Contrast
                | PolicyOp::Saturation
                | PolicyOp::Hue
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyEntry {
    pub op: PolicyOp,
    pub probability: f64,
    /// Magnitude bounds the draw interpolates between.
    pub magnitude: (f64, f64),
}

/// Provider of augmentation recipes.
pub trait AugmentPolicy: Debug {
    fn entries(&self) -> &[PolicyEntry];
}

static DEFAULT_ENTRIES: Lazy<Vec<PolicyEntry>> = Lazy::new(|| {
    let entry = |op, probability, magnitude| PolicyEntry {
        op,
        probability,
        magnitude,
    };
    vec![
        entry(PolicyOp::Identity, 1.0, (0.0, 0.0)),
        entry(PolicyOp::ShearX, 0.6, (0.0, 17.0)),
        entry(PolicyOp::ShearY, 0.6, (0.0, 17.0)),
        entry(PolicyOp::TranslateX, 0.5, (0.0, 0.3)),
        entry(PolicyOp::TranslateY, 0.5, (0.0, 0.3)),
        entry(PolicyOp::Rotate, 0.7, (0.0, 30.0)),
        entry(PolicyOp::Brightness, 0.6, (0.0, 0.9)),
        entry(PolicyOp::Contrast, 0.6, (0.0, 0.9)),
        entry(PolicyOp::Saturation, 0.6, (0.0, 0.9)),
        entry(PolicyOp::Hue, 0.3, (0.0, 0.4)),
        entry(PolicyOp::Posterize, 0.4, (4.0, 8.0)),
        entry(PolicyOp::Solarize, 0.4, (0.3, 1.0)),
        entry(PolicyOp::Invert, 0.1, (0.0, 0.0)),
    ]
});

/// The built-in policy table.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl AugmentPolicy for DefaultPolicy {
    fn entries(&self) -> &[PolicyEntry] {
        &DEFAULT_ENTRIES
    }
}

/// Draw one policy entry per sample and apply it to the image-like items.
#[derive(Debug)]
pub struct AutoAugment {
    policy: Box<dyn AugmentPolicy>,
    interpolation: Interpolation,
    fill: Fill,
}

impl AutoAugment {
    pub fn new(policy: Box<dyn AugmentPolicy>) -> Result<Self> {
        ensure_config!(
            !policy.entries().is_empty(),
            "the augmentation policy must supply at least one entry"
        );
        for entry in policy.entries() {
            ensure_config!(
                (0.0..=1.0).contains(&entry.probability),
                "policy probability must be in range 0.0..=1.0, but get {}",
                entry.probability
            );
        }
        Ok(Self {
            policy,
            interpolation: Interpolation::Nearest,
            fill: Fill::Zero,
        })
    }
}

impl Default for AutoAugment {
    fn default() -> Self {
        Self {
            policy: Box::new(DefaultPolicy),
            interpolation: Interpolation::Nearest,
            fill: Fill::Zero,
        }
    }
}

#[derive(Debug)]
pub struct AutoAugmentParams {
    pub op: PolicyOp,
    pub magnitude: f64,
}

impl ItemWise for AutoAugment {
    type Params = AutoAugmentParams;

    fn kinds(&self) -> KindSet {
        KindSet::of(&[ItemKind::Image, ItemKind::Video, ItemKind::Tensor])
    }

    fn resolve(
        &self,
        _candidates: &Candidates<'_>,
        rng: &mut StdRng,
    ) -> Result<Option<AutoAugmentParams>> {
        let entries = self.policy.entries();
        let entry = &entries[rng.gen_range(0..entries.len())];

        if !rng.gen_bool(entry.probability) {
            return Ok(Some(AutoAugmentParams {
                op: PolicyOp::Identity,
                magnitude: 0.0,
            }));
        }

        let (lower, upper) = entry.magnitude;
        let mut magnitude = rng.gen_range(lower.min(upper)..=lower.max(upper));
        if entry.op.is_signed() && rng.gen_bool(0.5) {
            magnitude = -magnitude;
        }
        Ok(Some(AutoAugmentParams {
            op: entry.op,
            magnitude,
        }))
    }

    fn apply_item(&self, item: Item, params: &AutoAugmentParams) -> Result<Item> {
        let magnitude = params.magnitude;

        // geometric ops act about the item center; centering is a no-op for
        // pure translations
        let geometric = |item: Item, build: &dyn Fn(PixelSize<i64>) -> Mat3| {
            let size = match plane_size(&item) {
                Some(size) => size,
                None => return item,
            };
            let center_x = size.w as f64 / 2.0;
            let center_y = size.h as f64 / 2.0;
            let forward = Mat3::translation(center_x, center_y)
                .compose(&build(size))
                .compose(&Mat3::translation(-center_x, -center_y));
            warp_item(item, &forward, size, self.interpolation, &self.fill)
        };
        let photometric = |item: Item, f: &dyn Fn(&Tensor) -> Tensor| match item {
            Item::Image(image) => Item::Image(image.map(|data| f(&data))),
            Item::Video(video) => Item::Video(video.map(|data| f(&data))),
            Item::Tensor(data) => Item::Tensor(f(&data)),
            other => other,
        };

        Ok(match params.op {
            PolicyOp::Identity => item,
            PolicyOp::ShearX => {
                geometric(item, &|_| Mat3::shear(magnitude.to_radians(), 0.0))
            }
            PolicyOp::ShearY => {
                geometric(item, &|_| Mat3::shear(0.0, magnitude.to_radians()))
            }
            PolicyOp::TranslateX => geometric(item, &|size: PixelSize<i64>| {
                Mat3::translation(magnitude * size.w as f64, 0.0)
            }),
            PolicyOp::TranslateY => geometric(item, &|size: PixelSize<i64>| {
                Mat3::translation(0.0, magnitude * size.h as f64)
            }),
            PolicyOp::Rotate => geometric(item, &|_| Mat3::rotation(magnitude.to_radians())),
            PolicyOp::Brightness => {
                photometric(item, &|data| kernel::adjust_brightness(data, 1.0 + magnitude))
            }
            PolicyOp::Contrast => {
                photometric(item, &|data| kernel::adjust_contrast(data, 1.0 + magnitude))
            }
            PolicyOp::Saturation => {
                photometric(item, &|data| kernel::adjust_saturation(data, 1.0 + magnitude))
            }
            PolicyOp::Hue => photometric(item, &|data| kernel::adjust_hue(data, magnitude)),
            PolicyOp::Posterize => {
                let bits = magnitude.round().clamp(1.0, 8.0) as i64;
                photometric(item, &move |data| kernel::posterize(data, bits))
            }
            PolicyOp::Solarize => {
                photometric(item, &|data| kernel::solarize(data, magnitude))
            }
            PolicyOp::Invert => photometric(item, &kernel::invert),
        })
    }
}

item_wise_transform!(AutoAugment);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_nonempty() {
        assert!(!DefaultPolicy.entries().is_empty());
    }

    #[test]
    fn identity_entry_keeps_data() {
        let transform = AutoAugment::default();
        let data = Tensor::of_slice(&[0.1f32, 0.2, 0.3, 0.4]).view([1, 2, 2]);
        let image = Image::new(data.shallow_clone()).unwrap();
        let out = transform
            .apply_item(
                Item::Image(image),
                &AutoAugmentParams {
                    op: PolicyOp::Identity,
                    magnitude: 0.0,
                },
            )
            .unwrap();
        match out {
            Item::Image(out) => assert_eq!(out.data(), &data),
            _ => panic!("expected an image"),
        }
    }
}

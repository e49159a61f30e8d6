//! Random affine transform with rotation, translation, scaling and shear.

use crate::{
    common::*,
    fill::{Fill, Interpolation},
    kernel::{warp_item, Mat3},
    transform::{item_wise_transform, plane_size, Candidates, ItemWise},
};

#[derive(Debug, Clone, PartialEq)]
pub struct RandomAffineInit {
    /// Rotation range in degrees.
    pub degrees: (R64, R64),
    /// Maximum horizontal and vertical translation as fractions of the
    /// reference width and height.
    pub translate: Option<(R64, R64)>,
    /// Scaling factor range.
    pub scale: Option<(R64, R64)>,
    /// Shear angle ranges in degrees, per axis.
    pub shear: Option<((R64, R64), (R64, R64))>,
    pub interpolation: Interpolation,
    pub fill: Fill,
}

impl RandomAffineInit {
    pub fn build(self) -> Result<RandomAffine> {
        let Self {
            degrees,
            translate,
            scale,
            shear,
            interpolation,
            fill,
        } = self;

        ensure_config!(
            degrees.0 <= degrees.1,
            "the lower degree bound must not exceed the upper bound"
        );
        let translate = translate
            .map(|(horizontal, vertical)| {
                ensure_config!(
                    (0.0..=1.0).contains(&horizontal.raw())
                        && (0.0..=1.0).contains(&vertical.raw()),
                    "translation fractions must be in range 0.0..=1.0"
                );
                Ok((horizontal.raw(), vertical.raw()))
            })
            .transpose()?;
        let scale = scale
            .map(|(lower, upper)| {
                ensure_config!(lower > 0.0, "scale min must be positive");
                ensure_config!(
                    lower <= upper,
                    "scale min must not exceed scale max"
                );
                Ok((lower.raw(), upper.raw()))
            })
            .transpose()?;
        let shear = shear
            .map(|((x_lower, x_upper), (y_lower, y_upper))| {
                ensure_config!(
                    x_lower <= x_upper && y_lower <= y_upper,
                    "shear lower bounds must not exceed the upper bounds"
                );
                Ok((
                    (x_lower.raw(), x_upper.raw()),
                    (y_lower.raw(), y_upper.raw()),
                ))
            })
            .transpose()?;
        fill.validate()?;

        Ok(RandomAffine {
            degrees: (degrees.0.raw(), degrees.1.raw()),
            translate,
            scale,
            shear,
            interpolation,
            fill,
        })
    }
}

impl Default for RandomAffineInit {
    fn default() -> Self {
        Self {
            degrees: (r64(0.0), r64(0.0)),
            translate: None,
            scale: None,
            shear: None,
            interpolation: Interpolation::Bilinear,
            fill: Fill::Zero,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RandomAffine {
    degrees: (f64, f64),
    translate: Option<(f64, f64)>,
    scale: Option<(f64, f64)>,
    shear: Option<((f64, f64), (f64, f64))>,
    interpolation: Interpolation,
    fill: Fill,
}

#[derive(Debug)]
pub struct AffineParams {
    pub angle: f64,
    pub translation: (f64, f64),
    pub scale: f64,
    pub shear: (f64, f64),
}

impl ItemWise for RandomAffine {
    type Params = AffineParams;

    fn resolve(
        &self,
        candidates: &Candidates<'_>,
        rng: &mut StdRng,
    ) -> Result<Option<AffineParams>> {
        let angle = rng.gen_range(self.degrees.0..=self.degrees.1);

        let translation = match self.translate {
            Some((max_horizontal, max_vertical)) => {
                let reference = candidates.spatial_reference()?;
                let max_dx = max_horizontal * reference.w as f64;
                let max_dy = max_vertical * reference.h as f64;
                (
                    rng.gen_range(-max_dx..=max_dx),
                    rng.gen_range(-max_dy..=max_dy),
                )
            }
            None => (0.0, 0.0),
        };

        let scale = match self.scale {
            Some((lower, upper)) => rng.gen_range(lower..=upper),
            None => 1.0,
        };

        let shear = match self.shear {
            Some(((x_lower, x_upper), (y_lower, y_upper))) => (
                rng.gen_range(x_lower..=x_upper),
                rng.gen_range(y_lower..=y_upper),
            ),
            None => (0.0, 0.0),
        };

        Ok(Some(AffineParams {
            angle,
            translation,
            scale,
            shear,
        }))
    }

    fn apply_item(&self, item: Item, params: &AffineParams) -> Result<Item> {
        let size = match plane_size(&item) {
            Some(size) => size,
            None => return Ok(item),
        };

        let center_x = size.w as f64 / 2.0;
        let center_y = size.h as f64 / 2.0;
        let forward = Mat3::translation(params.translation.0, params.translation.1)
            .compose(&Mat3::translation(center_x, center_y))
            .compose(&Mat3::rotation(params.angle.to_radians()))
            .compose(&Mat3::scale(params.scale, params.scale))
            .compose(&Mat3::shear(
                params.shear.0.to_radians(),
                params.shear.1.to_radians(),
            ))
            .compose(&Mat3::translation(-center_x, -center_y));

        Ok(warp_item(
            item,
            &forward,
            size,
            self.interpolation,
            &self.fill,
        ))
    }
}

item_wise_transform!(RandomAffine);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_bounds_are_rejected() {
        let init = RandomAffineInit {
            scale: Some((r64(0.0), r64(1.0))),
            ..RandomAffineInit::default()
        };
        assert!(matches!(
            init.build(),
            Err(TransformError::InvalidConfiguration(_))
        ));

        let init = RandomAffineInit {
            translate: Some((r64(1.5), r64(0.1))),
            ..RandomAffineInit::default()
        };
        assert!(init.build().is_err());
    }

    #[test]
    fn translation_requires_spatial_reference() {
        let transform = RandomAffineInit {
            translate: Some((r64(0.2), r64(0.2))),
            ..RandomAffineInit::default()
        }
        .build()
        .unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        let candidates = Candidates::new(vec![]);
        assert!(matches!(
            transform.resolve(&candidates, &mut rng),
            Err(TransformError::NoSpatialReference(_))
        ));
    }
}

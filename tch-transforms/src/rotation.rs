//! Random rotation with an optional expanded output canvas.

use crate::{
    common::*,
    fill::{Fill, Interpolation},
    kernel::{warp_item, Mat3},
    transform::{item_wise_transform, plane_size, Candidates, ItemWise},
};

#[derive(Debug, Clone, PartialEq)]
pub struct RandomRotationInit {
    /// Angle range in degrees. A single bound `b` means `(-b, b)`.
    pub degrees: (R64, R64),
    pub interpolation: Interpolation,
    /// Grow the canvas to hold the whole rotated input.
    pub expand: bool,
    /// Rotation center in pixels, defaulting to the item center.
    pub center: Option<(R64, R64)>,
    pub fill: Fill,
}

impl RandomRotationInit {
    pub fn from_bound(bound: R64) -> Result<Self> {
        ensure_config!(
            bound >= 0.0,
            "a single degree bound must be non-negative, but get {}",
            bound
        );
        Ok(Self {
            degrees: (-bound, bound),
            ..Self::default()
        })
    }

    pub fn build(self) -> Result<RandomRotation> {
        let Self {
            degrees: (lower, upper),
            interpolation,
            expand,
            center,
            fill,
        } = self;
        ensure_config!(
            lower <= upper,
            "the lower degree bound must not exceed the upper bound"
        );
        if expand {
            ensure_config!(
                center.is_none(),
                "a custom rotation center cannot be combined with expand"
            );
        }
        fill.validate()?;

        Ok(RandomRotation {
            degrees: (lower.raw(), upper.raw()),
            interpolation,
            expand,
            center: center.map(|(x, y)| (x.raw(), y.raw())),
            fill,
        })
    }
}

impl Default for RandomRotationInit {
    fn default() -> Self {
        Self {
            degrees: (r64(0.0), r64(0.0)),
            interpolation: Interpolation::Bilinear,
            expand: false,
            center: None,
            fill: Fill::Zero,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RandomRotation {
    degrees: (f64, f64),
    interpolation: Interpolation,
    expand: bool,
    center: Option<(f64, f64)>,
    fill: Fill,
}

#[derive(Debug)]
pub struct RotationParams {
    pub angle: f64,
}

impl RandomRotation {
    /// Forward matrix and output canvas for one item of the given size.
    fn geometry(&self, angle: f64, size: PixelSize<i64>) -> (Mat3, PixelSize<i64>) {
        let (center_x, center_y) = self
            .center
            .unwrap_or((size.w as f64 / 2.0, size.h as f64 / 2.0));
        let forward = Mat3::translation(center_x, center_y)
            .compose(&Mat3::rotation(angle.to_radians()))
            .compose(&Mat3::translation(-center_x, -center_y));

        if !self.expand {
            return (forward, size);
        }

        let corners = [
            (0.0, 0.0),
            (size.w as f64, 0.0),
            (0.0, size.h as f64),
            (size.w as f64, size.h as f64),
        ];
        let transformed: Vec<(f64, f64)> = corners
            .iter()
            .map(|&(x, y)| forward.apply(x, y))
            .collect();
        let min_x = transformed.iter().map(|&(x, _)| x).fold(f64::INFINITY, f64::min);
        let max_x = transformed
            .iter()
            .map(|&(x, _)| x)
            .fold(f64::NEG_INFINITY, f64::max);
        let min_y = transformed.iter().map(|&(_, y)| y).fold(f64::INFINITY, f64::min);
        let max_y = transformed
            .iter()
            .map(|&(_, y)| y)
            .fold(f64::NEG_INFINITY, f64::max);

        let out_size = PixelSize {
            h: (max_y - min_y).ceil() as i64,
            w: (max_x - min_x).ceil() as i64,
        };
        let forward = Mat3::translation(-min_x, -min_y).compose(&forward);
        (forward, out_size)
    }
}

impl ItemWise for RandomRotation {
    type Params = RotationParams;

    fn resolve(
        &self,
        _candidates: &Candidates<'_>,
        rng: &mut StdRng,
    ) -> Result<Option<RotationParams>> {
        let (lower, upper) = self.degrees;
        let angle = rng.gen_range(lower..=upper);
        Ok(Some(RotationParams { angle }))
    }

    fn apply_item(&self, item: Item, params: &RotationParams) -> Result<Item> {
        let size = match plane_size(&item) {
            Some(size) => size,
            None => return Ok(item),
        };
        let (forward, out_size) = self.geometry(params.angle, size);
        Ok(warp_item(
            item,
            &forward,
            out_size,
            self.interpolation,
            &self.fill,
        ))
    }
}

item_wise_transform!(RandomRotation);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_grows_canvas() {
        let transform = RandomRotationInit {
            degrees: (r64(45.0), r64(45.0)),
            expand: true,
            ..RandomRotationInit::default()
        }
        .build()
        .unwrap();
        let (_, out) = transform.geometry(45.0, PixelSize { h: 10, w: 10 });
        assert!(out.h > 10 && out.w > 10);
    }

    #[test]
    fn center_with_expand_is_rejected() {
        let init = RandomRotationInit {
            degrees: (r64(0.0), r64(10.0)),
            expand: true,
            center: Some((r64(1.0), r64(1.0))),
            ..RandomRotationInit::default()
        };
        assert!(matches!(
            init.build(),
            Err(TransformError::InvalidConfiguration(_))
        ));
    }
}

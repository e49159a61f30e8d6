//! Random four-point perspective distortion.

use crate::{
    common::*,
    fill::{Fill, Interpolation},
    kernel::{solve8, warp_item, Mat3},
    transform::{item_wise_transform, plane_size, Candidates, ItemWise},
};

#[derive(Debug, Clone, PartialEq)]
pub struct RandomPerspectiveInit {
    /// Degree of distortion, from 0 (none) to 1 (full corner range).
    pub distortion_scale: R64,
    pub p: R64,
    pub interpolation: Interpolation,
    pub fill: Fill,
}

impl RandomPerspectiveInit {
    pub fn build(self) -> Result<RandomPerspective> {
        let Self {
            distortion_scale,
            p,
            interpolation,
            fill,
        } = self;
        ensure_config!(
            (0.0..=1.0).contains(&distortion_scale.raw()),
            "distortion_scale must be in range 0.0..=1.0, but get {}",
            distortion_scale
        );
        ensure_config!(
            (0.0..=1.0).contains(&p.raw()),
            "probability must be in range 0.0..=1.0, but get {}",
            p
        );
        fill.validate()?;

        Ok(RandomPerspective {
            distortion_scale: distortion_scale.raw(),
            p: p.raw(),
            interpolation,
            fill,
        })
    }
}

impl Default for RandomPerspectiveInit {
    fn default() -> Self {
        Self {
            distortion_scale: r64(0.5),
            p: r64(0.5),
            interpolation: Interpolation::Bilinear,
            fill: Fill::Zero,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RandomPerspective {
    distortion_scale: f64,
    p: f64,
    interpolation: Interpolation,
    fill: Fill,
}

#[derive(Debug)]
pub struct PerspectiveParams {
    pub forward: Mat3,
}

/// Fit the homography mapping each start corner to its end corner.
fn homography(start: [(f64, f64); 4], end: [(f64, f64); 4]) -> Option<Mat3> {
    let mut a = [[0.0; 8]; 8];
    let mut b = [0.0; 8];
    for (index, (&(x, y), &(u, v))) in start.iter().zip(end.iter()).enumerate() {
        a[index * 2] = [x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y];
        b[index * 2] = u;
        a[index * 2 + 1] = [0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y];
        b[index * 2 + 1] = v;
    }
    let c = solve8(a, b)?;
    Some(Mat3([
        [c[0], c[1], c[2]],
        [c[3], c[4], c[5]],
        [c[6], c[7], 1.0],
    ]))
}

impl ItemWise for RandomPerspective {
    type Params = PerspectiveParams;

    fn resolve(
        &self,
        candidates: &Candidates<'_>,
        rng: &mut StdRng,
    ) -> Result<Option<PerspectiveParams>> {
        if !rng.gen_bool(self.p) {
            return Ok(None);
        }

        let size = candidates.spatial_reference()?;
        let (height, width) = (size.h as f64, size.w as f64);
        let max_x = self.distortion_scale * width / 2.0;
        let max_y = self.distortion_scale * height / 2.0;

        let mut corner = |base_x: f64, base_y: f64, sign_x: f64, sign_y: f64| {
            let dx = rng.gen_range(0.0..=max_x);
            let dy = rng.gen_range(0.0..=max_y);
            (base_x + sign_x * dx, base_y + sign_y * dy)
        };

        let start = [
            (0.0, 0.0),
            (width, 0.0),
            (width, height),
            (0.0, height),
        ];
        let end = [
            corner(0.0, 0.0, 1.0, 1.0),
            corner(width, 0.0, -1.0, 1.0),
            corner(width, height, -1.0, -1.0),
            corner(0.0, height, 1.0, -1.0),
        ];

        // a degenerate draw cannot be fitted; leave the sample untouched
        let forward = match homography(start, end) {
            Some(forward) => forward,
            None => return Ok(None),
        };
        Ok(Some(PerspectiveParams { forward }))
    }

    fn apply_item(&self, item: Item, params: &PerspectiveParams) -> Result<Item> {
        let size = match plane_size(&item) {
            Some(size) => size,
            None => return Ok(item),
        };
        Ok(warp_item(
            item,
            &params.forward,
            size,
            self.interpolation,
            &self.fill,
        ))
    }
}

item_wise_transform!(RandomPerspective);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn homography_maps_corners() {
        let start = [(0.0, 0.0), (8.0, 0.0), (8.0, 8.0), (0.0, 8.0)];
        let end = [(1.0, 1.0), (7.0, 0.5), (7.5, 7.0), (0.5, 7.5)];
        let forward = homography(start, end).unwrap();
        for (&(x, y), &(u, v)) in start.iter().zip(end.iter()) {
            let (fx, fy) = forward.apply(x, y);
            assert_abs_diff_eq!(fx, u, epsilon = 1e-9);
            assert_abs_diff_eq!(fy, v, epsilon = 1e-9);
        }
    }

    #[test]
    fn distortion_scale_is_validated() {
        let init = RandomPerspectiveInit {
            distortion_scale: r64(1.5),
            ..RandomPerspectiveInit::default()
        };
        assert!(matches!(
            init.build(),
            Err(TransformError::InvalidConfiguration(_))
        ));
    }
}

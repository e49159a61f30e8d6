//! Grid-sampling warps shared by the affine, perspective and elastic
//! kernels.
//!
//! Matrices act on pixel coordinates with the origin at the top-left
//! corner and pixel centers at half-integer positions. Image warps take
//! the inverse (output to input) mapping; box warps take the forward
//! mapping and keep the envelope of the transformed corners.

use super::{is_floating, map_nchw, mat3::Mat3};
use crate::{
    common::*,
    fill::{Fill, Interpolation},
};

/// Per-output-pixel input sampling locations in `[-1, 1]` grid-sampler
/// coordinates, shaped `[H_out, W_out, 2]`.
pub fn sampling_grid(
    inverse: &Mat3,
    out_size: PixelSize<i64>,
    in_size: PixelSize<i64>,
) -> Tensor {
    let grids = Tensor::meshgrid(&[
        Tensor::arange(out_size.h, FLOAT_CPU) + 0.5,
        Tensor::arange(out_size.w, FLOAT_CPU) + 0.5,
    ]);
    let (y_out, x_out) = (&grids[0], &grids[1]);

    let m = &inverse.0;
    let x_in = x_out * m[0][0] + y_out * m[0][1] + m[0][2];
    let y_in = x_out * m[1][0] + y_out * m[1][1] + m[1][2];
    let z_in = x_out * m[2][0] + y_out * m[2][1] + m[2][2];

    let gx = (x_in / &z_in) * (2.0 / in_size.w as f64) - 1.0;
    let gy = (y_in / &z_in) * (2.0 / in_size.h as f64) - 1.0;
    Tensor::stack(&[gx, gy], -1)
}

/// Sample the input through a `[H_out, W_out, 2]` grid, blending the
/// uncovered region with the fill color.
pub fn warp_with_grid(
    data: &Tensor,
    grid: &Tensor,
    interpolation: Interpolation,
    fill: &Fill,
) -> Tensor {
    let kind = data.kind();
    let mode = interpolation.grid_sampler_mode();
    let grid_size = grid.size();
    let (out_h, out_w) = (grid_size[0], grid_size[1]);

    map_nchw(data, |planes| {
        let batch = planes.size()[0];
        let channels = planes.size()[1];
        let planes_float = if is_floating(kind) {
            planes.shallow_clone()
        } else {
            planes.to_kind(Kind::Float)
        };
        let batch_grid = grid
            .unsqueeze(0)
            .expand(&[batch, out_h, out_w, 2], true);

        let warped = planes_float.grid_sampler(&batch_grid, mode, 0, false);

        let filled = if matches!(fill, Fill::Zero) {
            warped
        } else {
            let coverage = Tensor::ones(
                &[batch, 1, planes.size()[2], planes.size()[3]],
                FLOAT_CPU,
            )
            .grid_sampler(&batch_grid, mode, 0, false);
            let color = fill.color_tensor(channels);
            &warped * &coverage + color * (coverage * -1.0 + 1.0)
        };

        if is_floating(kind) {
            filled
        } else {
            filled.round().to_kind(kind)
        }
    })
}

/// Warp a tensor through the inverse pixel mapping onto a new canvas.
pub fn warp(
    data: &Tensor,
    inverse: &Mat3,
    out_size: PixelSize<i64>,
    interpolation: Interpolation,
    fill: &Fill,
) -> Tensor {
    let size = data.size();
    let in_size = PixelSize {
        h: size[size.len() - 2],
        w: size[size.len() - 1],
    };
    let grid = sampling_grid(inverse, out_size, in_size);
    warp_with_grid(data, &grid, interpolation, fill)
}

/// Transform each box through the forward pixel mapping and keep the
/// envelope of its four corners. Coordinates are left unclamped for a
/// later explicit sanitization pass.
pub fn warp_boxes(
    boxes: &BoundingBoxes,
    forward: &Mat3,
    out_canvas: PixelSize<i64>,
) -> BoundingBoxes {
    let xyxy = boxes.xyxy_data().to_kind(Kind::Float);
    let values: Vec<f32> = Vec::from(&xyxy);

    let envelopes: Vec<f32> = values
        .chunks(4)
        .flat_map(|chunk| {
            let [x1, y1, x2, y2] = [
                chunk[0] as f64,
                chunk[1] as f64,
                chunk[2] as f64,
                chunk[3] as f64,
            ];
            let corners = [
                forward.apply(x1, y1),
                forward.apply(x2, y1),
                forward.apply(x1, y2),
                forward.apply(x2, y2),
            ];
            let min_x = corners.iter().map(|&(x, _)| x).fold(f64::INFINITY, f64::min);
            let max_x = corners
                .iter()
                .map(|&(x, _)| x)
                .fold(f64::NEG_INFINITY, f64::max);
            let min_y = corners.iter().map(|&(_, y)| y).fold(f64::INFINITY, f64::min);
            let max_y = corners
                .iter()
                .map(|&(_, y)| y)
                .fold(f64::NEG_INFINITY, f64::max);
            [min_x as f32, min_y as f32, max_x as f32, max_y as f32]
        })
        .collect();

    let data = if envelopes.is_empty() {
        Tensor::zeros(&[0, 4], FLOAT_CPU)
    } else {
        Tensor::of_slice(&envelopes).view([-1, 4])
    };
    boxes.with_xyxy_data(data, out_canvas)
}

/// Identity sampling grid plus a displacement field, for elastic warps.
///
/// `displacement` is `[H, W, 2]` in normalized grid units.
pub fn elastic_grid(displacement: &Tensor, size: PixelSize<i64>) -> Tensor {
    let identity = sampling_grid(&Mat3::identity(), size, size);
    identity + displacement
}

/// Approximate elastic warp of box corners by the negated displacement at
/// each corner location.
pub fn elastic_boxes(boxes: &BoundingBoxes, displacement: &Tensor) -> BoundingBoxes {
    let canvas = boxes.canvas();
    let xyxy = boxes.xyxy_data().to_kind(Kind::Float);
    let values: Vec<f32> = Vec::from(&xyxy);
    let disp: Vec<f32> = Vec::from(&displacement.to_kind(Kind::Float));
    let (height, width) = (canvas.h, canvas.w);

    let sample_disp = |x: f64, y: f64| -> (f64, f64) {
        let col = (x as i64).clamp(0, width - 1);
        let row = (y as i64).clamp(0, height - 1);
        let base = ((row * width + col) * 2) as usize;
        let dx = disp[base] as f64 * width as f64 / 2.0;
        let dy = disp[base + 1] as f64 * height as f64 / 2.0;
        (dx, dy)
    };

    let moved: Vec<f32> = values
        .chunks(4)
        .flat_map(|chunk| {
            let corners = [
                (chunk[0] as f64, chunk[1] as f64),
                (chunk[2] as f64, chunk[1] as f64),
                (chunk[0] as f64, chunk[3] as f64),
                (chunk[2] as f64, chunk[3] as f64),
            ];
            let transformed: Vec<(f64, f64)> = corners
                .iter()
                .map(|&(x, y)| {
                    let (dx, dy) = sample_disp(x, y);
                    (x - dx, y - dy)
                })
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
            [min_x as f32, min_y as f32, max_x as f32, max_y as f32]
        })
        .collect();

    let data = if moved.is_empty() {
        Tensor::zeros(&[0, 4], FLOAT_CPU)
    } else {
        Tensor::of_slice(&moved).view([-1, 4])
    };
    boxes.with_xyxy_data(data, canvas)
}

/// Route one item through the matrix warp, by kind.
///
/// Tensor-backed kinds sample through the inverse mapping; boxes transform
/// their corners through the forward mapping; masks resample with nearest
/// interpolation and zero fill.
pub fn warp_item(
    item: Item,
    forward: &Mat3,
    out_size: PixelSize<i64>,
    interpolation: Interpolation,
    fill: &Fill,
) -> Item {
    let inverse = forward.invert().unwrap_or_else(Mat3::identity);
    match item {
        Item::Image(image) => {
            Item::Image(image.map(|data| warp(&data, &inverse, out_size, interpolation, fill)))
        }
        Item::Video(video) => {
            Item::Video(video.map(|data| warp(&data, &inverse, out_size, interpolation, fill)))
        }
        Item::Tensor(data) => Item::Tensor(warp(&data, &inverse, out_size, interpolation, fill)),
        Item::Mask(mask) => Item::Mask(mask.map(|data| {
            warp(
                &data,
                &inverse,
                out_size,
                Interpolation::Nearest,
                &Fill::Zero,
            )
        })),
        Item::BoundingBoxes(boxes) => Item::BoundingBoxes(warp_boxes(&boxes, forward, out_size)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_warp_is_identity() {
        let data = Tensor::of_slice(&[1.0f32, 2.0, 3.0, 4.0]).view([1, 2, 2]);
        let out = warp(
            &data,
            &Mat3::identity(),
            PixelSize { h: 2, w: 2 },
            Interpolation::Nearest,
            &Fill::Zero,
        );
        assert_eq!(out, data);
    }

    #[test]
    fn translate_boxes_by_matrix() {
        let boxes = BoundingBoxes::new(
            Tensor::of_slice(&[1.0f32, 1.0, 3.0, 3.0]),
            BoxFormat::Xyxy,
            PixelSize { h: 8, w: 8 },
        )
        .unwrap();
        let moved = warp_boxes(
            &boxes,
            &Mat3::translation(2.0, -1.0),
            PixelSize { h: 8, w: 8 },
        );
        assert_eq!(
            moved.data(),
            &Tensor::of_slice(&[3.0f32, 0.0, 5.0, 2.0]).view([1, 4])
        );
    }

    #[test]
    fn rotated_box_envelope_grows() {
        let boxes = BoundingBoxes::new(
            Tensor::of_slice(&[2.0f32, 2.0, 6.0, 6.0]),
            BoxFormat::Xyxy,
            PixelSize { h: 8, w: 8 },
        )
        .unwrap();
        let center = Mat3::translation(4.0, 4.0)
            .compose(&Mat3::rotation(std::f64::consts::FRAC_PI_4))
            .compose(&Mat3::translation(-4.0, -4.0));
        let rotated = warp_boxes(&boxes, &center, PixelSize { h: 8, w: 8 });
        let values: Vec<f32> = Vec::from(rotated.data());
        let side = values[2] - values[0];
        assert!(side > 4.0);
    }
}

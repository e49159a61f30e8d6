//! Flip, crop, pad and resize kernels per item kind.

use super::{is_floating, map_nchw};
use crate::{
    common::*,
    fill::{Fill, Interpolation, PadBy, PaddingMode},
};
use ::image::imageops::FilterType;

pub fn hflip(data: &Tensor) -> Tensor {
    data.flip(&[-1])
}

pub fn vflip(data: &Tensor) -> Tensor {
    data.flip(&[-2])
}

pub fn hflip_boxes(boxes: &BoundingBoxes) -> BoundingBoxes {
    let canvas = boxes.canvas();
    let xyxy = boxes.xyxy_data();
    let parts = xyxy.unbind(-1);
    let (x1, y1, x2, y2) = (&parts[0], &parts[1], &parts[2], &parts[3]);
    let width = canvas.w as f64;
    let flipped = Tensor::stack(
        &[
            (x2 * -1.0) + width,
            y1.shallow_clone(),
            (x1 * -1.0) + width,
            y2.shallow_clone(),
        ],
        -1,
    );
    boxes.with_xyxy_data(flipped, canvas)
}

pub fn vflip_boxes(boxes: &BoundingBoxes) -> BoundingBoxes {
    let canvas = boxes.canvas();
    let xyxy = boxes.xyxy_data();
    let parts = xyxy.unbind(-1);
    let (x1, y1, x2, y2) = (&parts[0], &parts[1], &parts[2], &parts[3]);
    let height = canvas.h as f64;
    let flipped = Tensor::stack(
        &[
            x1.shallow_clone(),
            (y2 * -1.0) + height,
            x2.shallow_clone(),
            (y1 * -1.0) + height,
        ],
        -1,
    );
    boxes.with_xyxy_data(flipped, canvas)
}

/// Slice out a `[height, width]` window at `(top, left)`.
///
/// The window must lie within the input; callers pad beforehand when a
/// larger canvas is needed.
pub fn crop(data: &Tensor, top: i64, left: i64, height: i64, width: i64) -> Tensor {
    data.narrow(-2, top, height).narrow(-1, left, width)
}

/// Translate boxes into the crop window and install the new canvas.
///
/// Coordinates are not clamped; out-of-window boxes stay degenerate until
/// an explicit sanitization pass.
pub fn crop_boxes(
    boxes: &BoundingBoxes,
    top: i64,
    left: i64,
    height: i64,
    width: i64,
) -> BoundingBoxes {
    let xyxy = boxes.xyxy_data();
    let offset = Tensor::of_slice(&[left as f32, top as f32, left as f32, top as f32]);
    let shifted = xyxy - offset;
    boxes.with_xyxy_data(
        shifted,
        PixelSize {
            h: height,
            w: width,
        },
    )
}

pub fn pad(data: &Tensor, padding: PadBy, mode: PaddingMode, fill: &Fill) -> Tensor {
    let PadBy {
        left,
        top,
        right,
        bottom,
    } = padding;
    map_nchw(data, |planes| match mode {
        PaddingMode::Constant => match fill.uniform_value() {
            Some(value) if value == 0.0 => planes.zero_pad2d(left, right, top, bottom),
            filling => {
                let kind = planes.kind();
                let float = if is_floating(kind) {
                    planes.shallow_clone()
                } else {
                    planes.to_kind(Kind::Float)
                };
                let padded = match filling {
                    Some(value) => {
                        (float - value).zero_pad2d(left, right, top, bottom) + value
                    }
                    None => {
                        let channels = float.size()[1];
                        let padded = float.zero_pad2d(left, right, top, bottom);
                        let coverage =
                            float.ones_like().zero_pad2d(left, right, top, bottom);
                        let color = fill.color_tensor(channels);
                        &padded * &coverage + color * (coverage * -1.0 + 1.0)
                    }
                };
                if is_floating(kind) {
                    padded
                } else {
                    padded.round().to_kind(kind)
                }
            }
        },
        PaddingMode::Edge => planes.replication_pad2d(&[left, right, top, bottom]),
        PaddingMode::Reflect => planes.reflection_pad2d(&[left, right, top, bottom]),
    })
}

pub fn pad_boxes(boxes: &BoundingBoxes, padding: PadBy) -> BoundingBoxes {
    let canvas = boxes.canvas();
    let xyxy = boxes.xyxy_data();
    let offset = Tensor::of_slice(&[
        padding.left as f32,
        padding.top as f32,
        padding.left as f32,
        padding.top as f32,
    ]);
    boxes.with_xyxy_data(
        xyxy + offset,
        PixelSize {
            h: canvas.h + padding.vertical(),
            w: canvas.w + padding.horizontal(),
        },
    )
}

pub fn resize(data: &Tensor, size: PixelSize<i64>, interpolation: Interpolation) -> Tensor {
    let kind = data.kind();
    map_nchw(data, |planes| {
        let planes = if is_floating(kind) {
            planes.shallow_clone()
        } else {
            planes.to_kind(Kind::Float)
        };
        let resized = match interpolation {
            Interpolation::Bilinear => {
                planes.upsample_bilinear2d(&[size.h, size.w], false, None, None)
            }
            Interpolation::Nearest => planes.upsample_nearest2d(&[size.h, size.w], None, None),
        };
        if is_floating(kind) {
            resized
        } else {
            resized.round().to_kind(kind)
        }
    })
}

pub fn resize_boxes(boxes: &BoundingBoxes, size: PixelSize<i64>) -> BoundingBoxes {
    let canvas = boxes.canvas();
    let scale_x = size.w as f32 / canvas.w as f32;
    let scale_y = size.h as f32 / canvas.h as f32;
    let scale = Tensor::of_slice(&[scale_x, scale_y, scale_x, scale_y]);
    boxes.with_xyxy_data(boxes.xyxy_data() * scale, size)
}

pub fn resize_dyn_image(
    image: &DynamicImage,
    size: PixelSize<i64>,
    interpolation: Interpolation,
) -> DynamicImage {
    let filter = match interpolation {
        Interpolation::Nearest => FilterType::Nearest,
        Interpolation::Bilinear => FilterType::Triangle,
    };
    image.resize_exact(size.w as u32, size.h as u32, filter)
}

pub fn crop_dyn_image(
    image: &DynamicImage,
    top: i64,
    left: i64,
    height: i64,
    width: i64,
) -> DynamicImage {
    image.crop_imm(left as u32, top as u32, width as u32, height as u32)
}

//! Color, blur and erase kernels.
//!
//! Float image data is assumed to live in `[0, 1]`; integral inputs are
//! promoted and scaled back where an operation requires it.

use super::{is_floating, map_nchw};
use crate::common::*;

const HSV_EPSILON: f64 = 1e-4;

/// Convert `[..., 3, H, W]` RGB planes to HSV with all channels in `[0, 1]`.
pub fn rgb_to_hsv(rgb: &Tensor) -> Tensor {
    let channels = rgb.unbind(-3);
    let (red, green, blue) = (&channels[0], &channels[1], &channels[2]);

    let max = red.maximum(green).maximum(blue);
    let min = red.minimum(green).minimum(blue);
    let diff = &max - &min;
    let diff_mask = diff.gt(HSV_EPSILON).to_kind(Kind::Float);
    let diff_safe = diff.clamp_min(HSV_EPSILON);

    let value = max.shallow_clone();
    let saturation =
        (&diff / value.clamp_min(HSV_EPSILON)) * value.gt(HSV_EPSILON).to_kind(Kind::Float);

    let red_is_max = red.ge_tensor(&max).to_kind(Kind::Float);
    let green_is_max = green.ge_tensor(&max).to_kind(Kind::Float) * (&red_is_max * -1.0 + 1.0);
    let blue_is_max = (&red_is_max + &green_is_max) * -1.0 + 1.0;

    let hue_red = (green - blue) / &diff_safe;
    let hue_green = (blue - red) / &diff_safe + 2.0;
    let hue_blue = (red - green) / &diff_safe + 4.0;

    let hue = (red_is_max * hue_red + green_is_max * hue_green + blue_is_max * hue_blue)
        * diff_mask;
    let hue = &hue + hue.lt(0.0).to_kind(Kind::Float) * 6.0;
    let hue = hue / 6.0;

    Tensor::stack(&[hue, saturation, value], -3)
}

/// Inverse of [`rgb_to_hsv`].
pub fn hsv_to_rgb(hsv: &Tensor) -> Tensor {
    let channels = hsv.unbind(-3);
    let (hue, saturation, value) = (&channels[0], &channels[1], &channels[2]);

    let component = |n: f64| {
        let k = (hue * 6.0 + n).fmod(6.0);
        let ramp = k
            .minimum(&(&k * -1.0 + 4.0))
            .clamp(0.0, 1.0);
        value - value * saturation * ramp
    };

    let red = component(5.0);
    let green = component(3.0);
    let blue = component(1.0);
    Tensor::stack(&[red, green, blue], -3)
}

/// `a * ratio + b * (1 - ratio)`, clamped to the unit interval.
pub fn blend(a: &Tensor, b: &Tensor, ratio: f64) -> Tensor {
    (a * ratio + b * (1.0 - ratio)).clamp(0.0, 1.0)
}

/// Luminance-weighted grayscale plane, keeping the channel dim of size 1.
pub fn grayscale(data: &Tensor) -> Tensor {
    let channels = data.unbind(-3);
    let gray = match channels.as_slice() {
        [gray] => gray.shallow_clone(),
        [red, green, blue] => red * 0.2989 + green * 0.587 + blue * 0.114,
        _ => data.mean_dim(&[-3], false, Kind::Float),
    };
    gray.unsqueeze(-3)
}

pub fn adjust_brightness(data: &Tensor, factor: f64) -> Tensor {
    blend(data, &data.zeros_like(), factor)
}

pub fn adjust_contrast(data: &Tensor, factor: f64) -> Tensor {
    let mean = grayscale(data).mean(Kind::Float);
    blend(data, &mean.expand(&data.size(), true), factor)
}

pub fn adjust_saturation(data: &Tensor, factor: f64) -> Tensor {
    let gray = grayscale(data).expand(&data.size(), true);
    blend(data, &gray, factor)
}

/// Shift the hue channel by `shift` in `[-0.5, 0.5]` turns.
pub fn adjust_hue(data: &Tensor, shift: f64) -> Tensor {
    if data.size()[data.dim() as usize - 3] != 3 {
        return data.shallow_clone();
    }
    let hsv = rgb_to_hsv(data);
    let channels = hsv.unbind(-3);
    let hue = (&channels[0] + shift + 1.0).fmod(1.0);
    hsv_to_rgb(&Tensor::stack(
        &[hue, channels[1].shallow_clone(), channels[2].shallow_clone()],
        -3,
    ))
}

/// Separable gaussian blur with an odd `[kh, kw]` kernel.
pub fn gaussian_blur(data: &Tensor, kernel_size: [i64; 2], sigma: [f64; 2]) -> Tensor {
    let [kernel_h, kernel_w] = kernel_size;
    let kind = data.kind();

    let kernel_1d = |size: i64, sigma: f64| {
        let half = (size / 2) as f64;
        let positions = Tensor::arange(size, FLOAT_CPU) - half;
        let kernel = ((&positions * &positions) * (-0.5 / (sigma * sigma))).exp();
        &kernel / kernel.sum(Kind::Float)
    };

    let kernel = kernel_1d(kernel_h, sigma[0])
        .view([-1, 1])
        .matmul(&kernel_1d(kernel_w, sigma[1]).view([1, -1]));

    map_nchw(data, |planes| {
        let channels = planes.size()[1];
        let weight = kernel
            .view([1, 1, kernel_h, kernel_w])
            .expand(&[channels, 1, kernel_h, kernel_w], true);
        let planes_float = if is_floating(kind) {
            planes.shallow_clone()
        } else {
            planes.to_kind(Kind::Float)
        };
        let blurred = planes_float.conv2d(
            &weight,
            None::<&Tensor>,
            &[1, 1],
            &[kernel_h / 2, kernel_w / 2],
            &[1, 1],
            channels,
        );
        if is_floating(kind) {
            blurred
        } else {
            blurred.round().to_kind(kind)
        }
    })
}

/// Overwrite a `[height, width]` window with the given value, leaving the
/// input storage untouched.
pub fn erase(
    data: &Tensor,
    top: i64,
    left: i64,
    height: i64,
    width: i64,
    value: &Tensor,
) -> Tensor {
    let out = data.copy();
    let mut window = out.narrow(-2, top, height).narrow(-1, left, width);
    window.copy_(value);
    out
}

/// Keep the upper `bits` bits of each channel value.
pub fn posterize(data: &Tensor, bits: i64) -> Tensor {
    let levels = (1i64 << bits) as f64;
    if is_floating(data.kind()) {
        (data * levels).floor() / levels
    } else {
        let mask = 255 - ((1i64 << (8 - bits)) - 1);
        data.bitwise_and(mask)
    }
}

/// Invert every channel value above the threshold.
pub fn solarize(data: &Tensor, threshold: f64) -> Tensor {
    let bound = if is_floating(data.kind()) { 1.0 } else { 255.0 };
    let above = data.ge(threshold).to_kind(Kind::Float);
    let inverted = (data * -1.0) + bound;
    let data_float = data.to_kind(Kind::Float);
    let out = &data_float * (&above * -1.0 + 1.0) + inverted.to_kind(Kind::Float) * above;
    out.to_kind(data.kind())
}

pub fn invert(data: &Tensor) -> Tensor {
    let bound = if is_floating(data.kind()) { 1.0 } else { 255.0 };
    (data * -1.0) + bound
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn hsv_roundtrip() {
        let rgb = Tensor::of_slice(&[0.2f32, 0.8, 0.4, 0.9, 0.1, 0.6]).view([3, 1, 2]);
        let back = hsv_to_rgb(&rgb_to_hsv(&rgb));
        let diff = f64::from((&back - &rgb).abs().max());
        assert_abs_diff_eq!(diff, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn brightness_zero_blacks_out() {
        let data = Tensor::ones(&[3, 2, 2], FLOAT_CPU);
        let out = adjust_brightness(&data, 0.0);
        assert_eq!(f64::from(out.sum(Kind::Float)), 0.0);
    }

    #[test]
    fn erase_leaves_input_unchanged() {
        let data = Tensor::ones(&[1, 4, 4], FLOAT_CPU);
        let value = Tensor::zeros(&[1, 2, 2], FLOAT_CPU);
        let out = erase(&data, 1, 1, 2, 2, &value);
        assert_eq!(f64::from(data.sum(Kind::Float)), 16.0);
        assert_eq!(f64::from(out.sum(Kind::Float)), 12.0);
    }

    #[test]
    fn blur_preserves_mass_of_uniform_input() {
        let data = Tensor::ones(&[1, 5, 5], FLOAT_CPU);
        let out = gaussian_blur(&data, [3, 3], [1.0, 1.0]);
        let center = out.double_value(&[0, 2, 2]);
        assert_abs_diff_eq!(center, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn solarize_inverts_above_threshold() {
        let data = Tensor::of_slice(&[0.2f32, 0.9]).view([1, 1, 2]);
        let out = solarize(&data, 0.5);
        assert_abs_diff_eq!(out.double_value(&[0, 0, 0]), 0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(out.double_value(&[0, 0, 1]), 0.1, epsilon = 1e-5);
    }
}

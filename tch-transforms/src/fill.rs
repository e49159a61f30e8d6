//! Strongly-typed normalization of loosely-shaped transform arguments.
//!
//! Fill values, padding amounts and interpolation choices arrive from
//! callers in several shapes; they are normalized here at construction
//! time so the kernels only ever see one representation.

use crate::common::*;

/// Fill specification for padded or uncovered output regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Fill {
    /// Fill every channel with zero.
    Zero,
    /// Fill every channel with one value.
    Uniform(f64),
    /// One fill value per channel.
    PerChannel(Vec<f64>),
}

impl Fill {
    pub(crate) fn validate(&self) -> Result<()> {
        if let Fill::PerChannel(values) = self {
            ensure_config!(
                !values.is_empty(),
                "per-channel fill must name at least one channel value"
            );
        }
        Ok(())
    }

    /// The uniform fill value, when one exists.
    pub(crate) fn uniform_value(&self) -> Option<f64> {
        match self {
            Fill::Zero => Some(0.0),
            Fill::Uniform(value) => Some(*value),
            Fill::PerChannel(values) if values.len() == 1 => Some(values[0]),
            Fill::PerChannel(_) => None,
        }
    }

    /// The fill color as a `[C, 1, 1]` tensor broadcastable over `[C, H, W]`.
    pub(crate) fn color_tensor(&self, channels: i64) -> Tensor {
        match self {
            Fill::Zero => Tensor::zeros(&[channels, 1, 1], FLOAT_CPU),
            Fill::Uniform(value) => {
                Tensor::zeros(&[channels, 1, 1], FLOAT_CPU) + *value
            }
            Fill::PerChannel(values) => {
                let values: Vec<f32> = values.iter().map(|&value| value as f32).collect();
                Tensor::of_slice(&values).view([-1, 1, 1])
            }
        }
    }
}

impl Default for Fill {
    fn default() -> Self {
        Fill::Zero
    }
}

/// Per-side padding in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadBy {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl PadBy {
    pub fn uniform(pad: i64) -> Self {
        Self {
            left: pad,
            top: pad,
            right: pad,
            bottom: pad,
        }
    }

    /// Normalize the 1/2/4-element argument shapes.
    ///
    /// One value pads all sides, two values pad (horizontal, vertical),
    /// four values pad (left, top, right, bottom).
    pub fn from_arity(padding: &[i64]) -> Result<Self> {
        let padding = match *padding {
            [all] => Self::uniform(all),
            [horizontal, vertical] => Self {
                left: horizontal,
                top: vertical,
                right: horizontal,
                bottom: vertical,
            },
            [left, top, right, bottom] => Self {
                left,
                top,
                right,
                bottom,
            },
            _ => {
                return Err(TransformError::invalid_configuration(format!(
                    "padding must have 1, 2 or 4 elements, but get {}",
                    padding.len()
                )))
            }
        };
        Ok(padding)
    }

    pub fn horizontal(&self) -> i64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> i64 {
        self.top + self.bottom
    }
}

/// How padded pixels are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaddingMode {
    Constant,
    Edge,
    Reflect,
}

/// Interpolation used by resampling kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpolation {
    Nearest,
    Bilinear,
}

impl Interpolation {
    /// Mode index understood by `grid_sampler`.
    pub(crate) fn grid_sampler_mode(self) -> i64 {
        match self {
            Interpolation::Bilinear => 0,
            Interpolation::Nearest => 1,
        }
    }
}

use crate::{common::*, size::PixelSize};

/// Segmentation or detection mask in `[H, W]` or `[N, H, W]` layout.
///
/// A `[N, H, W]` mask carries one binary plane per object and is co-indexed
/// with bounding boxes and labels of the same sample.
#[derive(Debug, TensorLike)]
pub struct Mask {
    pub(crate) data: Tensor,
}

impl Mask {
    pub fn new(data: Tensor) -> Result<Self> {
        ensure!(
            data.dim() >= 2,
            "mask tensor must have at least 2 dimensions, but get {}",
            data.dim()
        );
        Ok(Self { data })
    }

    pub fn from_unchecked(data: Tensor) -> Self {
        debug_assert!(data.dim() >= 2);
        Self { data }
    }

    pub fn data(&self) -> &Tensor {
        &self.data
    }

    pub fn into_data(self) -> Tensor {
        self.data
    }

    /// Number of per-object planes, or `None` for a plain `[H, W]` mask.
    pub fn num_objects(&self) -> Option<i64> {
        let size = self.data.size();
        (size.len() >= 3).then(|| size[size.len() - 3])
    }

    pub fn spatial_size(&self) -> PixelSize<i64> {
        let size = self.data.size();
        PixelSize {
            h: size[size.len() - 2],
            w: size[size.len() - 1],
        }
    }

    pub fn map<F>(self, f: F) -> Self
    where
        F: FnOnce(Tensor) -> Tensor,
    {
        Self::from_unchecked(f(self.data))
    }

    pub fn shallow_clone(&self) -> Self {
        Self {
            data: self.data.shallow_clone(),
        }
    }
}

impl PartialEq for Mask {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

use crate::{common::*, size::PixelSize};

/// Checked image tensor in `[..., C, H, W]` layout.
#[derive(Debug, TensorLike)]
pub struct Image {
    pub(crate) data: Tensor,
}

impl Image {
    pub fn new(data: Tensor) -> Result<Self> {
        ensure!(
            data.dim() >= 3,
            "image tensor must have at least 3 dimensions, but get {}",
            data.dim()
        );
        Ok(Self { data })
    }

    /// Wrap a tensor that is known to respect the `[..., C, H, W]` layout.
    pub fn from_unchecked(data: Tensor) -> Self {
        debug_assert!(data.dim() >= 3);
        Self { data }
    }

    pub fn data(&self) -> &Tensor {
        &self.data
    }

    pub fn into_data(self) -> Tensor {
        self.data
    }

    pub fn channels(&self) -> i64 {
        let size = self.data.size();
        size[size.len() - 3]
    }

    pub fn spatial_size(&self) -> PixelSize<i64> {
        let size = self.data.size();
        PixelSize {
            h: size[size.len() - 2],
            w: size[size.len() - 1],
        }
    }

    /// Apply a shape-contract preserving tensor op to the pixel data.
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

impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

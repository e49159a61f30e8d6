use crate::{common::*, size::PixelSize};

/// Checked video tensor in `[..., T, C, H, W]` layout.
#[derive(Debug, TensorLike)]
pub struct Video {
    pub(crate) data: Tensor,
}

impl Video {
    pub fn new(data: Tensor) -> Result<Self> {
        ensure!(
            data.dim() >= 4,
            "video tensor must have at least 4 dimensions, but get {}",
            data.dim()
        );
        Ok(Self { data })
    }

    pub fn from_unchecked(data: Tensor) -> Self {
        debug_assert!(data.dim() >= 4);
        Self { data }
    }

    pub fn data(&self) -> &Tensor {
        &self.data
    }

    pub fn into_data(self) -> Tensor {
        self.data
    }

    pub fn num_frames(&self) -> i64 {
        let size = self.data.size();
        size[size.len() - 4]
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

impl PartialEq for Video {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

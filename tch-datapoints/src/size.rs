use crate::common::*;

/// Spatial size in (height, width) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelSize<T> {
    pub h: T,
    pub w: T,
}

impl<T> PixelSize<T> {
    pub fn from_hw(h: T, w: T) -> Result<Self>
    where
        T: Num + PartialOrd,
    {
        let zero = T::zero();
        ensure!(
            h >= zero && w >= zero,
            "the height and width must be non-negative"
        );
        Ok(Self { h, w })
    }

    pub fn hw(&self) -> [T; 2]
    where
        T: Copy,
    {
        [self.h, self.w]
    }

    pub fn cast<S>(&self) -> Option<PixelSize<S>>
    where
        T: Copy + ToPrimitive,
        S: NumCast,
    {
        Some(PixelSize {
            h: S::from(self.h)?,
            w: S::from(self.w)?,
        })
    }

    pub fn area(&self) -> T
    where
        T: Num + Copy,
    {
        self.h * self.w
    }
}

impl<T> fmt::Display for PixelSize<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.h, self.w)
    }
}

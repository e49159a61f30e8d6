use crate::{common::*, size::PixelSize};
use getset::CopyGetters;

/// Box coordinate layouts.
///
/// - `Xyxy`: corner pair `[x1, y1, x2, y2]`
/// - `Xywh`: top-left corner plus extent `[x, y, w, h]`
/// - `Cxcywh`: center plus extent `[cx, cy, w, h]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoxFormat {
    Xyxy,
    Xywh,
    Cxcywh,
}

/// Batched bounding boxes in `[N, 4]` layout with a canvas size.
///
/// Degenerate boxes (zero or negative extent, inverted corners) are legal
/// values. Format conversions are invertible; converting an integral tensor
/// through `Cxcywh` promotes the data to `Kind::Float` so the half-extent
/// arithmetic stays exact.
#[derive(Debug, TensorLike, CopyGetters)]
pub struct BoundingBoxes {
    pub(crate) data: Tensor,
    #[tensor_like(copy)]
    #[get_copy = "pub"]
    pub(crate) format: BoxFormat,
    #[tensor_like(copy)]
    #[get_copy = "pub"]
    pub(crate) canvas: PixelSize<i64>,
}

impl BoundingBoxes {
    pub fn new(data: Tensor, format: BoxFormat, canvas: PixelSize<i64>) -> Result<Self> {
        let data = match data.size().as_slice() {
            &[4] => data.view([1, 4]),
            &[_, 4] => data,
            size => bail!("box tensor must have shape [4] or [N, 4], but get {:?}", size),
        };
        Ok(Self {
            data,
            format,
            canvas,
        })
    }

    /// Wrap parts that are known to respect the `[N, 4]` layout.
    pub fn from_parts(data: Tensor, format: BoxFormat, canvas: PixelSize<i64>) -> Self {
        debug_assert!(matches!(data.size().as_slice(), &[_, 4]));
        Self {
            data,
            format,
            canvas,
        }
    }

    pub fn data(&self) -> &Tensor {
        &self.data
    }

    pub fn into_data(self) -> Tensor {
        self.data
    }

    pub fn num_boxes(&self) -> i64 {
        self.data.size()[0]
    }

    pub fn spatial_size(&self) -> PixelSize<i64> {
        self.canvas
    }

    /// Convert the coordinate layout, keeping the canvas.
    pub fn convert_to(self, format: BoxFormat) -> Self {
        if self.format == format {
            return self;
        }
        let xyxy = to_xyxy(&self.data, self.format);
        let data = from_xyxy(&xyxy, format);
        Self {
            data,
            format,
            canvas: self.canvas,
        }
    }

    /// The box coordinates as an `[N, 4]` tensor in `Xyxy` layout.
    pub fn xyxy_data(&self) -> Tensor {
        to_xyxy(&self.data, self.format)
    }

    /// Replace the coordinates with an `[N, 4]` `Xyxy` tensor, converting
    /// back to the original layout and installing a new canvas.
    pub fn with_xyxy_data(&self, xyxy: Tensor, canvas: PixelSize<i64>) -> Self {
        debug_assert!(matches!(xyxy.size().as_slice(), &[_, 4]));
        Self {
            data: from_xyxy(&xyxy, self.format),
            format: self.format,
            canvas,
        }
    }

    /// Select a subset of boxes by index, keeping format and canvas.
    pub fn index_select(&self, indexes: &Tensor) -> Self {
        Self {
            data: self.data.index_select(0, indexes),
            format: self.format,
            canvas: self.canvas,
        }
    }

    pub fn map<F>(self, f: F) -> Self
    where
        F: FnOnce(Tensor) -> Tensor,
    {
        Self {
            data: f(self.data),
            format: self.format,
            canvas: self.canvas,
        }
    }

    pub fn shallow_clone(&self) -> Self {
        Self {
            data: self.data.shallow_clone(),
            format: self.format,
            canvas: self.canvas,
        }
    }
}

impl PartialEq for BoundingBoxes {
    fn eq(&self, other: &Self) -> bool {
        self.format == other.format && self.canvas == other.canvas && self.data == other.data
    }
}

fn to_xyxy(data: &Tensor, format: BoxFormat) -> Tensor {
    let parts = data.unbind(-1);
    let (a, b, c, d) = (&parts[0], &parts[1], &parts[2], &parts[3]);
    match format {
        BoxFormat::Xyxy => data.shallow_clone(),
        BoxFormat::Xywh => Tensor::stack(&[a.shallow_clone(), b.shallow_clone(), a + c, b + d], -1),
        BoxFormat::Cxcywh => {
            let (cx, cy, w, h) = promote_halves(a, b, c, d);
            let half_w = &w * 0.5;
            let half_h = &h * 0.5;
            Tensor::stack(&[&cx - &half_w, &cy - &half_h, &cx + &half_w, &cy + &half_h], -1)
        }
    }
}

fn from_xyxy(xyxy: &Tensor, format: BoxFormat) -> Tensor {
    let parts = xyxy.unbind(-1);
    let (x1, y1, x2, y2) = (&parts[0], &parts[1], &parts[2], &parts[3]);
    match format {
        BoxFormat::Xyxy => xyxy.shallow_clone(),
        BoxFormat::Xywh => Tensor::stack(
            &[x1.shallow_clone(), y1.shallow_clone(), x2 - x1, y2 - y1],
            -1,
        ),
        BoxFormat::Cxcywh => {
            let (x1, y1, x2, y2) = promote_halves(x1, y1, x2, y2);
            Tensor::stack(
                &[(&x1 + &x2) * 0.5, (&y1 + &y2) * 0.5, &x2 - &x1, &y2 - &y1],
                -1,
            )
        }
    }
}

fn promote_halves(a: &Tensor, b: &Tensor, c: &Tensor, d: &Tensor) -> (Tensor, Tensor, Tensor, Tensor) {
    let is_floating = matches!(
        a.kind(),
        Kind::Half | Kind::BFloat16 | Kind::Float | Kind::Double
    );
    if is_floating {
        (
            a.shallow_clone(),
            b.shallow_clone(),
            c.shallow_clone(),
            d.shallow_clone(),
        )
    } else {
        (
            a.to_kind(Kind::Float),
            b.to_kind(Kind::Float),
            c.to_kind(Kind::Float),
            d.to_kind(Kind::Float),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxes(values: &[f32], format: BoxFormat) -> BoundingBoxes {
        let count = values.len() as i64 / 4;
        BoundingBoxes::new(
            Tensor::of_slice(values).view([count, 4]),
            format,
            PixelSize { h: 10, w: 10 },
        )
        .unwrap()
    }

    #[test]
    fn xyxy_to_xywh_roundtrip() {
        let orig = boxes(&[1.0, 2.0, 5.0, 8.0], BoxFormat::Xyxy);
        let converted = orig.shallow_clone().convert_to(BoxFormat::Xywh);
        assert_eq!(
            converted.data(),
            &Tensor::of_slice(&[1.0f32, 2.0, 4.0, 6.0]).view([1, 4])
        );
        let back = converted.convert_to(BoxFormat::Xyxy);
        assert_eq!(back, orig);
    }

    #[test]
    fn xyxy_to_cxcywh_roundtrip() {
        let orig = boxes(&[1.0, 2.0, 5.0, 8.0], BoxFormat::Xyxy);
        let converted = orig.shallow_clone().convert_to(BoxFormat::Cxcywh);
        assert_eq!(
            converted.data(),
            &Tensor::of_slice(&[3.0f32, 5.0, 4.0, 6.0]).view([1, 4])
        );
        let back = converted.convert_to(BoxFormat::Xyxy);
        assert_eq!(back, orig);
    }

    #[test]
    fn degenerate_boxes_are_legal() {
        // zero extent and inverted corners construct without error
        let degenerate = boxes(&[3.0, 3.0, 3.0, 3.0, 5.0, 5.0, 1.0, 1.0], BoxFormat::Xyxy);
        assert_eq!(degenerate.num_boxes(), 2);
    }

    #[test]
    fn single_box_is_promoted() {
        let single = BoundingBoxes::new(
            Tensor::of_slice(&[0.0f32, 0.0, 5.0, 5.0]),
            BoxFormat::Xyxy,
            PixelSize { h: 10, w: 10 },
        )
        .unwrap();
        assert_eq!(single.data().size(), &[1, 4]);
    }
}

//! Deterministic representation converters.

use crate::{
    common::*,
    transform::{item_wise_transform, Candidates, ItemWise},
};
use ::image::{DynamicImage as DynImageData, RgbImage};

/// Convert every bounding box entry to the given coordinate layout.
#[derive(Debug, Clone)]
pub struct ConvertBoundingBoxFormat {
    format: BoxFormat,
}

impl ConvertBoundingBoxFormat {
    pub fn new(format: BoxFormat) -> Self {
        Self { format }
    }
}

impl ItemWise for ConvertBoundingBoxFormat {
    type Params = ();

    fn kinds(&self) -> KindSet {
        KindSet::of(&[ItemKind::BoundingBoxes])
    }

    fn resolve(&self, _candidates: &Candidates<'_>, _rng: &mut StdRng) -> Result<Option<()>> {
        Ok(Some(()))
    }

    fn apply_item(&self, item: Item, _params: &()) -> Result<Item> {
        Ok(match item {
            Item::BoundingBoxes(boxes) => Item::BoundingBoxes(boxes.convert_to(self.format)),
            other => other,
        })
    }
}

/// Convert image-like tensors to a target kind, rescaling the value range
/// between `Uint8` and floating kinds.
#[derive(Debug, Clone)]
pub struct ConvertDtype {
    kind: Kind,
}

impl ConvertDtype {
    pub fn new(kind: Kind) -> Result<Self> {
        ensure_config!(
            matches!(
                kind,
                Kind::Uint8 | Kind::Half | Kind::Float | Kind::Double
            ),
            "unsupported target kind {:?}",
            kind
        );
        Ok(Self { kind })
    }

    fn convert(&self, data: &Tensor) -> Tensor {
        let from = data.kind();
        match (from, self.kind) {
            (Kind::Uint8, Kind::Half | Kind::Float | Kind::Double) => {
                data.to_kind(self.kind) / 255.0
            }
            (Kind::Half | Kind::Float | Kind::Double, Kind::Uint8) => {
                (data.to_kind(Kind::Float) * 255.0)
                    .round()
                    .clamp(0.0, 255.0)
                    .to_kind(Kind::Uint8)
            }
            _ => data.to_kind(self.kind),
        }
    }
}

impl ItemWise for ConvertDtype {
    type Params = ();

    fn kinds(&self) -> KindSet {
        KindSet::of(&[ItemKind::Image, ItemKind::Video, ItemKind::Tensor])
    }

    fn resolve(&self, _candidates: &Candidates<'_>, _rng: &mut StdRng) -> Result<Option<()>> {
        Ok(Some(()))
    }

    fn apply_item(&self, item: Item, _params: &()) -> Result<Item> {
        Ok(match item {
            Item::Image(image) => Item::Image(image.map(|data| self.convert(&data))),
            Item::Video(video) => Item::Video(video.map(|data| self.convert(&data))),
            Item::Tensor(data) => Item::Tensor(self.convert(&data)),
            other => other,
        })
    }
}

/// Permute the dimensions of plain tensors.
///
/// Tagged spatial items are left untouched because reordering their dims
/// would break the layout their metadata describes; their presence is
/// reported once per sample as a warning.
#[derive(Debug, Clone)]
pub struct PermuteDimensions {
    dims: Vec<i64>,
}

impl PermuteDimensions {
    pub fn new(dims: Vec<i64>) -> Result<Self> {
        ensure_config!(!dims.is_empty(), "dims must not be empty");
        Ok(Self { dims })
    }
}

fn warn_on_tagged(items: &[Item], name: &str) {
    let tagged = items
        .iter()
        .any(|item| matches!(item.kind(), ItemKind::Image | ItemKind::Video));
    if tagged {
        warn!(
            "{} only operates on plain tensors; tagged images and videos pass through unchanged",
            name
        );
    }
}

impl ItemWise for PermuteDimensions {
    type Params = ();

    fn kinds(&self) -> KindSet {
        KindSet::of(&[ItemKind::Tensor])
    }

    fn check(&self, items: &[Item]) -> Result<()> {
        warn_on_tagged(items, "permute-dimensions");
        Ok(())
    }

    fn resolve(&self, _candidates: &Candidates<'_>, _rng: &mut StdRng) -> Result<Option<()>> {
        Ok(Some(()))
    }

    fn apply_item(&self, item: Item, _params: &()) -> Result<Item> {
        Ok(match item {
            Item::Tensor(data) => {
                if data.dim() != self.dims.len() {
                    return Err(TransformError::invalid_configuration(format!(
                        "permutation of arity {} does not fit a {}-dimensional tensor",
                        self.dims.len(),
                        data.dim()
                    )));
                }
                Item::Tensor(data.permute(&self.dims))
            }
            other => other,
        })
    }
}

/// Swap two dimensions of plain tensors.
#[derive(Debug, Clone)]
pub struct TransposeDimensions {
    dim0: i64,
    dim1: i64,
}

impl TransposeDimensions {
    pub fn new(dim0: i64, dim1: i64) -> Self {
        Self { dim0, dim1 }
    }
}

impl ItemWise for TransposeDimensions {
    type Params = ();

    fn kinds(&self) -> KindSet {
        KindSet::of(&[ItemKind::Tensor])
    }

    fn check(&self, items: &[Item]) -> Result<()> {
        warn_on_tagged(items, "transpose-dimensions");
        Ok(())
    }

    fn resolve(&self, _candidates: &Candidates<'_>, _rng: &mut StdRng) -> Result<Option<()>> {
        Ok(Some(()))
    }

    fn apply_item(&self, item: Item, _params: &()) -> Result<Item> {
        Ok(match item {
            Item::Tensor(data) => Item::Tensor(data.transpose(self.dim0, self.dim1)),
            other => other,
        })
    }
}

/// Expand categorical labels into one-hot labels.
#[derive(Debug, Clone)]
pub struct LabelToOneHot {
    /// `None` infers the category count from the data or category list.
    num_categories: Option<i64>,
}

impl LabelToOneHot {
    pub fn new(num_categories: Option<i64>) -> Result<Self> {
        if let Some(num_categories) = num_categories {
            ensure_config!(
                num_categories > 0,
                "num_categories must be positive, but get {}",
                num_categories
            );
        }
        Ok(Self { num_categories })
    }
}

impl ItemWise for LabelToOneHot {
    type Params = ();

    fn kinds(&self) -> KindSet {
        KindSet::of(&[ItemKind::Label])
    }

    fn resolve(&self, _candidates: &Candidates<'_>, _rng: &mut StdRng) -> Result<Option<()>> {
        Ok(Some(()))
    }

    fn apply_item(&self, item: Item, _params: &()) -> Result<Item> {
        Ok(match item {
            Item::Label(label) => {
                let num_categories = self
                    .num_categories
                    .or_else(|| label.categories().map(|categories| categories.len() as i64))
                    .unwrap_or(-1);
                let categories = label.categories().map(<[String]>::to_vec);
                let data = label.into_data().to_kind(Kind::Int64).one_hot(num_categories);
                Item::OneHotLabel(OneHotLabel::new(data, categories).map_err(|err| {
                    TransformError::structure_mismatch(err.to_string())
                })?)
            }
            other => other,
        })
    }
}

/// Bring decoded rasters and plain tensors into the tagged image world.
#[derive(Debug, Clone, Default)]
pub struct ToImageTensor;

impl ItemWise for ToImageTensor {
    type Params = ();

    fn kinds(&self) -> KindSet {
        KindSet::of(&[ItemKind::DynImage, ItemKind::Tensor])
    }

    fn resolve(&self, _candidates: &Candidates<'_>, _rng: &mut StdRng) -> Result<Option<()>> {
        Ok(Some(()))
    }

    fn apply_item(&self, item: Item, _params: &()) -> Result<Item> {
        Ok(match item {
            Item::DynImage(image) => {
                let rgb = image.to_rgb8();
                let (width, height) = rgb.dimensions();
                let data = Tensor::of_slice(rgb.as_raw())
                    .view([height as i64, width as i64, 3])
                    .permute(&[2, 0, 1]);
                Item::Image(Image::from_unchecked(data))
            }
            Item::Tensor(data) => {
                let image = Image::new(data).map_err(|err| {
                    TransformError::unsupported_item_kind(err.to_string())
                })?;
                Item::Image(image)
            }
            other => other,
        })
    }
}

/// Convert `[3, H, W]` images back into decoded rasters.
#[derive(Debug, Clone, Default)]
pub struct ToDynImage;

impl ToDynImage {
    fn to_raster(data: &Tensor) -> Result<DynImageData> {
        let size = data.size();
        if size.len() != 3 || size[0] != 3 {
            return Err(TransformError::unsupported_item_kind(format!(
                "expect a [3, H, W] tensor to build a raster, but get {:?}",
                size
            )));
        }
        let (height, width) = (size[1], size[2]);

        let bytes = if data.kind() == Kind::Uint8 {
            data.shallow_clone()
        } else {
            (data.to_kind(Kind::Float) * 255.0).round().clamp(0.0, 255.0).to_kind(Kind::Uint8)
        };
        let raw: Vec<u8> = Vec::from(&bytes.permute(&[1, 2, 0]).contiguous());

        let buffer = RgbImage::from_raw(width as u32, height as u32, raw).ok_or_else(|| {
            TransformError::structure_mismatch("raster buffer size disagrees with the tensor shape")
        })?;
        Ok(DynImageData::ImageRgb8(buffer))
    }
}

impl ItemWise for ToDynImage {
    type Params = ();

    fn kinds(&self) -> KindSet {
        KindSet::of(&[ItemKind::Image, ItemKind::Tensor])
    }

    fn resolve(&self, _candidates: &Candidates<'_>, _rng: &mut StdRng) -> Result<Option<()>> {
        Ok(Some(()))
    }

    fn apply_item(&self, item: Item, _params: &()) -> Result<Item> {
        Ok(match item {
            Item::Image(image) => Item::DynImage(Self::to_raster(image.data())?),
            Item::Tensor(data) => Item::DynImage(Self::to_raster(&data)?),
            other => other,
        })
    }
}

item_wise_transform!(
    ConvertBoundingBoxFormat,
    ConvertDtype,
    PermuteDimensions,
    TransposeDimensions,
    LabelToOneHot,
    ToImageTensor,
    ToDynImage,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dtype_conversion_scales_uint8() {
        let transform = ConvertDtype::new(Kind::Float).unwrap();
        let data = Tensor::of_slice(&[0u8, 255]).view([1, 1, 2]);
        let converted = transform.convert(&data);
        assert_eq!(converted.kind(), Kind::Float);
        assert_eq!(converted.double_value(&[0, 0, 1]), 1.0);
    }

    #[test]
    fn label_to_one_hot_uses_category_count() {
        let transform = LabelToOneHot::new(None).unwrap();
        let label = Label::new(
            Tensor::of_slice(&[0i64, 2]),
            Some(vec!["a".into(), "b".into(), "c".into()]),
        )
        .unwrap();
        let out = transform.apply_item(Item::Label(label), &()).unwrap();
        match out {
            Item::OneHotLabel(one_hot) => {
                assert_eq!(one_hot.data().size(), &[2, 3]);
                assert_eq!(one_hot.num_categories(), 3);
            }
            _ => panic!("expected a one-hot label"),
        }
    }

    #[test]
    fn raster_roundtrip() {
        let data = Tensor::of_slice(&[10u8, 20, 30, 40, 50, 60])
            .view([2, 1, 3])
            .permute(&[2, 0, 1]);
        let raster = ToDynImage::to_raster(&data).unwrap();
        let out = ToImageTensor
            .apply_item(Item::DynImage(raster), &())
            .unwrap();
        match out {
            Item::Image(image) => {
                assert_eq!(image.data(), &data.contiguous());
            }
            _ => panic!("expected an image"),
        }
    }
}

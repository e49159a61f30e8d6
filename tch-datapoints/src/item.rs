use crate::{
    bbox::BoundingBoxes, common::*, image::Image, label::Label, label::OneHotLabel, mask::Mask,
    size::PixelSize, video::Video,
};

/// The closed universe of item kinds a sample leaf can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Image,
    Video,
    BoundingBoxes,
    Mask,
    Label,
    OneHotLabel,
    Tensor,
    DynImage,
    Scalar,
}

impl ItemKind {
    const fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// A set of item kinds, used to declare what a transform touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KindSet(u16);

impl KindSet {
    pub const EMPTY: Self = Self(0);

    /// The default transformable set of spatial transforms.
    pub const SPATIAL: Self = Self::of(&[
        ItemKind::Image,
        ItemKind::Video,
        ItemKind::BoundingBoxes,
        ItemKind::Mask,
        ItemKind::Tensor,
        ItemKind::DynImage,
    ]);

    pub const fn of(kinds: &[ItemKind]) -> Self {
        let mut bits = 0;
        let mut index = 0;
        while index < kinds.len() {
            bits |= kinds[index].bit();
            index += 1;
        }
        Self(bits)
    }

    pub const fn contains(self, kind: ItemKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub const fn with(self, kind: ItemKind) -> Self {
        Self(self.0 | kind.bit())
    }

    pub const fn without(self, kind: ItemKind) -> Self {
        Self(self.0 & !kind.bit())
    }
}

/// Inert passthrough value carried through a sample untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

/// One semantically tagged leaf value within a sample.
#[derive(Debug)]
pub enum Item {
    Image(Image),
    Video(Video),
    BoundingBoxes(BoundingBoxes),
    Mask(Mask),
    Label(Label),
    OneHotLabel(OneHotLabel),
    /// An untagged plain tensor, subject to the single-simple-tensor
    /// heuristic of the applicability classifier.
    Tensor(Tensor),
    /// A decoded raster image outside the tensor world.
    DynImage(DynamicImage),
    Scalar(Scalar),
}

impl Item {
    pub fn kind(&self) -> ItemKind {
        match self {
            Item::Image(_) => ItemKind::Image,
            Item::Video(_) => ItemKind::Video,
            Item::BoundingBoxes(_) => ItemKind::BoundingBoxes,
            Item::Mask(_) => ItemKind::Mask,
            Item::Label(_) => ItemKind::Label,
            Item::OneHotLabel(_) => ItemKind::OneHotLabel,
            Item::Tensor(_) => ItemKind::Tensor,
            Item::DynImage(_) => ItemKind::DynImage,
            Item::Scalar(_) => ItemKind::Scalar,
        }
    }

    /// Spatial size of spatially described kinds, `None` otherwise.
    pub fn spatial_size(&self) -> Option<PixelSize<i64>> {
        match self {
            Item::Image(image) => Some(image.spatial_size()),
            Item::Video(video) => Some(video.spatial_size()),
            Item::BoundingBoxes(boxes) => Some(boxes.spatial_size()),
            Item::Mask(mask) => Some(mask.spatial_size()),
            Item::DynImage(image) => Some(image.spatial_size()),
            Item::Label(_) | Item::OneHotLabel(_) | Item::Tensor(_) | Item::Scalar(_) => None,
        }
    }

    pub fn shallow_clone(&self) -> Self {
        match self {
            Item::Image(image) => Item::Image(image.shallow_clone()),
            Item::Video(video) => Item::Video(video.shallow_clone()),
            Item::BoundingBoxes(boxes) => Item::BoundingBoxes(boxes.shallow_clone()),
            Item::Mask(mask) => Item::Mask(mask.shallow_clone()),
            Item::Label(label) => Item::Label(label.shallow_clone()),
            Item::OneHotLabel(label) => Item::OneHotLabel(label.shallow_clone()),
            Item::Tensor(tensor) => Item::Tensor(tensor.shallow_clone()),
            Item::DynImage(image) => Item::DynImage(image.clone()),
            Item::Scalar(scalar) => Item::Scalar(scalar.clone()),
        }
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Item::Image(lhs), Item::Image(rhs)) => lhs == rhs,
            (Item::Video(lhs), Item::Video(rhs)) => lhs == rhs,
            (Item::BoundingBoxes(lhs), Item::BoundingBoxes(rhs)) => lhs == rhs,
            (Item::Mask(lhs), Item::Mask(rhs)) => lhs == rhs,
            (Item::Label(lhs), Item::Label(rhs)) => lhs == rhs,
            (Item::OneHotLabel(lhs), Item::OneHotLabel(rhs)) => lhs == rhs,
            (Item::Tensor(lhs), Item::Tensor(rhs)) => lhs == rhs,
            (Item::DynImage(lhs), Item::DynImage(rhs)) => {
                lhs.dimensions() == rhs.dimensions() && lhs.as_bytes() == rhs.as_bytes()
            }
            (Item::Scalar(lhs), Item::Scalar(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

impl From<Image> for Item {
    fn from(from: Image) -> Self {
        Item::Image(from)
    }
}

impl From<Video> for Item {
    fn from(from: Video) -> Self {
        Item::Video(from)
    }
}

impl From<BoundingBoxes> for Item {
    fn from(from: BoundingBoxes) -> Self {
        Item::BoundingBoxes(from)
    }
}

impl From<Mask> for Item {
    fn from(from: Mask) -> Self {
        Item::Mask(from)
    }
}

impl From<Label> for Item {
    fn from(from: Label) -> Self {
        Item::Label(from)
    }
}

impl From<OneHotLabel> for Item {
    fn from(from: OneHotLabel) -> Self {
        Item::OneHotLabel(from)
    }
}

impl From<Tensor> for Item {
    fn from(from: Tensor) -> Self {
        Item::Tensor(from)
    }
}

impl From<DynamicImage> for Item {
    fn from(from: DynamicImage) -> Self {
        Item::DynImage(from)
    }
}

impl From<Scalar> for Item {
    fn from(from: Scalar) -> Self {
        Item::Scalar(from)
    }
}

/// Capability of item kinds that carry a spatial size.
pub trait SpatiallyDescribed {
    fn spatial_size(&self) -> PixelSize<i64>;
}

impl SpatiallyDescribed for Image {
    fn spatial_size(&self) -> PixelSize<i64> {
        Image::spatial_size(self)
    }
}

impl SpatiallyDescribed for Video {
    fn spatial_size(&self) -> PixelSize<i64> {
        Video::spatial_size(self)
    }
}

impl SpatiallyDescribed for Mask {
    fn spatial_size(&self) -> PixelSize<i64> {
        Mask::spatial_size(self)
    }
}

impl SpatiallyDescribed for BoundingBoxes {
    fn spatial_size(&self) -> PixelSize<i64> {
        BoundingBoxes::spatial_size(self)
    }
}

impl SpatiallyDescribed for DynamicImage {
    fn spatial_size(&self) -> PixelSize<i64> {
        PixelSize {
            h: self.height() as i64,
            w: self.width() as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_set_membership() {
        assert!(KindSet::SPATIAL.contains(ItemKind::Image));
        assert!(KindSet::SPATIAL.contains(ItemKind::Tensor));
        assert!(!KindSet::SPATIAL.contains(ItemKind::Label));

        let narrowed = KindSet::SPATIAL.without(ItemKind::DynImage);
        assert!(!narrowed.contains(ItemKind::DynImage));
        assert!(narrowed.with(ItemKind::DynImage).contains(ItemKind::DynImage));
    }

    #[test]
    fn item_spatial_size() {
        let image = Image::new(Tensor::zeros(&[3, 6, 8], tch::kind::FLOAT_CPU)).unwrap();
        let item = Item::from(image);
        assert_eq!(item.kind(), ItemKind::Image);
        assert_eq!(item.spatial_size(), Some(PixelSize { h: 6, w: 8 }));
        assert_eq!(Item::Scalar(Scalar::Int(3)).spatial_size(), None);
    }
}

//! The transform trait and the per-item dispatch engine.

use crate::{classify::candidate_mask, common::*};

/// A callable transform over one sample.
///
/// The caller owns the random generator; a transform draws all of its
/// randomness from the handle it is given and holds no mutable state of
/// its own, so the same seed over the same sample reproduces the output.
pub trait Transform: Debug {
    fn transform(&self, sample: Sample, rng: &mut StdRng) -> Result<Sample>;
}

impl Transform for Box<dyn Transform> {
    fn transform(&self, sample: Sample, rng: &mut StdRng) -> Result<Sample> {
        (**self).transform(sample, rng)
    }
}

/// View of the candidate items selected by the applicability classifier.
#[derive(Debug)]
pub struct Candidates<'a> {
    items: Vec<&'a Item>,
}

impl<'a> Candidates<'a> {
    pub fn new(items: Vec<&'a Item>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[&'a Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Spatial size of the first spatially described candidate.
    pub fn spatial_reference(&self) -> Result<PixelSize<i64>> {
        self.items
            .iter()
            .find_map(|item| item.spatial_size())
            .ok_or_else(|| {
                TransformError::no_spatial_reference(
                    "the transform requires a spatially described item \
                     (image, video, mask or bounding boxes) and found none",
                )
            })
    }
}

/// A transform expressed as a per-item policy, executed by [`run_item_wise`].
///
/// `resolve` runs exactly once per sample and produces the parameter bundle
/// shared by every touched item; returning `Ok(None)` skips the sample
/// entirely without consuming further randomness.
pub trait ItemWise: Debug {
    type Params;

    /// The set of item kinds this transform touches.
    fn kinds(&self) -> KindSet {
        KindSet::SPATIAL
    }

    /// Reject whole samples this transform cannot accept.
    fn check(&self, _items: &[Item]) -> Result<()> {
        Ok(())
    }

    fn resolve(
        &self,
        candidates: &Candidates<'_>,
        rng: &mut StdRng,
    ) -> Result<Option<Self::Params>>;

    fn apply_item(&self, item: Item, params: &Self::Params) -> Result<Item>;
}

/// Run the flatten → check → classify → resolve → dispatch → unflatten
/// pipeline of an item-wise transform over one sample.
pub(crate) fn run_item_wise<T>(
    transform: &T,
    sample: Sample,
    rng: &mut StdRng,
) -> Result<Sample>
where
    T: ItemWise,
{
    let (items, blueprint) = flatten(sample);
    transform.check(&items)?;

    let mask = candidate_mask(&items, transform.kinds());
    let params = if mask.iter().any(|&flag| flag) {
        let candidates = Candidates::new(
            izip!(&items, &mask)
                .filter_map(|(item, &flag)| flag.then(|| item))
                .collect(),
        );
        transform.resolve(&candidates, rng)?
    } else {
        None
    };

    let items = match params {
        Some(params) => izip!(items, mask)
            .map(|(item, flag)| {
                if flag {
                    transform.apply_item(item, &params)
                } else {
                    Ok(item)
                }
            })
            .try_collect()?,
        None => items,
    };

    Ok(unflatten(items, &blueprint)?)
}

/// Spatial size of an item, treating the trailing two dims of a plain
/// tensor as its plane.
pub(crate) fn plane_size(item: &Item) -> Option<PixelSize<i64>> {
    match item {
        Item::Tensor(data) if data.dim() >= 2 => {
            let size = data.size();
            Some(PixelSize {
                h: size[size.len() - 2],
                w: size[size.len() - 1],
            })
        }
        other => other.spatial_size(),
    }
}

/// Wire `Transform` to the item-wise engine for the given types.
macro_rules! item_wise_transform {
    ($($ty:ty),* $(,)?) => {$(
        impl $crate::transform::Transform for $ty {
            fn transform(
                &self,
                sample: tch_datapoints::Sample,
                rng: &mut rand::rngs::StdRng,
            ) -> $crate::error::Result<tch_datapoints::Sample> {
                $crate::transform::run_item_wise(self, sample, rng)
            }
        }
    )*};
}
pub(crate) use item_wise_transform;

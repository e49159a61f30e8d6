use crate::{common::*, item::Item};
use thiserror::Error;

/// The flat item list disagrees with the reconstruction blueprint.
#[derive(Debug, Error)]
#[error("flat item count does not match the blueprint: expected {expected}, got {actual}")]
pub struct StructureError {
    pub expected: usize,
    pub actual: usize,
}

/// An arbitrarily nested container of items and passthrough values.
///
/// Mappings preserve key insertion order on reconstruction. `Tuple` is the
/// fixed-arity container kind and reconstructs as `Tuple`.
#[derive(Debug, PartialEq)]
pub enum Sample {
    Map(IndexMap<String, Sample>),
    Seq(Vec<Sample>),
    Tuple(Vec<Sample>),
    Leaf(Item),
}

impl Sample {
    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Sample)>,
        K: Into<String>,
    {
        Sample::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    pub fn seq<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Sample>,
    {
        Sample::Seq(values.into_iter().collect())
    }

    pub fn tuple<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Sample>,
    {
        Sample::Tuple(values.into_iter().collect())
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Sample::Map(entries) => entries.values().map(Sample::leaf_count).sum(),
            Sample::Seq(values) | Sample::Tuple(values) => {
                values.iter().map(Sample::leaf_count).sum()
            }
            Sample::Leaf(_) => 1,
        }
    }

    /// Leaf items in flattening order.
    pub fn leaves(&self) -> Vec<&Item> {
        fn walk<'a>(sample: &'a Sample, out: &mut Vec<&'a Item>) {
            match sample {
                Sample::Map(entries) => entries.values().for_each(|value| walk(value, out)),
                Sample::Seq(values) | Sample::Tuple(values) => {
                    values.iter().for_each(|value| walk(value, out))
                }
                Sample::Leaf(item) => out.push(item),
            }
        }

        let mut out = Vec::with_capacity(self.leaf_count());
        walk(self, &mut out);
        out
    }
}

impl From<Item> for Sample {
    fn from(from: Item) -> Self {
        Sample::Leaf(from)
    }
}

macro_rules! leaf_from {
    ($($ty:ty),* $(,)?) => {$(
        impl From<$ty> for Sample {
            fn from(from: $ty) -> Self {
                Sample::Leaf(from.into())
            }
        }
    )*};
}

leaf_from!(
    crate::image::Image,
    crate::video::Video,
    crate::bbox::BoundingBoxes,
    crate::mask::Mask,
    crate::label::Label,
    crate::label::OneHotLabel,
    Tensor,
    DynamicImage,
    crate::item::Scalar,
);

/// Structural description sufficient to rebuild an isomorphic container
/// from a flat item list of matching length and order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Blueprint {
    Leaf,
    Map(Vec<(String, Blueprint)>),
    Seq(Vec<Blueprint>),
    Tuple(Vec<Blueprint>),
}

impl Blueprint {
    pub fn leaf_count(&self) -> usize {
        match self {
            Blueprint::Leaf => 1,
            Blueprint::Map(entries) => entries.iter().map(|(_, sub)| sub.leaf_count()).sum(),
            Blueprint::Seq(subs) | Blueprint::Tuple(subs) => {
                subs.iter().map(Blueprint::leaf_count).sum()
            }
        }
    }
}

/// Decompose a sample into its leaf items and a reconstruction blueprint.
///
/// Items are moved, never copied, so untouched leaves keep their identity
/// through a `flatten`/`unflatten` round trip.
pub fn flatten(sample: Sample) -> (Vec<Item>, Blueprint) {
    fn walk(sample: Sample, items: &mut Vec<Item>) -> Blueprint {
        match sample {
            Sample::Map(entries) => Blueprint::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, walk(value, items)))
                    .collect(),
            ),
            Sample::Seq(values) => Blueprint::Seq(
                values
                    .into_iter()
                    .map(|value| walk(value, items))
                    .collect(),
            ),
            Sample::Tuple(values) => Blueprint::Tuple(
                values
                    .into_iter()
                    .map(|value| walk(value, items))
                    .collect(),
            ),
            Sample::Leaf(item) => {
                items.push(item);
                Blueprint::Leaf
            }
        }
    }

    let mut items = vec![];
    let blueprint = walk(sample, &mut items);
    (items, blueprint)
}

/// Rebuild a sample isomorphic to the blueprint from a flat item list.
pub fn unflatten(
    items: Vec<Item>,
    blueprint: &Blueprint,
) -> Result<Sample, StructureError> {
    let expected = blueprint.leaf_count();
    if items.len() != expected {
        return Err(StructureError {
            expected,
            actual: items.len(),
        });
    }

    fn walk(blueprint: &Blueprint, items: &mut std::vec::IntoIter<Item>) -> Sample {
        match blueprint {
            Blueprint::Leaf => {
                // the count check above guarantees availability
                Sample::Leaf(items.next().unwrap())
            }
            Blueprint::Map(entries) => Sample::Map(
                entries
                    .iter()
                    .map(|(key, sub)| (key.clone(), walk(sub, items)))
                    .collect(),
            ),
            Blueprint::Seq(subs) => {
                Sample::Seq(subs.iter().map(|sub| walk(sub, items)).collect())
            }
            Blueprint::Tuple(subs) => {
                Sample::Tuple(subs.iter().map(|sub| walk(sub, items)).collect())
            }
        }
    }

    let mut iter = items.into_iter();
    Ok(walk(blueprint, &mut iter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Scalar;

    fn nested_sample() -> Sample {
        Sample::map(vec![
            (
                "inputs",
                Sample::seq(vec![
                    Sample::from(Tensor::of_slice(&[1.0f32, 2.0])),
                    Sample::Leaf(Item::Scalar(Scalar::Str("path.png".to_owned()))),
                ]),
            ),
            (
                "pair",
                Sample::tuple(vec![
                    Sample::Leaf(Item::Scalar(Scalar::Int(7))),
                    Sample::Leaf(Item::Scalar(Scalar::Null)),
                ]),
            ),
        ])
    }

    #[test]
    fn flatten_orders_leaves() {
        let (items, blueprint) = flatten(nested_sample());
        assert_eq!(items.len(), 4);
        assert_eq!(blueprint.leaf_count(), 4);
        assert!(matches!(items[0], Item::Tensor(_)));
        assert!(matches!(items[3], Item::Scalar(Scalar::Null)));
    }

    #[test]
    fn unflatten_is_inverse_of_flatten() {
        let original = nested_sample();
        let reference = nested_sample();
        let (items, blueprint) = flatten(original);
        let rebuilt = unflatten(items, &blueprint).unwrap();
        assert_eq!(rebuilt, reference);
    }

    #[test]
    fn unflatten_rejects_count_mismatch() {
        let (mut items, blueprint) = flatten(nested_sample());
        items.pop();
        let err = unflatten(items, &blueprint).unwrap_err();
        assert_eq!(err.expected, 4);
        assert_eq!(err.actual, 3);
    }

    #[test]
    fn tuple_and_seq_rebuild_as_themselves() {
        let (items, blueprint) = flatten(nested_sample());
        let rebuilt = unflatten(items, &blueprint).unwrap();
        match rebuilt {
            Sample::Map(entries) => {
                assert!(matches!(entries["inputs"], Sample::Seq(_)));
                assert!(matches!(entries["pair"], Sample::Tuple(_)));
            }
            _ => panic!("expected a map"),
        }
    }
}

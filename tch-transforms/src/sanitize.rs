//! Bounding-box sanitization and clamping.

use crate::{
    common::*,
    transform::{item_wise_transform, Candidates, ItemWise, Transform},
};

/// Where the labels co-indexed with the boxes live.
#[derive(Debug, Clone)]
pub enum LabelsGetter {
    /// Scan the top-level mapping keys for `labels`, preferring an exact
    /// case-insensitive match over a substring match.
    Auto,
    /// An explicit top-level mapping key.
    Key(String),
    /// A caller-supplied resolver returning the mapping key to use.
    Custom(fn(&IndexMap<String, Sample>) -> Option<String>),
    /// Leave labels untouched.
    None,
}

fn find_labels_key(entries: &IndexMap<String, Sample>) -> Option<String> {
    entries
        .keys()
        .find(|key| key.eq_ignore_ascii_case("labels") || key.eq_ignore_ascii_case("label"))
        .or_else(|| {
            entries
                .keys()
                .find(|key| key.to_ascii_lowercase().contains("label"))
        })
        .cloned()
}

/// Drop degenerate, out-of-bounds and undersized boxes, filtering the
/// co-indexed labels and detection masks identically.
///
/// A box exactly touching the canvas boundary is kept; this mirrors the
/// historical permissive behavior and is a deliberately reviewable policy.
#[derive(Debug, Clone)]
pub struct SanitizeBoundingBoxes {
    min_size: f64,
    labels_getter: LabelsGetter,
}

impl SanitizeBoundingBoxes {
    pub fn new(min_size: f64, labels_getter: LabelsGetter) -> Result<Self> {
        ensure_config!(min_size >= 1.0, "min_size must be >= 1, but get {}", min_size);
        Ok(Self {
            min_size,
            labels_getter,
        })
    }

    fn resolve_labels_key(&self, entries: &IndexMap<String, Sample>) -> Result<Option<String>> {
        let key = match &self.labels_getter {
            LabelsGetter::None => return Ok(None),
            LabelsGetter::Key(key) => {
                if !entries.contains_key(key) {
                    return Err(TransformError::ambiguous_labels(format!(
                        "the configured labels key '{}' is not present in the sample",
                        key
                    )));
                }
                key.clone()
            }
            LabelsGetter::Custom(getter) => match getter(entries) {
                Some(key) => key,
                None => return Ok(None),
            },
            LabelsGetter::Auto => find_labels_key(entries).ok_or_else(|| {
                TransformError::ambiguous_labels(
                    "could not infer where the labels are in the sample; \
                     configure an explicit labels getter",
                )
            })?,
        };
        Ok(Some(key))
    }
}

fn valid_mask(boxes: &BoundingBoxes, min_size: f64) -> Tensor {
    let canvas = boxes.canvas();
    let xyxy = boxes.xyxy_data().to_kind(Kind::Float);
    let parts = xyxy.unbind(-1);
    let (x1, y1, x2, y2) = (&parts[0], &parts[1], &parts[2], &parts[3]);

    let width = x2 - x1;
    let height = y2 - y1;
    width
        .ge(min_size)
        .logical_and(&height.ge(min_size))
        .logical_and(&x1.ge(0.0))
        .logical_and(&y1.ge(0.0))
        .logical_and(&x2.le(canvas.w as f64))
        .logical_and(&y2.le(canvas.h as f64))
}

impl Transform for SanitizeBoundingBoxes {
    fn transform(&self, sample: Sample, _rng: &mut StdRng) -> Result<Sample> {
        let mut entries = match sample {
            Sample::Map(entries) => entries,
            _ => {
                return Err(TransformError::invalid_configuration(
                    "sanitization requires a mapping sample to locate the labels",
                ))
            }
        };

        let labels_key = self.resolve_labels_key(&entries)?;

        let boxes_keys: Vec<String> = entries
            .iter()
            .filter_map(|(key, value)| {
                matches!(value, Sample::Leaf(Item::BoundingBoxes(_))).then(|| key.clone())
            })
            .collect();
        let boxes_key = match boxes_keys.as_slice() {
            [] => return Ok(Sample::Map(entries)),
            [key] => key.clone(),
            keys => {
                return Err(TransformError::structure_mismatch(format!(
                    "expect at most one bounding boxes entry, but get {:?}",
                    keys
                )))
            }
        };

        let (keep, num_boxes, kept_count) = match &entries[&boxes_key] {
            Sample::Leaf(Item::BoundingBoxes(boxes)) => {
                let keep = valid_mask(boxes, self.min_size);
                let num_boxes = boxes.num_boxes();
                let kept = i64::from(&keep.to_kind(Kind::Int64).sum(Kind::Int64));
                (keep.nonzero().view([-1]), num_boxes, kept)
            }
            _ => unreachable!(),
        };

        if kept_count < num_boxes {
            warn!(
                "filtered out {} degenerate or out-of-bounds boxes",
                num_boxes - kept_count
            );
        }

        let filtered = match &entries[&boxes_key] {
            Sample::Leaf(Item::BoundingBoxes(boxes)) => boxes.index_select(&keep),
            _ => unreachable!(),
        };
        entries[&boxes_key] = Sample::Leaf(Item::BoundingBoxes(filtered));

        if let Some(labels_key) = labels_key {
            let filtered = match &entries[&labels_key] {
                Sample::Leaf(Item::Label(labels)) => {
                    check_count(labels.data().size()[0], num_boxes)?;
                    Sample::Leaf(Item::Label(
                        labels.shallow_clone().map(|data| data.index_select(0, &keep)),
                    ))
                }
                Sample::Leaf(Item::Tensor(data)) => {
                    check_count(data.size()[0], num_boxes)?;
                    Sample::Leaf(Item::Tensor(data.index_select(0, &keep)))
                }
                _ => {
                    return Err(TransformError::ambiguous_labels(format!(
                        "the labels entry '{}' must be a label or plain tensor",
                        labels_key
                    )))
                }
            };
            entries[&labels_key] = filtered;
        }

        // detection masks co-indexed with the boxes shrink identically
        for value in entries.values_mut() {
            if let Sample::Leaf(Item::Mask(mask)) = value {
                if mask.num_objects() == Some(num_boxes) {
                    let filtered = mask.shallow_clone().map(|data| data.index_select(0, &keep));
                    *value = Sample::Leaf(Item::Mask(filtered));
                }
            }
        }

        Ok(Sample::Map(entries))
    }
}

fn check_count(labels: i64, boxes: i64) -> Result<()> {
    if labels != boxes {
        return Err(TransformError::structure_mismatch(format!(
            "number of boxes ({}) and labels ({}) do not match",
            boxes, labels
        )));
    }
    Ok(())
}

/// Clamp box coordinates into their canvas.
#[derive(Debug, Clone, Default)]
pub struct ClampBoundingBoxes;

impl ItemWise for ClampBoundingBoxes {
    type Params = ();

    fn kinds(&self) -> KindSet {
        KindSet::of(&[ItemKind::BoundingBoxes])
    }

    fn resolve(&self, _candidates: &Candidates<'_>, _rng: &mut StdRng) -> Result<Option<()>> {
        Ok(Some(()))
    }

    fn apply_item(&self, item: Item, _params: &()) -> Result<Item> {
        Ok(match item {
            Item::BoundingBoxes(boxes) => {
                let canvas = boxes.canvas();
                let xyxy = boxes.xyxy_data();
                let parts = xyxy.unbind(-1);
                let clamped = Tensor::stack(
                    &[
                        parts[0].clamp(0.0, canvas.w as f64),
                        parts[1].clamp(0.0, canvas.h as f64),
                        parts[2].clamp(0.0, canvas.w as f64),
                        parts[3].clamp(0.0, canvas.h as f64),
                    ],
                    -1,
                );
                Item::BoundingBoxes(boxes.with_xyxy_data(clamped, canvas))
            }
            other => other,
        })
    }
}

item_wise_transform!(ClampBoundingBoxes);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_size_validated() {
        assert!(matches!(
            SanitizeBoundingBoxes::new(0.0, LabelsGetter::Auto),
            Err(TransformError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn labels_key_heuristic() {
        for key in ["labels", "LABELS", "LaBeL", "SOME_WEIRD_KEY_THAT_HAS_LABeL_IN_IT"] {
            let entries: IndexMap<String, Sample> = [(key.to_owned(), Sample::from(Scalar::Null))]
                .into_iter()
                .collect();
            assert_eq!(find_labels_key(&entries), Some(key.to_owned()));
        }

        // an exact match wins over a substring match
        let entries: IndexMap<String, Sample> = [
            (
                "SOME_WEIRD_KEY_THAT_HAS_LABeL_IN_IT".to_owned(),
                Sample::from(Scalar::Null),
            ),
            ("labels".to_owned(), Sample::from(Scalar::Null)),
        ]
        .into_iter()
        .collect();
        assert_eq!(find_labels_key(&entries), Some("labels".to_owned()));
    }

    #[test]
    fn clamp_pulls_boxes_into_canvas() {
        let transform = ClampBoundingBoxes;
        let boxes = BoundingBoxes::new(
            Tensor::of_slice(&[-2.0f32, -2.0, 12.0, 12.0]),
            BoxFormat::Xyxy,
            PixelSize { h: 10, w: 10 },
        )
        .unwrap();
        let out = transform.apply_item(Item::BoundingBoxes(boxes), &()).unwrap();
        match out {
            Item::BoundingBoxes(out) => assert_eq!(
                out.data(),
                &Tensor::of_slice(&[0.0f32, 0.0, 10.0, 10.0]).view([1, 4])
            ),
            _ => unreachable!(),
        }
    }
}

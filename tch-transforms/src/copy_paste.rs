//! Simple copy-paste compositing across parallel detection samples.
//!
//! The sample must carry one image per detection target, where a target is
//! a (bounding boxes, detection masks, labels) triple encountered in
//! flattening order. A random subset of each neighbor's objects is pasted
//! onto every image, and the target lists grow accordingly.

use crate::{
    common::*,
    transform::Transform,
};

#[derive(Debug, Clone)]
pub struct SimpleCopyPaste {
    /// Chance for each source object to be pasted.
    selection_p: f64,
}

impl SimpleCopyPaste {
    pub fn new(selection_p: f64) -> Result<Self> {
        ensure_config!(
            (0.0..=1.0).contains(&selection_p),
            "selection probability must be in range 0.0..=1.0, but get {}",
            selection_p
        );
        Ok(Self { selection_p })
    }
}

impl Default for SimpleCopyPaste {
    fn default() -> Self {
        Self { selection_p: 0.5 }
    }
}

struct Target {
    boxes_index: usize,
    masks_index: usize,
    labels_index: usize,
}

fn extract_structure(items: &[Item]) -> Result<(Vec<usize>, Vec<Target>)> {
    let mut images = vec![];
    let mut boxes = vec![];
    let mut masks = vec![];
    let mut labels = vec![];

    for (index, item) in items.iter().enumerate() {
        match item {
            Item::Image(_) => images.push(index),
            Item::BoundingBoxes(_) => boxes.push(index),
            Item::Mask(_) => masks.push(index),
            Item::Label(_) => labels.push(index),
            _ => {}
        }
    }

    if boxes.len() != masks.len() || boxes.len() != labels.len() {
        return Err(TransformError::structure_mismatch(format!(
            "copy-paste targets must carry boxes, masks and labels in parallel, \
             but get {} boxes, {} masks and {} labels",
            boxes.len(),
            masks.len(),
            labels.len()
        )));
    }
    if images.len() != boxes.len() {
        return Err(TransformError::structure_mismatch(format!(
            "expect one image per target, but get {} images and {} targets",
            images.len(),
            boxes.len()
        )));
    }
    if images.len() < 2 {
        return Err(TransformError::structure_mismatch(
            "copy-paste requires at least two image/target pairs",
        ));
    }

    let targets = izip!(boxes, masks, labels)
        .map(|(boxes_index, masks_index, labels_index)| Target {
            boxes_index,
            masks_index,
            labels_index,
        })
        .collect();
    Ok((images, targets))
}

struct Pasted {
    image: Image,
    boxes: BoundingBoxes,
    masks: Mask,
    labels: Label,
}

fn paste(
    image: &Image,
    boxes: &BoundingBoxes,
    masks: &Mask,
    labels: &Label,
    source_image: &Image,
    source_boxes: &BoundingBoxes,
    source_masks: &Mask,
    source_labels: &Label,
    selection: &[i64],
) -> Result<Pasted> {
    if image.spatial_size() != source_image.spatial_size() {
        return Err(TransformError::structure_mismatch(format!(
            "copy-paste images must share a spatial size, but get {} and {}",
            image.spatial_size(),
            source_image.spatial_size()
        )));
    }

    let index = Tensor::of_slice(selection);
    let picked_masks = source_masks.data().index_select(0, &index);
    let picked_boxes = source_boxes.index_select(&index);
    let picked_labels = source_labels.data().index_select(0, &index);

    // union of the pasted object planes, expanded over the channel dim
    let union = picked_masks
        .to_kind(Kind::Float)
        .sum_dim_intlist(&[0], false, Kind::Float)
        .clamp(0.0, 1.0);

    let out_image = {
        let data = image.data().to_kind(Kind::Float);
        let source = source_image.data().to_kind(Kind::Float);
        &data * (&union * -1.0 + 1.0).unsqueeze(0) + source * union.unsqueeze(0)
    };

    let carved = masks.data().to_kind(Kind::Float) * (&union * -1.0 + 1.0).unsqueeze(0);
    let out_masks = Tensor::cat(
        &[
            carved.to_kind(masks.data().kind()),
            picked_masks,
        ],
        0,
    );

    let out_boxes = BoundingBoxes::from_parts(
        Tensor::cat(
            &[
                boxes.xyxy_data().to_kind(Kind::Float),
                picked_boxes.xyxy_data().to_kind(Kind::Float),
            ],
            0,
        ),
        BoxFormat::Xyxy,
        boxes.canvas(),
    )
    .convert_to(boxes.format());

    let out_labels = Tensor::cat(&[labels.data().shallow_clone(), picked_labels], 0);

    Ok(Pasted {
        image: Image::from_unchecked(out_image),
        boxes: out_boxes,
        masks: Mask::from_unchecked(out_masks),
        labels: labels.shallow_clone().map(|_| out_labels),
    })
}

impl Transform for SimpleCopyPaste {
    fn transform(&self, sample: Sample, rng: &mut StdRng) -> Result<Sample> {
        let (mut items, blueprint) = flatten(sample);
        let (images, targets) = extract_structure(&items)?;
        let count = images.len();

        let mut replacements: Vec<(usize, Item)> = vec![];
        for position in 0..count {
            let source = (position + 1) % count;

            let source_masks = match &items[targets[source].masks_index] {
                Item::Mask(masks) => masks,
                _ => unreachable!(),
            };
            let num_objects = source_masks.num_objects().unwrap_or(0);
            let selection: Vec<i64> = (0..num_objects)
                .filter(|_| rng.gen_bool(self.selection_p))
                .collect();
            if selection.is_empty() {
                continue;
            }

            let pasted = match (
                &items[images[position]],
                &items[targets[position].boxes_index],
                &items[targets[position].masks_index],
                &items[targets[position].labels_index],
                &items[images[source]],
                &items[targets[source].boxes_index],
                &items[targets[source].masks_index],
                &items[targets[source].labels_index],
            ) {
                (
                    Item::Image(image),
                    Item::BoundingBoxes(boxes),
                    Item::Mask(masks),
                    Item::Label(labels),
                    Item::Image(source_image),
                    Item::BoundingBoxes(source_boxes),
                    Item::Mask(source_masks),
                    Item::Label(source_labels),
                ) => paste(
                    image,
                    boxes,
                    masks,
                    labels,
                    source_image,
                    source_boxes,
                    source_masks,
                    source_labels,
                    &selection,
                )?,
                _ => unreachable!(),
            };

            replacements.push((images[position], Item::Image(pasted.image)));
            replacements.push((targets[position].boxes_index, Item::BoundingBoxes(pasted.boxes)));
            replacements.push((targets[position].masks_index, Item::Mask(pasted.masks)));
            replacements.push((targets[position].labels_index, Item::Label(pasted.labels)));
        }

        for (index, item) in replacements {
            items[index] = item;
        }
        Ok(unflatten(items, &blueprint)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection_pair(with_second_target: bool) -> Sample {
        let entry = |seed: f32| {
            Sample::map(vec![
                (
                    "image",
                    Sample::from(
                        Image::new(Tensor::ones(&[3, 8, 8], FLOAT_CPU) * seed as f64).unwrap(),
                    ),
                ),
                (
                    "boxes",
                    Sample::from(
                        BoundingBoxes::new(
                            Tensor::of_slice(&[1.0f32, 1.0, 4.0, 4.0]),
                            BoxFormat::Xyxy,
                            PixelSize { h: 8, w: 8 },
                        )
                        .unwrap(),
                    ),
                ),
                (
                    "masks",
                    Sample::from(Mask::new(Tensor::ones(&[1, 8, 8], tch::kind::INT64_CPU)).unwrap()),
                ),
                (
                    "labels",
                    Sample::from(
                        Label::new(Tensor::of_slice(&[1i64]), None).unwrap(),
                    ),
                ),
            ])
        };

        let mut entries = vec![entry(1.0)];
        if with_second_target {
            entries.push(entry(2.0));
        } else {
            entries.push(Sample::map(vec![(
                "image",
                Sample::from(Image::new(Tensor::ones(&[3, 8, 8], FLOAT_CPU)).unwrap()),
            )]));
        }
        Sample::seq(entries)
    }

    #[test]
    fn unbalanced_lists_are_rejected() {
        let transform = SimpleCopyPaste::default();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            transform.transform(detection_pair(false), &mut rng),
            Err(TransformError::StructureMismatch(_))
        ));
    }

    #[test]
    fn pasted_objects_extend_targets() {
        let transform = SimpleCopyPaste::new(1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let out = transform.transform(detection_pair(true), &mut rng).unwrap();
        let leaves = out.leaves();
        match leaves[1] {
            Item::BoundingBoxes(boxes) => assert_eq!(boxes.num_boxes(), 2),
            _ => panic!("expected boxes"),
        }
        match leaves[3] {
            Item::Label(labels) => assert_eq!(labels.data().size(), &[2]),
            _ => panic!("expected labels"),
        }
    }
}

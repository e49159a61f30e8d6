//! End-to-end properties of the dispatch engine.

use rand::{rngs::StdRng, SeedableRng};
use tch::{kind::FLOAT_CPU, Tensor};
use tch_datapoints::{
    flatten, unflatten, BoundingBoxes, BoxFormat, Image, Item, Label, Mask, PixelSize, Sample,
    Scalar,
};
use tch_transforms::{
    Candidates, ItemWise, RandomHorizontalFlip, RandomRotationInit, Transform,
};

use noisy_float::prelude::*;

fn image(height: i64, width: i64) -> Image {
    Image::new(Tensor::rand(&[3, height, width], FLOAT_CPU)).unwrap()
}

fn nested_sample() -> Sample {
    Sample::map(vec![
        (
            "inputs",
            Sample::seq(vec![
                Sample::from(image(4, 4)),
                Sample::from(Scalar::Str("frame-0.png".to_owned())),
            ]),
        ),
        (
            "targets",
            Sample::tuple(vec![
                Sample::from(
                    BoundingBoxes::new(
                        Tensor::of_slice(&[1.0f32, 1.0, 3.0, 3.0]),
                        BoxFormat::Xyxy,
                        PixelSize { h: 4, w: 4 },
                    )
                    .unwrap(),
                ),
                Sample::from(Label::new(Tensor::of_slice(&[2i64]), None).unwrap()),
            ]),
        ),
        ("count", Sample::from(Scalar::Int(7))),
    ])
}

#[test]
fn flatten_unflatten_identity_law() {
    let original = nested_sample();
    let reference = match &original {
        Sample::Map(entries) => match &entries["inputs"] {
            Sample::Seq(values) => match &values[0] {
                Sample::Leaf(Item::Image(image)) => image.shallow_clone(),
                _ => panic!("expected an image"),
            },
            _ => panic!("expected a sequence"),
        },
        _ => panic!("expected a map"),
    };

    let (items, blueprint) = flatten(original);
    assert_eq!(items.len(), 5);
    let rebuilt = unflatten(items, &blueprint).unwrap();

    // the image leaf still shares storage with the pre-flatten handle
    match &rebuilt {
        Sample::Map(entries) => match &entries["inputs"] {
            Sample::Seq(values) => match &values[0] {
                Sample::Leaf(Item::Image(out)) => {
                    let mut probe = out.data().shallow_clone();
                    let _ = probe.fill_(3.0);
                    assert_eq!(
                        f64::from(reference.data().mean(tch::Kind::Float)),
                        3.0
                    );
                }
                _ => panic!("expected an image"),
            },
            _ => panic!("expected a sequence"),
        },
        _ => panic!("expected a map"),
    }
}

#[test]
fn untouched_items_keep_identity_and_kinds_are_preserved() {
    let transform = RandomHorizontalFlip::new(1.0).unwrap();
    let mut rng = StdRng::seed_from_u64(0);

    let label_handle = Label::new(Tensor::of_slice(&[2i64]), None).unwrap();
    let sample = Sample::map(vec![
        ("image", Sample::from(image(4, 4))),
        ("label", Sample::from(label_handle.shallow_clone())),
    ]);

    let out = transform.transform(sample, &mut rng).unwrap();
    let leaves = out.leaves();
    assert!(matches!(leaves[0], Item::Image(_)));

    match leaves[1] {
        Item::Label(out_label) => {
            // labels are not candidates of a flip; the output shares storage
            let mut probe = out_label.data().shallow_clone();
            let _ = probe.fill_(9);
            assert_eq!(i64::from(&label_handle.data().sum(tch::Kind::Int64)), 9);
        }
        _ => panic!("label kind must be preserved"),
    }
}

#[test]
fn single_simple_tensor_is_transformed() {
    let transform = RandomHorizontalFlip::new(1.0).unwrap();
    let mut rng = StdRng::seed_from_u64(0);

    let plain = Tensor::of_slice(&[0.0f32, 1.0, 0.0, 1.0]).view([1, 2, 2]);
    let sample = Sample::map(vec![
        ("image", Sample::from(image(2, 2))),
        ("plain", Sample::from(plain.shallow_clone())),
    ]);

    let out = transform.transform(sample, &mut rng).unwrap();
    match out.leaves()[1] {
        Item::Tensor(out_plain) => {
            assert_eq!(out_plain, &plain.flip(&[-1]));
        }
        _ => panic!("expected a plain tensor"),
    }
}

#[test]
fn multiple_simple_tensors_are_skipped_while_tagged_items_transform() {
    let transform = RandomHorizontalFlip::new(1.0).unwrap();
    let mut rng = StdRng::seed_from_u64(0);

    let plain_a = Tensor::of_slice(&[0.0f32, 1.0]).view([1, 1, 2]);
    let plain_b = Tensor::of_slice(&[2.0f32, 3.0]).view([1, 1, 2]);
    let tagged = Tensor::of_slice(&[0.0f32, 1.0, 0.0, 1.0]).view([1, 2, 2]);
    let sample = Sample::map(vec![
        ("a", Sample::from(plain_a.shallow_clone())),
        ("image", Sample::from(Image::new(tagged.shallow_clone()).unwrap())),
        ("b", Sample::from(plain_b.shallow_clone())),
    ]);

    let out = transform.transform(sample, &mut rng).unwrap();
    let leaves = out.leaves();
    match (leaves[0], leaves[1], leaves[2]) {
        (Item::Tensor(out_a), Item::Image(out_image), Item::Tensor(out_b)) => {
            assert_eq!(out_a, &plain_a);
            assert_eq!(out_b, &plain_b);
            assert_eq!(out_image.data(), &tagged.flip(&[-1]));
        }
        _ => panic!("unexpected leaf kinds"),
    }
}

#[test]
fn rotation_parameters_are_shared_between_image_and_boxes() {
    let transform = RandomRotationInit {
        degrees: (r64(-180.0), r64(180.0)),
        ..RandomRotationInit::default()
    }
    .build()
    .unwrap();

    let boxes = BoundingBoxes::new(
        Tensor::of_slice(&[2.0f32, 2.0, 6.0, 6.0]),
        BoxFormat::Xyxy,
        PixelSize { h: 10, w: 10 },
    )
    .unwrap();
    let sample = Sample::map(vec![
        ("image", Sample::from(image(10, 10))),
        ("boxes", Sample::from(boxes.shallow_clone())),
    ]);

    let seed = 17;
    let mut rng = StdRng::seed_from_u64(seed);
    let out = transform.transform(sample, &mut rng).unwrap();

    // replay the single draw and recompute the expected box envelope
    let mut replay = StdRng::seed_from_u64(seed);
    let reference_image = image(10, 10);
    let reference_item = Item::Image(reference_image);
    let candidates = Candidates::new(vec![&reference_item]);
    let params = transform.resolve(&candidates, &mut replay).unwrap().unwrap();
    let expected = match transform
        .apply_item(Item::BoundingBoxes(boxes), &params)
        .unwrap()
    {
        Item::BoundingBoxes(expected) => expected,
        _ => panic!("expected boxes"),
    };

    match out.leaves()[1] {
        Item::BoundingBoxes(out_boxes) => assert_eq!(out_boxes, &expected),
        _ => panic!("expected boxes"),
    }
}

#[test]
fn skipped_sample_consumes_only_the_coin_flip() {
    use rand::Rng as _;
    use tch_transforms::RandomPerspectiveInit;

    // find a seed whose first coin flip at p=0.5 lands on skip
    let seed = (0..u64::MAX)
        .find(|&seed| !StdRng::seed_from_u64(seed).gen_bool(0.5))
        .unwrap();

    let transform = RandomPerspectiveInit::default().build().unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    let sample = Sample::from(image(8, 8));
    let _ = transform.transform(sample, &mut rng).unwrap();

    let mut reference = StdRng::seed_from_u64(seed);
    let _ = reference.gen_bool(0.5);
    assert_eq!(rng.gen::<u64>(), reference.gen::<u64>());
}

#[test]
fn same_seed_reproduces_the_output() {
    let transform = RandomRotationInit {
        degrees: (r64(-90.0), r64(90.0)),
        ..RandomRotationInit::default()
    }
    .build()
    .unwrap();

    let run = |seed: u64, data: &Tensor| {
        let mut rng = StdRng::seed_from_u64(seed);
        let sample = Sample::from(Image::new(data.shallow_clone()).unwrap());
        match transform.transform(sample, &mut rng).unwrap() {
            Sample::Leaf(Item::Image(out)) => out.into_data(),
            _ => panic!("expected an image"),
        }
    };

    let data = Tensor::rand(&[3, 6, 6], FLOAT_CPU);
    assert_eq!(run(99, &data), run(99, &data));
}

#[test]
fn empty_sample_is_a_no_op() {
    let transform = RandomHorizontalFlip::new(1.0).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    let sample = Sample::map(vec![
        ("name", Sample::from(Scalar::Str("x".to_owned()))),
        ("count", Sample::from(Scalar::Int(3))),
    ]);
    let out = transform.transform(sample, &mut rng).unwrap();
    assert_eq!(out.leaf_count(), 2);
}

#[test]
fn structure_mismatch_is_reported() {
    let (mut items, blueprint) = flatten(nested_sample());
    items.pop();
    let err = unflatten(items, &blueprint).unwrap_err();
    assert_eq!(err.expected, 5);
    assert_eq!(err.actual, 4);
}

#[test]
fn mask_planes_survive_flips() {
    let transform = RandomHorizontalFlip::new(1.0).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    let mask = Mask::new(Tensor::of_slice(&[1i64, 0, 0, 0]).view([1, 2, 2])).unwrap();
    let sample = Sample::from(mask);
    let out = transform.transform(sample, &mut rng).unwrap();
    match out {
        Sample::Leaf(Item::Mask(out_mask)) => {
            assert_eq!(
                out_mask.data(),
                &Tensor::of_slice(&[0i64, 1, 0, 0]).view([1, 2, 2])
            );
        }
        _ => panic!("expected a mask"),
    }
}

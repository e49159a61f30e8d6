//! Batch-level mixing: mixup and cutmix.
//!
//! Both operate jointly on a batched image or video tensor and a one-hot
//! label tensor, blending each element of the batch with its neighbor.
//! They categorically reject samples carrying bounding boxes, masks,
//! plain labels or decoded rasters, while unrelated passthrough values
//! are tolerated and bypassed unchanged.

use crate::{
    common::*,
    transform::{item_wise_transform, Candidates, ItemWise},
};
use rand_distr::{Beta, Distribution as _};

fn check_mixable(items: &[Item], name: &str) -> Result<()> {
    let mut has_batch = false;
    let mut has_one_hot = false;

    for item in items {
        match item {
            Item::BoundingBoxes(_) | Item::Mask(_) | Item::Label(_) | Item::DynImage(_) => {
                return Err(TransformError::unsupported_item_kind(format!(
                    "{} does not support decoded rasters, bounding boxes, masks and plain labels, \
                     but the sample contains {:?}",
                    name,
                    item.kind()
                )));
            }
            Item::Image(image) => {
                if image.data().dim() >= 4 {
                    has_batch = true;
                }
            }
            Item::Video(video) => {
                if video.data().dim() >= 5 {
                    has_batch = true;
                }
            }
            Item::OneHotLabel(label) => {
                if label.data().dim() >= 2 {
                    has_one_hot = true;
                }
            }
            Item::Tensor(_) | Item::Scalar(_) => {}
        }
    }

    if !(has_batch && has_one_hot) {
        return Err(TransformError::unsupported_item_kind(format!(
            "{} requires a batched image or video together with a batched one-hot label",
            name
        )));
    }
    Ok(())
}

fn draw_lambda(alpha: f64, rng: &mut StdRng) -> f64 {
    // alpha is validated positive at construction
    match Beta::new(alpha, alpha) {
        Ok(beta) => beta.sample(rng),
        Err(_) => 0.5,
    }
}

/// Linear mixup over the batch dimension.
#[derive(Debug, Clone)]
pub struct RandomMixup {
    alpha: f64,
}

impl RandomMixup {
    pub fn new(alpha: f64) -> Result<Self> {
        ensure_config!(alpha > 0.0, "alpha must be positive, but get {}", alpha);
        Ok(Self { alpha })
    }
}

#[derive(Debug)]
pub struct MixupParams {
    pub lambda: f64,
}

impl ItemWise for RandomMixup {
    type Params = MixupParams;

    fn kinds(&self) -> KindSet {
        KindSet::of(&[ItemKind::Image, ItemKind::Video, ItemKind::OneHotLabel])
    }

    fn check(&self, items: &[Item]) -> Result<()> {
        check_mixable(items, "mixup")
    }

    fn resolve(
        &self,
        _candidates: &Candidates<'_>,
        rng: &mut StdRng,
    ) -> Result<Option<MixupParams>> {
        Ok(Some(MixupParams {
            lambda: draw_lambda(self.alpha, rng),
        }))
    }

    fn apply_item(&self, item: Item, params: &MixupParams) -> Result<Item> {
        let lambda = params.lambda;
        let mix = |data: &Tensor| {
            let data = data.to_kind(Kind::Float);
            let rolled = data.roll(&[1], &[0]);
            &data * lambda + rolled * (1.0 - lambda)
        };

        Ok(match item {
            Item::Image(image) => Item::Image(image.map(|data| mix(&data))),
            Item::Video(video) => Item::Video(video.map(|data| mix(&data))),
            Item::OneHotLabel(label) => Item::OneHotLabel(label.map(|data| mix(&data))),
            other => other,
        })
    }
}

/// Cutmix: paste a rectangular window from the rolled batch and blend the
/// labels by the uncovered area fraction.
#[derive(Debug, Clone)]
pub struct RandomCutmix {
    alpha: f64,
}

impl RandomCutmix {
    pub fn new(alpha: f64) -> Result<Self> {
        ensure_config!(alpha > 0.0, "alpha must be positive, but get {}", alpha);
        Ok(Self { alpha })
    }
}

#[derive(Debug)]
pub struct CutmixParams {
    /// Label blend weight after clipping the cut window to the canvas.
    pub lambda_adjusted: f64,
    pub top: i64,
    pub left: i64,
    pub height: i64,
    pub width: i64,
}

impl ItemWise for RandomCutmix {
    type Params = CutmixParams;

    fn kinds(&self) -> KindSet {
        KindSet::of(&[ItemKind::Image, ItemKind::Video, ItemKind::OneHotLabel])
    }

    fn check(&self, items: &[Item]) -> Result<()> {
        check_mixable(items, "cutmix")
    }

    fn resolve(
        &self,
        candidates: &Candidates<'_>,
        rng: &mut StdRng,
    ) -> Result<Option<CutmixParams>> {
        let size = candidates.spatial_reference()?;
        let lambda = draw_lambda(self.alpha, rng);

        let cut_fraction = (1.0 - lambda).sqrt();
        let cut_h = (size.h as f64 * cut_fraction) as i64;
        let cut_w = (size.w as f64 * cut_fraction) as i64;
        let center_y = rng.gen_range(0..size.h);
        let center_x = rng.gen_range(0..size.w);

        let top = (center_y - cut_h / 2).clamp(0, size.h);
        let bottom = (center_y + cut_h / 2).clamp(0, size.h);
        let left = (center_x - cut_w / 2).clamp(0, size.w);
        let right = (center_x + cut_w / 2).clamp(0, size.w);

        let cut_area = ((bottom - top) * (right - left)) as f64;
        let lambda_adjusted = 1.0 - cut_area / (size.h * size.w) as f64;

        Ok(Some(CutmixParams {
            lambda_adjusted,
            top,
            left,
            height: bottom - top,
            width: right - left,
        }))
    }

    fn apply_item(&self, item: Item, params: &CutmixParams) -> Result<Item> {
        let CutmixParams {
            lambda_adjusted,
            top,
            left,
            height,
            width,
        } = *params;

        let cut = |data: &Tensor| {
            let data = data.to_kind(Kind::Float);
            if height == 0 || width == 0 {
                return data;
            }
            let rolled = data.roll(&[1], &[0]);
            let out = data.copy();
            let mut window = out.narrow(-2, top, height).narrow(-1, left, width);
            window.copy_(&rolled.narrow(-2, top, height).narrow(-1, left, width));
            out
        };
        let blend_labels = |data: &Tensor| {
            let data = data.to_kind(Kind::Float);
            let rolled = data.roll(&[1], &[0]);
            &data * lambda_adjusted + rolled * (1.0 - lambda_adjusted)
        };

        Ok(match item {
            Item::Image(image) => Item::Image(image.map(|data| cut(&data))),
            Item::Video(video) => Item::Video(video.map(|data| cut(&data))),
            Item::OneHotLabel(label) => Item::OneHotLabel(label.map(|data| blend_labels(&data))),
            other => other,
        })
    }
}

item_wise_transform!(RandomMixup, RandomCutmix);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Transform;

    fn batch_sample() -> Sample {
        Sample::map(vec![
            (
                "images",
                Sample::from(Image::new(Tensor::ones(&[4, 3, 8, 8], FLOAT_CPU)).unwrap()),
            ),
            (
                "labels",
                Sample::from(
                    OneHotLabel::new(Tensor::ones(&[4, 10], FLOAT_CPU), None).unwrap(),
                ),
            ),
        ])
    }

    #[test]
    fn mixup_accepts_batched_pair() {
        let transform = RandomMixup::new(1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(transform.transform(batch_sample(), &mut rng).is_ok());
    }

    #[test]
    fn mixup_rejects_boxes() {
        let transform = RandomMixup::new(1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let mut sample = match batch_sample() {
            Sample::Map(entries) => entries,
            _ => unreachable!(),
        };
        sample.insert(
            "unsupported".to_owned(),
            Sample::from(
                BoundingBoxes::new(
                    Tensor::of_slice(&[0.0f32, 0.0, 1.0, 1.0]),
                    BoxFormat::Xyxy,
                    PixelSize { h: 8, w: 8 },
                )
                .unwrap(),
            ),
        );
        assert!(matches!(
            transform.transform(Sample::Map(sample), &mut rng),
            Err(TransformError::UnsupportedItemKind(_))
        ));
    }

    #[test]
    fn missing_one_hot_is_rejected() {
        let transform = RandomCutmix::new(1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let sample = Sample::map(vec![(
            "images",
            Sample::from(Image::new(Tensor::ones(&[4, 3, 8, 8], FLOAT_CPU)).unwrap()),
        )]);
        assert!(matches!(
            transform.transform(sample, &mut rng),
            Err(TransformError::UnsupportedItemKind(_))
        ));
    }
}

//! Temporal subsampling of videos.

use crate::{
    common::*,
    transform::{item_wise_transform, Candidates, ItemWise},
};

/// Keep `num_samples` frames evenly spread over the temporal dimension.
#[derive(Debug, Clone)]
pub struct UniformTemporalSubsample {
    num_samples: i64,
}

impl UniformTemporalSubsample {
    pub fn new(num_samples: i64) -> Result<Self> {
        ensure_config!(
            num_samples > 0,
            "num_samples must be positive, but get {}",
            num_samples
        );
        Ok(Self { num_samples })
    }
}

impl ItemWise for UniformTemporalSubsample {
    type Params = ();

    fn kinds(&self) -> KindSet {
        KindSet::of(&[ItemKind::Video])
    }

    fn resolve(&self, _candidates: &Candidates<'_>, _rng: &mut StdRng) -> Result<Option<()>> {
        Ok(Some(()))
    }

    fn apply_item(&self, item: Item, _params: &()) -> Result<Item> {
        Ok(match item {
            Item::Video(video) => {
                let frames = video.num_frames();
                let count = self.num_samples.min(frames);
                let indices = Tensor::linspace(0.0, (frames - 1) as f64, count, FLOAT_CPU)
                    .round()
                    .to_kind(Kind::Int64);
                Item::Video(video.map(|data| {
                    let dim = data.dim() as i64 - 4;
                    data.index_select(dim, &indices)
                }))
            }
            other => other,
        })
    }
}

item_wise_transform!(UniformTemporalSubsample);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsample_keeps_first_and_last_frame() {
        let transform = UniformTemporalSubsample::new(2).unwrap();
        let data = Tensor::arange(8, FLOAT_CPU).view([8, 1, 1, 1]);
        let video = Video::new(data).unwrap();
        let out = transform.apply_item(Item::Video(video), &()).unwrap();
        match out {
            Item::Video(out) => {
                assert_eq!(out.num_frames(), 2);
                assert_eq!(out.data().double_value(&[0, 0, 0, 0]), 0.0);
                assert_eq!(out.data().double_value(&[1, 0, 0, 0]), 7.0);
            }
            _ => panic!("expected a video"),
        }
    }
}

//! Composition containers over boxed transforms.

use crate::{common::*, transform::Transform};
use rand::distributions::WeightedIndex;

/// Apply the inner transforms sequentially.
#[derive(Debug)]
pub struct Compose {
    transforms: Vec<Box<dyn Transform>>,
}

impl Compose {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Result<Self> {
        ensure_config!(
            !transforms.is_empty(),
            "compose requires at least one transform"
        );
        Ok(Self { transforms })
    }
}

impl Transform for Compose {
    fn transform(&self, sample: Sample, rng: &mut StdRng) -> Result<Sample> {
        self.transforms
            .iter()
            .try_fold(sample, |sample, transform| transform.transform(sample, rng))
    }
}

/// Apply the inner transform with probability `p`.
#[derive(Debug)]
pub struct RandomApply {
    transform: Box<dyn Transform>,
    p: f64,
}

impl RandomApply {
    pub fn new(transform: Box<dyn Transform>, p: f64) -> Result<Self> {
        ensure_config!(
            (0.0..=1.0).contains(&p),
            "probability must be in range 0.0..=1.0, but get {}",
            p
        );
        Ok(Self { transform, p })
    }
}

impl Transform for RandomApply {
    fn transform(&self, sample: Sample, rng: &mut StdRng) -> Result<Sample> {
        if !rng.gen_bool(self.p) {
            return Ok(sample);
        }
        self.transform.transform(sample, rng)
    }
}

/// Apply exactly one inner transform, drawn by weight.
#[derive(Debug)]
pub struct RandomChoice {
    transforms: Vec<Box<dyn Transform>>,
    weights: Vec<f64>,
}

impl RandomChoice {
    /// Uniform weights over the inner transforms.
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Result<Self> {
        let weights = vec![1.0; transforms.len()];
        Self::with_probabilities(transforms, weights)
    }

    pub fn with_probabilities(
        transforms: Vec<Box<dyn Transform>>,
        probabilities: Vec<f64>,
    ) -> Result<Self> {
        ensure_config!(
            !transforms.is_empty(),
            "random choice requires at least one transform"
        );
        ensure_config!(
            probabilities.len() == transforms.len(),
            "the number of probabilities ({}) does not match the number of transforms ({})",
            probabilities.len(),
            transforms.len()
        );
        ensure_config!(
            probabilities.iter().all(|&weight| weight >= 0.0)
                && probabilities.iter().sum::<f64>() > 0.0,
            "probabilities must be non-negative with a positive sum"
        );
        Ok(Self {
            transforms,
            weights: probabilities,
        })
    }

    /// Legacy constructor kept for callers still passing `p`.
    pub fn with_legacy_p(
        transforms: Vec<Box<dyn Transform>>,
        p: Vec<f64>,
    ) -> Result<Self> {
        warn!("argument p is deprecated and will be removed; use probabilities instead");
        Self::with_probabilities(transforms, p)
    }
}

impl Transform for RandomChoice {
    fn transform(&self, sample: Sample, rng: &mut StdRng) -> Result<Sample> {
        // weights are validated at construction
        let index = match WeightedIndex::new(&self.weights) {
            Ok(distribution) => rng.sample(distribution),
            Err(_) => 0,
        };
        self.transforms[index].transform(sample, rng)
    }
}

/// Apply every inner transform once, in a random order.
#[derive(Debug)]
pub struct RandomOrder {
    transforms: Vec<Box<dyn Transform>>,
}

impl RandomOrder {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Result<Self> {
        ensure_config!(
            !transforms.is_empty(),
            "random order requires at least one transform"
        );
        Ok(Self { transforms })
    }
}

impl Transform for RandomOrder {
    fn transform(&self, sample: Sample, rng: &mut StdRng) -> Result<Sample> {
        let mut order: Vec<usize> = (0..self.transforms.len()).collect();
        order.shuffle(rng);
        order.into_iter().try_fold(sample, |sample, index| {
            self.transforms[index].transform(sample, rng)
        })
    }
}

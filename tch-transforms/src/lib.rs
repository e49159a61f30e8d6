//! Transform dispatch engine and augmentation catalog over typed samples.
//!
//! A transform is invoked once per sample. The engine flattens the sample,
//! classifies which leaf items the transform touches, resolves randomized
//! parameters once for the whole sample, applies the per-item operation,
//! and rebuilds an isomorphic sample. Untouched items pass through with
//! their identity intact.

mod common;

pub use error::*;
pub mod error;

pub use transform::*;
pub mod transform;

pub use classify::*;
pub mod classify;

pub use fill::*;
pub mod fill;

pub mod kernel;

pub use flip::*;
pub mod flip;

pub use rotation::*;
pub mod rotation;

pub use affine::*;
pub mod affine;

pub use perspective::*;
pub mod perspective;

pub use elastic::*;
pub mod elastic;

pub use crop::*;
pub mod crop;

pub use pad::*;
pub mod pad;

pub use resize::*;
pub mod resize;

pub use erase::*;
pub mod erase;

pub use color::*;
pub mod color;

pub use blur::*;
pub mod blur;

pub use mix::*;
pub mod mix;

pub use copy_paste::*;
pub mod copy_paste;

pub use sanitize::*;
pub mod sanitize;

pub use convert::*;
pub mod convert;

pub use temporal::*;
pub mod temporal;

pub use container::*;
pub mod container;

pub use auto_augment::*;
pub mod auto_augment;

//! Typed item model and sample containers for vision data transforms.

mod common;

pub use ::image::DynamicImage;

pub use size::*;
pub mod size;

pub use image::*;
pub mod image;

pub use video::*;
pub mod video;

pub use mask::*;
pub mod mask;

pub use label::*;
pub mod label;

pub use bbox::*;
pub mod bbox;

pub use item::*;
pub mod item;

pub use sample::*;
pub mod sample;

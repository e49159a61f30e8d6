pub use crate::error::{Result, TransformError};
pub(crate) use crate::error::ensure_config;
pub use indexmap::IndexMap;
pub use itertools::{izip, Itertools as _};
pub use log::warn;
pub use noisy_float::prelude::*;
pub use rand::{prelude::*, rngs::StdRng};
pub use serde::{Deserialize, Serialize};
pub use std::fmt::Debug;
pub use tch::{kind::FLOAT_CPU, IndexOp, Kind, Tensor};
pub use tch_datapoints::{
    flatten, unflatten, BoundingBoxes, BoxFormat, DynamicImage, Image, Item, ItemKind, KindSet,
    Label, Mask, OneHotLabel, PixelSize, Sample, Scalar, SpatiallyDescribed as _, Video,
};

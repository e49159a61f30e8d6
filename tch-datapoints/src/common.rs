pub use ::image::{DynamicImage, GenericImageView};
pub use anyhow::{bail, ensure, format_err, Error, Result};
pub use indexmap::IndexMap;
pub use num_traits::{Num, NumCast, ToPrimitive};
pub use serde::{Deserialize, Serialize};
pub use std::{
    fmt,
    fmt::Debug,
    ops::{Deref, RangeInclusive},
};
pub use tch::{IndexOp, Kind, Tensor};
pub use tch_tensor_like::TensorLike;

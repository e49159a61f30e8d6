//! Kernel entry points: the numeric operations behind the dispatcher.
//!
//! Every function takes an item value plus fully resolved parameters and
//! returns a new value of the same kind with its metadata updated. No
//! randomness is drawn here.

use crate::common::*;

pub use geometry::*;
pub mod geometry;

pub use mat3::*;
pub mod mat3;

pub use photometric::*;
pub mod photometric;

pub use warp::*;
pub mod warp;

/// Run a kernel over the trailing `[C, H, W]` planes of a tensor of any
/// leading shape, including bare `[H, W]` masks.
pub(crate) fn map_nchw<F>(data: &Tensor, f: F) -> Tensor
where
    F: FnOnce(&Tensor) -> Tensor,
{
    let size = data.size();
    let ndim = size.len();
    if ndim == 2 {
        let out = f(&data.view([1, 1, size[0], size[1]]));
        let out_size = out.size();
        out.view([out_size[2], out_size[3]])
    } else {
        let lead: i64 = size[..ndim - 3].iter().product();
        let reshaped = data.reshape(&[lead, size[ndim - 3], size[ndim - 2], size[ndim - 1]]);
        let out = f(&reshaped);
        let out_size = out.size();
        let mut new_size = size[..ndim - 3].to_vec();
        new_size.extend_from_slice(&out_size[1..]);
        out.reshape(&new_size)
    }
}

pub(crate) fn is_floating(kind: Kind) -> bool {
    matches!(
        kind,
        Kind::Half | Kind::BFloat16 | Kind::Float | Kind::Double
    )
}

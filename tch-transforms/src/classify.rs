//! Per-item applicability classification.

use crate::common::*;

/// Decide per flat item whether a transform with the given transformable
/// kind set touches it.
///
/// Plain untagged tensors are ambiguous: a single one in the sample is
/// treated as transformable, but when two or more appear none of them are
/// touched and only explicitly tagged items remain candidates.
pub fn candidate_mask(items: &[Item], kinds: KindSet) -> Vec<bool> {
    let plain_tensors = items
        .iter()
        .filter(|item| item.kind() == ItemKind::Tensor)
        .count();
    let plain_is_candidate = kinds.contains(ItemKind::Tensor) && plain_tensors == 1;

    items
        .iter()
        .map(|item| match item.kind() {
            ItemKind::Tensor => plain_is_candidate,
            kind => kinds.contains(kind),
        })
        .collect()
}

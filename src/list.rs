//! Per-obstacle claimant lists.
//!
//! Every occupied voxel owns a doubly linked list of the voxels that claim
//! it as their closest obstacle cell. The links are `VoxelCoord` fields
//! stored inside the ESDF voxels themselves and dereferenced through the
//! layer: the layer is the arena, the coordinate is the stable key, and
//! since voxels are never freed mid-session no dangling link can arise.
//!
//! New claimants are prepended, so the obstacle voxel itself (the first
//! node ever inserted into its own list) stays at the tail. The engine's
//! free-obstacle pass relies on this: starting at the freed obstacle and
//! following `prev_idx` visits every claimant.

use crate::layer::{expect_voxel, expect_voxel_mut, EsdfLayer};
use crate::voxel::VoxelCoord;

/// Removes `node_idx` from the claimant list rooted at `head_idx`. O(1).
///
/// If the node is the current list head, the root's `head_idx` is rewired
/// to the node's successor; otherwise the predecessor's `next_idx` is.
/// The node's own links are cleared.
///
/// # Panics
///
/// Panics if any voxel touched by the rewiring is not allocated, which
/// indicates a propagation-window or linkage bug.
pub fn unlink(layer: &mut EsdfLayer, head_idx: VoxelCoord, node_idx: VoxelCoord) {
    let (prev, next) = {
        let node = expect_voxel(layer, node_idx);
        (node.prev_idx, node.next_idx)
    };

    if let Some(prev_idx) = prev {
        expect_voxel_mut(layer, prev_idx).next_idx = next;
    } else {
        expect_voxel_mut(layer, head_idx).head_idx = next;
    }
    if let Some(next_idx) = next {
        expect_voxel_mut(layer, next_idx).prev_idx = prev;
    }

    let node = expect_voxel_mut(layer, node_idx);
    node.prev_idx = None;
    node.next_idx = None;
}

/// Prepends `node_idx` to the claimant list rooted at `head_idx`. O(1).
///
/// The node must not currently be a member of any list (its `prev_idx` and
/// `next_idx` are `None`). Its `prev_idx` stays `None`: it becomes the new
/// head.
///
/// # Panics
///
/// Panics if the root or the current head voxel is not allocated.
pub fn insert_head(layer: &mut EsdfLayer, head_idx: VoxelCoord, node_idx: VoxelCoord) {
    let old_head = expect_voxel(layer, head_idx).head_idx;
    if let Some(old_head_idx) = old_head {
        expect_voxel_mut(layer, old_head_idx).prev_idx = Some(node_idx);
        expect_voxel_mut(layer, node_idx).next_idx = Some(old_head_idx);
    }
    expect_voxel_mut(layer, head_idx).head_idx = Some(node_idx);
}

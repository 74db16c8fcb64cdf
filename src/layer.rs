//! Block-tiled sparse voxel layers.
//!
//! A [`Layer`] partitions the infinite voxel lattice into cubic [`Block`]s
//! of `voxels_per_side³` cells and allocates blocks lazily. Blocks are the
//! allocation unit; voxels are addressed by a global [`VoxelCoord`] and are
//! never freed during a session, which makes the layer a stable arena for
//! the index-linked lists threaded through ESDF voxels.
//!
//! Block decomposition uses floor division (`div_euclid`/`rem_euclid`), so
//! negative coordinates tile exactly like positive ones and the lattice does
//! not fragment at the origin.

use std::collections::HashMap;

use crate::cell::{EsdfVoxel, OccupancyVoxel};
use crate::voxel::VoxelCoord;

/// A layer of occupancy voxels, fed by an upstream sensor pipeline.
pub type OccupancyLayer = Layer<OccupancyVoxel>;

/// A layer of ESDF voxels, owned and maintained by the engine.
pub type EsdfLayer = Layer<EsdfVoxel>;

/// A cubic tile of `voxels_per_side³` voxels.
///
/// Voxels inside a block are addressed by a linear index with X varying
/// fastest: `linear = x + side·y + side²·z`.
#[derive(Debug, Clone, PartialEq)]
pub struct Block<V> {
    updated: bool,
    voxels: Vec<V>,
}

impl<V: Default> Block<V> {
    fn new(side: i32) -> Self {
        let count = usize::try_from(side).unwrap_or(1).pow(3);
        Self {
            updated: false,
            voxels: (0..count).map(|_| V::default()).collect(),
        }
    }
}

impl<V> Block<V> {
    /// Returns the number of voxels in the block.
    #[must_use]
    pub fn num_voxels(&self) -> usize {
        self.voxels.len()
    }

    /// Returns the voxel at a linear index, if in bounds.
    #[must_use]
    pub fn voxel(&self, linear: usize) -> Option<&V> {
        self.voxels.get(linear)
    }

    /// Returns the voxel at a linear index mutably, if in bounds.
    pub fn voxel_mut(&mut self, linear: usize) -> Option<&mut V> {
        self.voxels.get_mut(linear)
    }

    /// Whether the block carries the updated mark.
    ///
    /// The occupancy layer uses this mark to flag blocks with changes the
    /// ESDF engine has not consumed yet; the ESDF layer uses it to flag
    /// blocks touched by the last cycle.
    #[must_use]
    pub const fn is_updated(&self) -> bool {
        self.updated
    }

    /// Sets or clears the updated mark.
    pub const fn set_updated(&mut self, updated: bool) {
        self.updated = updated;
    }
}

/// A sparse voxel layer tiled into lazily allocated blocks.
///
/// # Example
///
/// ```
/// use cf_esdf::{OccupancyLayer, VoxelCoord};
///
/// let mut layer = OccupancyLayer::new(0.1, 16);
/// layer.voxel_mut_or_allocate(VoxelCoord::new(-1, 0, 0)).observed = true;
///
/// // floor semantics: voxel -1 lives in block -1, not block 0
/// assert_eq!(
///     layer.block_index_of(VoxelCoord::new(-1, 0, 0)),
///     VoxelCoord::new(-1, 0, 0),
/// );
/// assert!(layer.voxel(VoxelCoord::new(-1, 0, 0)).is_some());
/// assert!(layer.voxel(VoxelCoord::new(40, 0, 0)).is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Layer<V> {
    voxel_size: f64,
    voxels_per_side: usize,
    side: i32,
    blocks: HashMap<VoxelCoord, Block<V>>,
}

impl<V> Layer<V> {
    /// Creates an empty layer.
    ///
    /// `voxel_size` is clamped to a positive value and `voxels_per_side`
    /// to at least 1.
    #[must_use]
    pub fn new(voxel_size: f64, voxels_per_side: usize) -> Self {
        let voxels_per_side = voxels_per_side.max(1);
        Self {
            voxel_size: voxel_size.abs().max(f64::EPSILON),
            voxels_per_side,
            side: i32::try_from(voxels_per_side).unwrap_or(i32::MAX),
            blocks: HashMap::new(),
        }
    }

    /// Returns the voxel size in meters.
    #[must_use]
    pub const fn voxel_size(&self) -> f64 {
        self.voxel_size
    }

    /// Returns the number of voxels along one block edge.
    #[must_use]
    pub const fn voxels_per_side(&self) -> usize {
        self.voxels_per_side
    }

    /// Returns the number of allocated blocks.
    #[must_use]
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Returns the index of the block containing a global coordinate.
    ///
    /// Uses floor division, so negative coordinates decompose correctly.
    #[must_use]
    pub const fn block_index_of(&self, global: VoxelCoord) -> VoxelCoord {
        VoxelCoord::new(
            global.x.div_euclid(self.side),
            global.y.div_euclid(self.side),
            global.z.div_euclid(self.side),
        )
    }

    /// Returns the linear in-block index of a global coordinate.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn linear_index_of(&self, global: VoxelCoord) -> usize {
        // rem_euclid is always in 0..side
        let lx = global.x.rem_euclid(self.side);
        let ly = global.y.rem_euclid(self.side);
        let lz = global.z.rem_euclid(self.side);
        (lx + self.side * (ly + self.side * lz)) as usize
    }

    /// Reassembles a global coordinate from a block index and a linear
    /// in-block index.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn global_index_of(&self, block: VoxelCoord, linear: usize) -> VoxelCoord {
        // linear indices are bounded by voxels_per_side³
        let lin = linear as i64;
        let side = i64::from(self.side);
        let lx = (lin % side) as i32;
        let ly = ((lin / side) % side) as i32;
        let lz = (lin / (side * side)) as i32;
        VoxelCoord::new(
            block.x * self.side + lx,
            block.y * self.side + ly,
            block.z * self.side + lz,
        )
    }

    /// Returns the block at an index, if allocated.
    #[must_use]
    pub fn block(&self, index: VoxelCoord) -> Option<&Block<V>> {
        self.blocks.get(&index)
    }

    /// Returns the block at an index mutably, if allocated.
    pub fn block_mut(&mut self, index: VoxelCoord) -> Option<&mut Block<V>> {
        self.blocks.get_mut(&index)
    }

    /// Whether a block is allocated at an index.
    #[must_use]
    pub fn has_block(&self, index: VoxelCoord) -> bool {
        self.blocks.contains_key(&index)
    }

    /// Returns the voxel at a global coordinate, if its block is allocated.
    #[must_use]
    pub fn voxel(&self, global: VoxelCoord) -> Option<&V> {
        self.blocks
            .get(&self.block_index_of(global))?
            .voxel(self.linear_index_of(global))
    }

    /// Returns the voxel at a global coordinate mutably, if its block is
    /// allocated.
    pub fn voxel_mut(&mut self, global: VoxelCoord) -> Option<&mut V> {
        let block_index = self.block_index_of(global);
        let linear = self.linear_index_of(global);
        self.blocks.get_mut(&block_index)?.voxel_mut(linear)
    }

    /// Returns the indices of all blocks carrying the updated mark.
    #[must_use]
    pub fn updated_blocks(&self) -> Vec<VoxelCoord> {
        self.blocks
            .iter()
            .filter(|(_, block)| block.is_updated())
            .map(|(index, _)| *index)
            .collect()
    }

    /// Iterates over all allocated blocks.
    pub fn blocks(&self) -> impl Iterator<Item = (&VoxelCoord, &Block<V>)> {
        self.blocks.iter()
    }

    /// Iterates over all allocated blocks mutably.
    pub fn blocks_mut(&mut self) -> impl Iterator<Item = (&VoxelCoord, &mut Block<V>)> {
        self.blocks.iter_mut()
    }

    /// Iterates over every allocated voxel with its global coordinate.
    pub fn voxels(&self) -> impl Iterator<Item = (VoxelCoord, &V)> {
        self.blocks.iter().flat_map(move |(block_index, block)| {
            (0..block.num_voxels()).filter_map(move |linear| {
                block
                    .voxel(linear)
                    .map(|voxel| (self.global_index_of(*block_index, linear), voxel))
            })
        })
    }
}

impl<V: Default> Layer<V> {
    /// Allocates (or retrieves) the block at an index.
    pub fn allocate_block(&mut self, index: VoxelCoord) -> &mut Block<V> {
        let side = self.side;
        self.blocks.entry(index).or_insert_with(|| Block::new(side))
    }

    /// Returns the voxel at a global coordinate, allocating its block if
    /// needed.
    pub fn voxel_mut_or_allocate(&mut self, global: VoxelCoord) -> &mut V {
        let block_index = self.block_index_of(global);
        let linear = self.linear_index_of(global);
        let block = self.allocate_block(block_index);
        match block.voxel_mut(linear) {
            Some(voxel) => voxel,
            None => missing_voxel(global),
        }
    }
}

/// Looks up a voxel that the propagation window guarantees to exist.
pub(crate) fn expect_voxel<V>(layer: &Layer<V>, global: VoxelCoord) -> &V {
    match layer.voxel(global) {
        Some(voxel) => voxel,
        None => missing_voxel(global),
    }
}

/// Mutable counterpart of [`expect_voxel`].
pub(crate) fn expect_voxel_mut<V>(layer: &mut Layer<V>, global: VoxelCoord) -> &mut V {
    match layer.voxel_mut(global) {
        Some(voxel) => voxel,
        None => missing_voxel(global),
    }
}

#[cold]
fn missing_voxel(global: VoxelCoord) -> ! {
    panic!(
        "voxel {global:?} is not allocated; every voxel reachable by the \
         wavefront must lie inside the pre-allocated propagation window"
    )
}

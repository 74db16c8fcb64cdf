//! Voxel payloads for the occupancy and ESDF layers.

use crate::voxel::VoxelCoord;

/// A single cell of the occupancy layer.
///
/// The engine only reads this type: the occupancy layer is fed by an
/// upstream sensor pipeline and is read-only during propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OccupancyVoxel {
    /// The cell has been seen by a sensor at least once.
    pub observed: bool,
    /// The cell is currently occupied by an obstacle.
    pub occupied: bool,
    /// The cell lies on the interior side of a surface.
    pub behind: bool,
}

/// A single cell of the ESDF layer.
///
/// Besides the signed distance itself, every voxel carries the identity of
/// its closest obstacle cell (`coc_idx`) and the intrusive doubly-linked
/// list fields that thread it into that obstacle's claimant list. The layer
/// is the arena; `VoxelCoord` values are the stable keys, so absent links
/// are simply `None` rather than a sentinel coordinate.
///
/// `self_idx` is written once, on first observation, and is immutable
/// afterwards. `coc_idx` and the list links are mutated only by the
/// propagation engine. Voxels are never freed during a session.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EsdfVoxel {
    /// The paired occupancy cell has been observed at least once.
    pub observed: bool,
    /// Sign bit, copied from occupancy: the distance is stored negative.
    pub behind: bool,
    /// Scratch flag for external consumers; cleared by
    /// [`EsdfIntegrator::reset_fixed`](crate::EsdfIntegrator::reset_fixed).
    pub fixed: bool,
    /// Signed Euclidean distance to the closest obstacle cell, in meters.
    pub distance: f64,
    /// This voxel's own lattice coordinate, set on first observation.
    pub self_idx: Option<VoxelCoord>,
    /// The closest obstacle cell currently claimed, if any.
    pub coc_idx: Option<VoxelCoord>,
    /// When this voxel is an obstacle: head of the list of its claimants.
    pub head_idx: Option<VoxelCoord>,
    /// Previous node in the claimant list this voxel belongs to.
    pub prev_idx: Option<VoxelCoord>,
    /// Next node in the claimant list this voxel belongs to.
    pub next_idx: Option<VoxelCoord>,
    /// Diagnostic error value; not consulted by propagation.
    pub error: f64,
}

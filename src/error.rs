//! Error types for ESDF maintenance.

use crate::voxel::VoxelCoord;

/// Result alias for fallible ESDF operations.
pub type EsdfResult<T> = Result<T, EsdfError>;

/// Errors that can occur while configuring or running the ESDF engine.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EsdfError {
    /// The bucket queue needs at least one bucket.
    #[error("bucket count must be at least 1, got {0}")]
    InvalidBucketCount(usize),

    /// A configured distance is non-positive or non-finite.
    #[error("{name} must be positive and finite, got {value}")]
    InvalidDistance {
        /// Name of the offending configuration field.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// The propagation pad is smaller than the neighborhood's maximum hop.
    #[error(
        "range boundary offset {offset:?} is below the maximum propagation \
         hop of {hop} voxels on at least one axis"
    )]
    RangePadTooSmall {
        /// The rejected pad.
        offset: VoxelCoord,
        /// Minimum admissible pad per axis.
        hop: i32,
    },

    /// The occupancy and ESDF layers tile space differently.
    #[error("occupancy layer has {occupancy} voxels per side but the ESDF layer has {esdf}")]
    VoxelsPerSideMismatch {
        /// Voxels per block side in the occupancy layer.
        occupancy: usize,
        /// Voxels per block side in the ESDF layer.
        esdf: usize,
    },

    /// The occupancy and ESDF layers use different voxel sizes.
    #[error("occupancy voxel size {occupancy} does not match ESDF voxel size {esdf}")]
    VoxelSizeMismatch {
        /// Voxel size of the occupancy layer.
        occupancy: f64,
        /// Voxel size of the ESDF layer.
        esdf: f64,
    },
}

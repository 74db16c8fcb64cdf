//! Configuration for the ESDF engine.

use crate::error::{EsdfError, EsdfResult};
use crate::voxel::{VoxelCoord, MAX_NEIGHBOR_HOP};

/// Parameters of the incremental ESDF update.
///
/// # Example
///
/// ```
/// use cf_esdf::{EsdfConfig, VoxelCoord};
///
/// // Default parameters: 2 m horizon, patch refinement on
/// let config = EsdfConfig::default();
/// assert!((config.default_distance_m - 2.0).abs() < 1e-10);
/// assert!(config.patch_on);
///
/// // Builder-style overrides
/// let config = EsdfConfig::default()
///     .default_distance(5.0)
///     .range_boundary_offset(VoxelCoord::new(20, 20, 5))
///     .patch(false);
/// assert!(!config.patch_on);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EsdfConfig {
    /// Distance assigned to observed voxels with no claimed obstacle, in
    /// meters. Also the upper end of the bucket queue's key range.
    pub default_distance_m: f64,

    /// Magnitude of the initial negative distance seeded into voxels that
    /// lie behind a surface, in meters.
    pub max_behind_surface_m: f64,

    /// Pad applied to the update range on every side, in voxels.
    /// Propagation refuses to touch voxels outside the padded window, so
    /// each component must be at least the neighborhood's maximum hop.
    pub range_boundary_offset: VoxelCoord,

    /// Number of buckets in the wavefront priority queue.
    pub num_buckets: usize,

    /// Enables the patch refinement pass, which lets a popped voxel adopt
    /// a strictly better obstacle from an already-converged neighbor.
    pub patch_on: bool,

    /// Stops the re-seeding neighbor scan of freed claimants at the first
    /// neighbor holding a still-occupied obstacle, instead of scanning the
    /// whole neighborhood.
    pub early_break: bool,
}

impl Default for EsdfConfig {
    fn default() -> Self {
        Self {
            default_distance_m: 2.0,
            max_behind_surface_m: 1.0,
            range_boundary_offset: VoxelCoord::new(10, 10, 10),
            num_buckets: 20,
            patch_on: true,
            early_break: true,
        }
    }
}

impl EsdfConfig {
    /// Sets the default (unclaimed) distance.
    #[must_use]
    pub const fn default_distance(mut self, meters: f64) -> Self {
        self.default_distance_m = meters;
        self
    }

    /// Sets the behind-surface seed magnitude.
    #[must_use]
    pub const fn max_behind_surface(mut self, meters: f64) -> Self {
        self.max_behind_surface_m = meters;
        self
    }

    /// Sets the propagation window pad.
    #[must_use]
    pub const fn range_boundary_offset(mut self, offset: VoxelCoord) -> Self {
        self.range_boundary_offset = offset;
        self
    }

    /// Sets the bucket count of the wavefront queue.
    #[must_use]
    pub const fn num_buckets(mut self, buckets: usize) -> Self {
        self.num_buckets = buckets;
        self
    }

    /// Enables or disables the patch refinement pass.
    #[must_use]
    pub const fn patch(mut self, on: bool) -> Self {
        self.patch_on = on;
        self
    }

    /// Enables or disables the early break of the re-seeding scan.
    #[must_use]
    pub const fn early_break(mut self, on: bool) -> Self {
        self.early_break = on;
        self
    }

    /// Checks the configuration for internally consistent values.
    ///
    /// # Errors
    ///
    /// Returns an error if a distance is non-positive or non-finite, the
    /// bucket count is zero, or the range pad is smaller than the
    /// neighborhood's maximum hop on any axis.
    pub fn validate(&self) -> EsdfResult<()> {
        if self.num_buckets == 0 {
            return Err(EsdfError::InvalidBucketCount(self.num_buckets));
        }
        if !(self.default_distance_m.is_finite() && self.default_distance_m > 0.0) {
            return Err(EsdfError::InvalidDistance {
                name: "default_distance_m",
                value: self.default_distance_m,
            });
        }
        if !(self.max_behind_surface_m.is_finite() && self.max_behind_surface_m > 0.0) {
            return Err(EsdfError::InvalidDistance {
                name: "max_behind_surface_m",
                value: self.max_behind_surface_m,
            });
        }
        let offset = self.range_boundary_offset;
        if offset.x < MAX_NEIGHBOR_HOP || offset.y < MAX_NEIGHBOR_HOP || offset.z < MAX_NEIGHBOR_HOP
        {
            return Err(EsdfError::RangePadTooSmall {
                offset,
                hop: MAX_NEIGHBOR_HOP,
            });
        }
        Ok(())
    }
}

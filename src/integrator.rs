//! The incremental ESDF update engine.
//!
//! One update cycle consumes the occupancy blocks flagged as pending, the
//! externally supplied insert/delete change lists, and rewrites the signed
//! distance field inside a bounded window around the changes. The cycle has
//! three stages:
//!
//! 1. **Ingest**: seed identity, sign, and initial distance of every newly
//!    observed voxel from the occupancy layer.
//! 2. **Initialization**: newly occupied voxels become zero-distance
//!    sources; every claimant of a newly freed obstacle loses its claim and
//!    re-seeds itself from neighbors whose obstacle survived.
//! 3. **Wavefront**: a bucketed best-first relaxation lowers distances
//!    outward from the seeded sources, optionally patching suboptimal
//!    claims inherited from initialization.
//!
//! Per-voxel distances only decrease between re-seeds and every relaxation
//! is idempotent, so the wavefront tolerates the stale entries the bucket
//! queue is allowed to hold.

use tracing::debug;

use crate::bounds::GridBounds;
use crate::config::EsdfConfig;
use crate::error::{EsdfError, EsdfResult};
use crate::layer::{expect_voxel, expect_voxel_mut, EsdfLayer, OccupancyLayer};
use crate::list;
use crate::queue::BucketQueue;
use crate::voxel::VoxelCoord;

/// Incremental Euclidean signed distance field integrator.
///
/// Owns the ESDF layer and borrows the occupancy layer for the duration of
/// each update call; a single logical writer drives both grids during a
/// cycle. Between cycles the caller resupplies the change lists via
/// [`load_insert_list`](Self::load_insert_list) and
/// [`load_delete_list`](Self::load_delete_list).
///
/// See the crate-level documentation for a complete example.
#[derive(Debug)]
pub struct EsdfIntegrator {
    config: EsdfConfig,
    esdf: EsdfLayer,
    queue: BucketQueue,
    insert_list: Vec<VoxelCoord>,
    delete_list: Vec<VoxelCoord>,
    window: Option<GridBounds>,
    total_expanded: u64,
}

impl EsdfIntegrator {
    /// Creates an integrator over an ESDF layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails
    /// [`EsdfConfig::validate`].
    pub fn new(config: EsdfConfig, esdf_layer: EsdfLayer) -> EsdfResult<Self> {
        config.validate()?;
        let queue = BucketQueue::new(config.num_buckets, config.default_distance_m);
        Ok(Self {
            config,
            esdf: esdf_layer,
            queue,
            insert_list: Vec::new(),
            delete_list: Vec::new(),
            window: None,
            total_expanded: 0,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &EsdfConfig {
        &self.config
    }

    /// Returns the maintained ESDF layer.
    #[must_use]
    pub const fn esdf_layer(&self) -> &EsdfLayer {
        &self.esdf
    }

    /// Returns the maintained ESDF layer mutably.
    pub const fn esdf_layer_mut(&mut self) -> &mut EsdfLayer {
        &mut self.esdf
    }

    /// Total number of wavefront expansions since construction.
    #[must_use]
    pub const fn total_expanded(&self) -> u64 {
        self.total_expanded
    }

    /// Supplies the voxels that became occupied since the last cycle.
    pub fn load_insert_list(&mut self, list: Vec<VoxelCoord>) {
        self.insert_list = list;
    }

    /// Supplies the voxels that became free since the last cycle.
    pub fn load_delete_list(&mut self, list: Vec<VoxelCoord>) {
        self.delete_list = list;
    }

    /// Runs one update cycle against the occupancy layer.
    ///
    /// Consumes the loaded change lists and every occupancy block whose
    /// updated mark is set. If `clear_updated` is true, the marks of the
    /// consumed blocks are cleared afterwards.
    ///
    /// The occupancy layer is read-only during propagation; it is only
    /// written to clear the marks.
    ///
    /// # Errors
    ///
    /// Returns an error if the occupancy layer's `voxels_per_side` or
    /// `voxel_size` differ from the ESDF layer's.
    ///
    /// # Panics
    ///
    /// Panics if propagation reaches a voxel outside the pre-allocated
    /// window or pops a voxel without a claimed obstacle; both indicate a
    /// bug in range allocation or list linkage, not a recoverable state.
    pub fn update_from_occ_layer(
        &mut self,
        occ: &mut OccupancyLayer,
        clear_updated: bool,
    ) -> EsdfResult<()> {
        self.check_layers(occ)?;

        let pending = occ.updated_blocks();
        debug!(
            blocks = pending.len(),
            inserts = self.insert_list.len(),
            deletes = self.delete_list.len(),
            "starting ESDF update cycle"
        );

        self.ingest_occupancy(occ, &pending);

        if let Some(window) = self.compute_window() {
            self.allocate_window(window);
            self.window = Some(window);
            self.run_initialization(occ, window);
            self.run_propagation(window);
        }

        if clear_updated {
            for block_index in pending {
                if let Some(block) = occ.block_mut(block_index) {
                    block.set_updated(false);
                }
            }
        }
        Ok(())
    }

    /// Writes the diagnostic error field of a voxel, if it exists.
    ///
    /// This is a hook for external evaluation tooling; propagation never
    /// reads the field.
    pub fn assign_error(&mut self, index: VoxelCoord, error: f64) {
        if let Some(voxel) = self.esdf.voxel_mut(index) {
            voxel.error = error;
        }
    }

    /// Clears the `fixed` scratch flag over the last propagation window.
    pub fn reset_fixed(&mut self) {
        if let Some(window) = self.window {
            for index in window.iter() {
                if let Some(voxel) = self.esdf.voxel_mut(index) {
                    voxel.fixed = false;
                }
            }
        }
    }

    fn check_layers(&self, occ: &OccupancyLayer) -> EsdfResult<()> {
        if occ.voxels_per_side() != self.esdf.voxels_per_side() {
            return Err(EsdfError::VoxelsPerSideMismatch {
                occupancy: occ.voxels_per_side(),
                esdf: self.esdf.voxels_per_side(),
            });
        }
        if (occ.voxel_size() - self.esdf.voxel_size()).abs() > f64::EPSILON {
            return Err(EsdfError::VoxelSizeMismatch {
                occupancy: occ.voxel_size(),
                esdf: self.esdf.voxel_size(),
            });
        }
        Ok(())
    }

    /// Seeds ESDF voxel identity, sign, and initial distance from every
    /// pending occupancy block.
    fn ingest_occupancy(&mut self, occ: &OccupancyLayer, pending: &[VoxelCoord]) {
        let default_distance = self.config.default_distance_m;
        let behind_distance = self.config.max_behind_surface_m;

        for &block_index in pending {
            let Some(occ_block) = occ.block(block_index) else {
                continue;
            };
            self.esdf.allocate_block(block_index).set_updated(true);

            for linear in 0..occ_block.num_voxels() {
                let Some(occ_voxel) = occ_block.voxel(linear) else {
                    continue;
                };
                if !occ_voxel.observed {
                    continue;
                }
                let behind = occ_voxel.behind;
                let global = self.esdf.global_index_of(block_index, linear);
                let voxel = expect_voxel_mut(&mut self.esdf, global);
                voxel.behind = behind;
                if voxel.self_idx.is_none() {
                    voxel.observed = true;
                    voxel.self_idx = Some(global);
                    voxel.distance = if behind {
                        -behind_distance
                    } else {
                        default_distance
                    };
                }
            }
        }
    }

    /// Bounding box of both change lists, padded by the configured offset.
    /// `None` when there is nothing to propagate.
    fn compute_window(&self) -> Option<GridBounds> {
        let mut changes = self.insert_list.iter().chain(self.delete_list.iter());
        let mut range = GridBounds::from_point(*changes.next()?);
        for &index in changes {
            range.expand_to_include(index);
        }
        Some(range.padded(self.config.range_boundary_offset))
    }

    /// Allocates every block overlapping the window and marks it updated.
    fn allocate_window(&mut self, window: GridBounds) {
        let block_min = self.esdf.block_index_of(window.min);
        let block_max = self.esdf.block_index_of(window.max);
        for block_index in GridBounds::new(block_min, block_max) {
            self.esdf.allocate_block(block_index).set_updated(true);
        }
    }

    /// Initialization stage: turn newly occupied voxels into zero-distance
    /// sources and strip the claimants of newly freed obstacles.
    fn run_initialization(&mut self, occ: &OccupancyLayer, window: GridBounds) {
        let default_distance = self.config.default_distance_m;
        let early_break = self.config.early_break;
        let scale = self.esdf.voxel_size();

        let inserts = std::mem::take(&mut self.insert_list);
        for cur_idx in inserts {
            // drop any previous claim, then become a source claiming itself
            if let Some(coc_idx) = expect_voxel(&self.esdf, cur_idx).coc_idx {
                list::unlink(&mut self.esdf, coc_idx, cur_idx);
            }
            {
                let cur = expect_voxel_mut(&mut self.esdf, cur_idx);
                cur.distance = 0.0;
                cur.coc_idx = Some(cur_idx);
            }
            list::insert_head(&mut self.esdf, cur_idx, cur_idx);
            self.queue.push(cur_idx, 0.0);
        }

        let deletes = std::mem::take(&mut self.delete_list);
        for cur_idx in deletes {
            // The freed obstacle sits at the tail of its own claimant list,
            // so following prev_idx from it visits every claimant, the
            // obstacle voxel itself included.
            let mut walk = Some(cur_idx);
            while let Some(temp_idx) = walk {
                expect_voxel_mut(&mut self.esdf, temp_idx).coc_idx = None;

                if window.contains(temp_idx) {
                    expect_voxel_mut(&mut self.esdf, temp_idx).distance = default_distance;

                    // adopt the best surviving obstacle among the neighbors
                    for nbr_idx in temp_idx.neighbors() {
                        if !window.contains(nbr_idx) {
                            continue;
                        }
                        let nbr = expect_voxel(&self.esdf, nbr_idx);
                        if !nbr.observed {
                            continue;
                        }
                        let Some(nbr_coc_idx) = nbr.coc_idx else {
                            continue;
                        };
                        // the neighbor's claim may be stale within this
                        // cycle; only a still-occupied cell may be adopted
                        if expect_voxel(occ, nbr_coc_idx).occupied {
                            let candidate = nbr_coc_idx.euclidean_distance(temp_idx) * scale;
                            let temp = expect_voxel_mut(&mut self.esdf, temp_idx);
                            if candidate < temp.distance.abs() {
                                temp.distance = candidate;
                                temp.coc_idx = Some(nbr_coc_idx);
                            }
                            if early_break {
                                break;
                            }
                        }
                    }
                }

                let (next_walk, adopted, behind) = {
                    let temp = expect_voxel_mut(&mut self.esdf, temp_idx);
                    let prev = temp.prev_idx;
                    temp.prev_idx = None;
                    temp.next_idx = None;
                    (prev, temp.coc_idx, temp.behind)
                };

                if let Some(coc_idx) = adopted {
                    let distance = {
                        let temp = expect_voxel_mut(&mut self.esdf, temp_idx);
                        if behind {
                            temp.distance = -temp.distance;
                        }
                        temp.distance
                    };
                    self.queue.push(temp_idx, distance);
                    list::insert_head(&mut self.esdf, coc_idx, temp_idx);
                }

                walk = next_walk;
            }
            expect_voxel_mut(&mut self.esdf, cur_idx).head_idx = None;
        }
    }

    /// Wavefront stage: best-first relaxation from the seeded sources.
    #[allow(clippy::too_many_lines)]
    fn run_propagation(&mut self, window: GridBounds) {
        let scale = self.esdf.voxel_size();
        let patch_on = self.config.patch_on;
        let mut expanded: u64 = 0;
        let mut patched: u64 = 0;

        while let Some(cur_idx) = self.queue.pop() {
            // Initialization only queues voxels holding a valid claim and
            // nothing later in the cycle clears one, so a claimless pop is
            // a linkage bug.
            let Some(coc_idx) = expect_voxel(&self.esdf, cur_idx).coc_idx else {
                panic!("queued voxel {cur_idx:?} has no claimed obstacle");
            };
            expanded += 1;

            if patch_on {
                // Patch pass: a claim inherited from initialization can be
                // suboptimal; borrow a strictly better obstacle from any
                // neighbor, then requeue and revisit instead of relaxing.
                let mut adopted = None;
                for nbr_idx in cur_idx.neighbors() {
                    if !window.contains(nbr_idx) {
                        continue;
                    }
                    let nbr = expect_voxel(&self.esdf, nbr_idx);
                    if !nbr.observed {
                        continue;
                    }
                    let Some(nbr_coc_idx) = nbr.coc_idx else {
                        continue;
                    };
                    let candidate = nbr_coc_idx.euclidean_distance(cur_idx) * scale;
                    let cur = expect_voxel_mut(&mut self.esdf, cur_idx);
                    if candidate < cur.distance.abs() {
                        cur.distance = candidate;
                        cur.coc_idx = Some(nbr_coc_idx);
                        adopted = Some(nbr_coc_idx);
                    }
                }
                if let Some(new_coc_idx) = adopted {
                    let distance = {
                        let cur = expect_voxel_mut(&mut self.esdf, cur_idx);
                        if cur.behind {
                            cur.distance = -cur.distance;
                        }
                        cur.distance
                    };
                    list::unlink(&mut self.esdf, coc_idx, cur_idx);
                    list::insert_head(&mut self.esdf, new_coc_idx, cur_idx);
                    self.queue.push(cur_idx, distance);
                    patched += 1;
                    continue;
                }
            }

            // Relaxation: try to shorten every neighbor through this
            // voxel's obstacle.
            for nbr_idx in cur_idx.neighbors() {
                if !window.contains(nbr_idx) {
                    continue;
                }
                let (observed, nbr_distance, nbr_behind, nbr_coc) = {
                    let nbr = expect_voxel(&self.esdf, nbr_idx);
                    (nbr.observed, nbr.distance, nbr.behind, nbr.coc_idx)
                };
                if !observed || nbr_distance.abs() <= 0.0 {
                    continue;
                }
                let candidate = coc_idx.euclidean_distance(nbr_idx) * scale;
                if candidate < nbr_distance.abs() {
                    let signed = if nbr_behind { -candidate } else { candidate };
                    expect_voxel_mut(&mut self.esdf, nbr_idx).distance = signed;
                    if let Some(old_coc_idx) = nbr_coc {
                        list::unlink(&mut self.esdf, old_coc_idx, nbr_idx);
                    }
                    expect_voxel_mut(&mut self.esdf, nbr_idx).coc_idx = Some(coc_idx);
                    list::insert_head(&mut self.esdf, coc_idx, nbr_idx);
                    self.queue.push(nbr_idx, signed);
                }
            }
        }

        self.total_expanded += expanded;
        debug!(expanded, patched, "wavefront propagation complete");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const VOXEL_SIZE: f64 = 0.1;

    fn layers() -> (OccupancyLayer, EsdfLayer) {
        (
            OccupancyLayer::new(VOXEL_SIZE, 8),
            EsdfLayer::new(VOXEL_SIZE, 8),
        )
    }

    fn observe_region(occ: &mut OccupancyLayer, bounds: GridBounds) {
        for index in bounds {
            occ.voxel_mut_or_allocate(index).observed = true;
        }
        for (_, block) in occ.blocks_mut() {
            block.set_updated(true);
        }
    }

    fn occupy(occ: &mut OccupancyLayer, index: VoxelCoord) {
        let block_index = occ.block_index_of(index);
        let voxel = occ.voxel_mut_or_allocate(index);
        voxel.observed = true;
        voxel.occupied = true;
        if let Some(block) = occ.block_mut(block_index) {
            block.set_updated(true);
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = EsdfConfig::default().num_buckets(0);
        assert!(EsdfIntegrator::new(config, EsdfLayer::new(0.1, 8)).is_err());
    }

    #[test]
    fn test_rejects_mismatched_layers() {
        let (_, esdf) = layers();
        let mut integrator = EsdfIntegrator::new(EsdfConfig::default(), esdf).unwrap();

        let mut wrong_side = OccupancyLayer::new(VOXEL_SIZE, 16);
        assert!(matches!(
            integrator.update_from_occ_layer(&mut wrong_side, false),
            Err(EsdfError::VoxelsPerSideMismatch { .. })
        ));

        let mut wrong_size = OccupancyLayer::new(0.2, 8);
        assert!(matches!(
            integrator.update_from_occ_layer(&mut wrong_size, false),
            Err(EsdfError::VoxelSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_ingest_seeds_new_voxels() {
        let (mut occ, esdf) = layers();
        observe_region(
            &mut occ,
            GridBounds::new(VoxelCoord::new(0, 0, 0), VoxelCoord::new(3, 3, 0)),
        );
        occ.voxel_mut_or_allocate(VoxelCoord::new(1, 0, 0)).behind = true;

        let mut integrator = EsdfIntegrator::new(EsdfConfig::default(), esdf).unwrap();
        integrator.update_from_occ_layer(&mut occ, true).unwrap();

        let voxel = integrator
            .esdf_layer()
            .voxel(VoxelCoord::new(2, 2, 0))
            .unwrap();
        assert!(voxel.observed);
        assert_eq!(voxel.self_idx, Some(VoxelCoord::new(2, 2, 0)));
        assert_eq!(voxel.distance, 2.0);
        assert_eq!(voxel.coc_idx, None);

        let behind = integrator
            .esdf_layer()
            .voxel(VoxelCoord::new(1, 0, 0))
            .unwrap();
        assert!(behind.behind);
        assert_eq!(behind.distance, -1.0);

        // consumed marks were cleared
        assert!(occ.updated_blocks().is_empty());
    }

    #[test]
    fn test_ingest_keeps_marks_without_clear_flag() {
        let (mut occ, esdf) = layers();
        observe_region(
            &mut occ,
            GridBounds::from_point(VoxelCoord::origin()),
        );
        let mut integrator = EsdfIntegrator::new(EsdfConfig::default(), esdf).unwrap();
        integrator.update_from_occ_layer(&mut occ, false).unwrap();
        assert!(!occ.updated_blocks().is_empty());
    }

    #[test]
    fn test_single_obstacle_distances() {
        let (mut occ, esdf) = layers();
        observe_region(
            &mut occ,
            GridBounds::new(VoxelCoord::new(-4, -4, -4), VoxelCoord::new(4, 4, 4)),
        );
        occupy(&mut occ, VoxelCoord::origin());

        let mut integrator = EsdfIntegrator::new(EsdfConfig::default(), esdf).unwrap();
        integrator.load_insert_list(vec![VoxelCoord::origin()]);
        integrator.update_from_occ_layer(&mut occ, true).unwrap();

        let source = integrator.esdf_layer().voxel(VoxelCoord::origin()).unwrap();
        assert_eq!(source.distance, 0.0);
        assert_eq!(source.coc_idx, Some(VoxelCoord::origin()));

        let probe = integrator
            .esdf_layer()
            .voxel(VoxelCoord::new(3, 4, 0))
            .unwrap();
        assert_eq!(probe.coc_idx, Some(VoxelCoord::origin()));
        assert_relative_eq!(probe.distance, 0.5, epsilon = 1e-9);

        assert!(integrator.total_expanded() > 0);
    }

    #[test]
    fn test_empty_cycle_is_a_no_op() {
        let (mut occ, esdf) = layers();
        let mut integrator = EsdfIntegrator::new(EsdfConfig::default(), esdf).unwrap();
        integrator.update_from_occ_layer(&mut occ, true).unwrap();
        assert_eq!(integrator.esdf_layer().num_blocks(), 0);
        assert_eq!(integrator.total_expanded(), 0);
    }

    #[test]
    fn test_assign_error() {
        let (mut occ, esdf) = layers();
        observe_region(
            &mut occ,
            GridBounds::from_point(VoxelCoord::origin()),
        );
        let mut integrator = EsdfIntegrator::new(EsdfConfig::default(), esdf).unwrap();
        integrator.update_from_occ_layer(&mut occ, true).unwrap();

        integrator.assign_error(VoxelCoord::origin(), 0.25);
        assert_eq!(
            integrator
                .esdf_layer()
                .voxel(VoxelCoord::origin())
                .unwrap()
                .error,
            0.25
        );
        // silently ignored outside allocated storage
        integrator.assign_error(VoxelCoord::new(1000, 0, 0), 1.0);
    }

    #[test]
    fn test_reset_fixed_clears_window() {
        let (mut occ, esdf) = layers();
        observe_region(
            &mut occ,
            GridBounds::new(VoxelCoord::new(-2, -2, -2), VoxelCoord::new(2, 2, 2)),
        );
        occupy(&mut occ, VoxelCoord::origin());

        let mut integrator = EsdfIntegrator::new(EsdfConfig::default(), esdf).unwrap();
        integrator.load_insert_list(vec![VoxelCoord::origin()]);
        integrator.update_from_occ_layer(&mut occ, true).unwrap();

        integrator
            .esdf_layer_mut()
            .voxel_mut(VoxelCoord::new(1, 1, 0))
            .unwrap()
            .fixed = true;
        integrator.reset_fixed();
        assert!(
            !integrator
                .esdf_layer()
                .voxel(VoxelCoord::new(1, 1, 0))
                .unwrap()
                .fixed
        );
    }
}

//! Incremental Euclidean signed distance field (ESDF) maintenance for
//! volumetric robot mapping.
//!
//! Given an occupancy grid that changes over time, this crate maintains a
//! companion grid in which every observed voxel stores the signed Euclidean
//! distance to its nearest occupied voxel, its *closest obstacle cell*.
//! Updates are incremental: only a bounded window around the changed voxels
//! is touched, and within it the engine visits as few voxels as possible.
//!
//! The update scheme follows FIESTA (Han et al., "Fast Incremental
//! Euclidean Distance Fields for Online Motion Planning of Aerial Robots",
//! IROS 2019): two change lists for newly occupied and newly freed voxels,
//! a doubly linked claimant list per obstacle threaded through the voxels
//! themselves, and a bucketed priority queue driving a wavefront update in
//! order of increasing distance.
//!
//! - [`EsdfIntegrator`] - the update engine
//! - [`EsdfConfig`] - engine parameters
//! - [`Layer`], [`Block`] - block-tiled sparse voxel storage
//! - [`OccupancyVoxel`], [`EsdfVoxel`] - per-cell payloads
//! - [`VoxelCoord`], [`GridBounds`] - lattice coordinates and boxes
//! - [`BucketQueue`] - the wavefront's approximate priority queue
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero engine dependencies**. It can be
//! used in CLI tools, servers, WASM, and bindings; sensor ingestion,
//! visualization, and planning live upstream and downstream of it.
//!
//! # Example
//!
//! ```
//! use cf_esdf::{EsdfConfig, EsdfIntegrator, EsdfLayer, GridBounds, OccupancyLayer, VoxelCoord};
//!
//! // Matching layers: 0.1 m voxels, 8-voxel block tiles.
//! let mut occ = OccupancyLayer::new(0.1, 8);
//! let esdf = EsdfLayer::new(0.1, 8);
//!
//! // A fully observed region around the origin...
//! for index in GridBounds::new(VoxelCoord::new(-4, -4, -4), VoxelCoord::new(4, 4, 4)) {
//!     occ.voxel_mut_or_allocate(index).observed = true;
//! }
//! // ...with one occupied cell at the origin.
//! occ.voxel_mut_or_allocate(VoxelCoord::origin()).occupied = true;
//! for (_, block) in occ.blocks_mut() {
//!     block.set_updated(true);
//! }
//!
//! let mut integrator = EsdfIntegrator::new(EsdfConfig::default(), esdf).unwrap();
//! integrator.load_insert_list(vec![VoxelCoord::origin()]);
//! integrator.update_from_occ_layer(&mut occ, true).unwrap();
//!
//! // Every observed voxel now knows its closest obstacle cell.
//! let voxel = integrator.esdf_layer().voxel(VoxelCoord::new(3, 4, 0)).unwrap();
//! assert_eq!(voxel.coc_idx, Some(VoxelCoord::origin()));
//! assert!((voxel.distance - 0.5).abs() < 1e-9);
//! ```
//!
//! # Update model
//!
//! The engine is single-writer: [`EsdfIntegrator::update_from_occ_layer`]
//! runs one cycle to completion on the calling thread, reading the
//! occupancy layer and rewriting the ESDF layer. Between cycles the caller
//! resupplies the insert/delete change lists. Distances are stored signed;
//! voxels behind a surface carry negative distances, and the sign is copied
//! from occupancy rather than inferred from geometry.

// Safety: Deny unwrap/expect in library code. Tests may use them.
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod bounds;
mod cell;
mod config;
mod error;
mod integrator;
mod layer;
mod list;
mod queue;
mod voxel;

pub use bounds::{GridBounds, GridBoundsIter};
pub use cell::{EsdfVoxel, OccupancyVoxel};
pub use config::EsdfConfig;
pub use error::{EsdfError, EsdfResult};
pub use integrator::EsdfIntegrator;
pub use layer::{Block, EsdfLayer, Layer, OccupancyLayer};
pub use queue::BucketQueue;
pub use voxel::{VoxelCoord, MAX_NEIGHBOR_HOP, NEIGHBOR_OFFSETS};

// Re-export nalgebra types appearing in the public API
pub use nalgebra::Vector3;

//! Benchmarks for the incremental ESDF update cycle.
//!
//! Run with: cargo bench
//!
//! To compare against baseline:
//! 1. First run: cargo bench -- --save-baseline main
//! 2. After changes: cargo bench -- --baseline main

use cf_esdf::{EsdfConfig, EsdfIntegrator, EsdfLayer, GridBounds, OccupancyLayer, VoxelCoord};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};

const VOXEL_SIZE: f64 = 0.1;
const VOXELS_PER_SIDE: usize = 8;

/// Builds a fully observed cubic region of half-extent `half` with a wall
/// of obstacles across the x = 0 plane, ready for one insert cycle.
fn wall_scene(half: i32) -> (OccupancyLayer, EsdfIntegrator, Vec<VoxelCoord>) {
    let mut occ = OccupancyLayer::new(VOXEL_SIZE, VOXELS_PER_SIDE);
    let esdf = EsdfLayer::new(VOXEL_SIZE, VOXELS_PER_SIDE);

    let region = GridBounds::new(
        VoxelCoord::new(-half, -half, -half),
        VoxelCoord::new(half, half, half),
    );
    for index in region {
        occ.voxel_mut_or_allocate(index).observed = true;
    }

    let mut wall = Vec::new();
    for y in -half..=half {
        for z in -half..=half {
            let index = VoxelCoord::new(0, y, z);
            occ.voxel_mut_or_allocate(index).occupied = true;
            wall.push(index);
        }
    }
    for (_, block) in occ.blocks_mut() {
        block.set_updated(true);
    }

    let integrator = EsdfIntegrator::new(EsdfConfig::default(), esdf).unwrap();
    (occ, integrator, wall)
}

fn region_voxels(half: i32) -> u64 {
    let side = u64::from(half.unsigned_abs()) * 2 + 1;
    side * side * side
}

fn bench_insert_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_cycle");
    for half in [4_i32, 8] {
        group.throughput(Throughput::Elements(region_voxels(half)));
        group.bench_function(format!("wall_half_{half}"), |b| {
            b.iter_batched(
                || wall_scene(half),
                |(mut occ, mut integrator, wall)| {
                    integrator.load_insert_list(wall);
                    integrator.update_from_occ_layer(&mut occ, true).unwrap();
                    integrator
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_delete_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("delete_cycle");
    for half in [4_i32, 8] {
        group.throughput(Throughput::Elements(region_voxels(half)));
        group.bench_function(format!("wall_half_{half}"), |b| {
            b.iter_batched(
                || {
                    // converge on the wall first; measure only its removal
                    let (mut occ, mut integrator, wall) = wall_scene(half);
                    integrator.load_insert_list(wall.clone());
                    integrator.update_from_occ_layer(&mut occ, true).unwrap();
                    for &index in &wall {
                        let block_index = occ.block_index_of(index);
                        occ.voxel_mut_or_allocate(index).occupied = false;
                        if let Some(block) = occ.block_mut(block_index) {
                            block.set_updated(true);
                        }
                    }
                    (occ, integrator, wall)
                },
                |(mut occ, mut integrator, wall)| {
                    integrator.load_delete_list(wall);
                    integrator.update_from_occ_layer(&mut occ, true).unwrap();
                    integrator
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert_cycle, bench_delete_cycle);
criterion_main!(benches);

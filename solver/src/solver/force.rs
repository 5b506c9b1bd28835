use std::ops::Range;
use na::Vector3;
use rayon::prelude::*;
use ljmd_core::PartialForces;
use crate::parallel::{Partition, TopologyError};
use crate::solver::{minimum_image, LennardJones};

/// Adds forces of all pairs `(i, j)` with `i` in `outer` and `j > i` into
/// `forces` (zeroed first) and returns their potential energy.
pub fn accumulate_pairs(forces: &mut [Vector3<f64>],
                        positions: &[Vector3<f64>],
                        potential: &LennardJones,
                        box_length: f64,
                        outer: Range<usize>) -> f64 {
    forces.iter_mut().for_each(|f| *f = Vector3::zeros());
    let natoms = positions.len();
    let mut epot = 0.0;
    for i in outer {
        let ri = positions[i];
        for j in (i + 1)..natoms {
            let d = minimum_image(ri - positions[j], box_length);
            if let Some((ffac, u)) = potential.pair(d.norm_squared()) {
                let f = d * ffac;
                forces[i] += f;
                forces[j] -= f;
                epot += u;
            }
        }
    }
    epot
}

/// Total forces and potential energy computed on the calling thread.
pub fn compute_forces_serial(positions: &[Vector3<f64>],
                             potential: &LennardJones,
                             box_length: f64) -> (Vec<Vector3<f64>>, f64) {
    let mut forces = vec![Vector3::zeros(); positions.len()];
    let epot = accumulate_pairs(&mut forces, positions, potential, box_length,
                                0..positions.len().saturating_sub(1));
    (forces, epot)
}

/// Evaluates this rank's share of the pair loop on its own thread pool.
pub struct ForceEvaluator {
    rank: usize,
    partition: Partition,
    pool: rayon::ThreadPool,
}

impl ForceEvaluator {
    pub fn new(partition: Partition, rank: usize) -> Result<Self, TopologyError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(partition.threads())
            .thread_name(move |i| format!("ljmd-force-{rank}-{i}"))
            .build()
            .map_err(|e| TopologyError::ThreadPool(e.to_string()))?;
        log::debug!("Rank {} handles outer indices {:?} with {} threads",
                    rank, partition.rank_range(rank), partition.threads());
        Ok(ForceEvaluator {
            rank,
            partition,
            pool,
        })
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Overwrites `partial` with the forces and energies of this rank's pairs.
    /// Thread `t` only writes its own slice and energy slot.
    pub fn compute(&self,
                   positions: &[Vector3<f64>],
                   potential: &LennardJones,
                   box_length: f64,
                   partial: &mut PartialForces) -> Result<(), TopologyError> {
        let natoms = positions.len();
        if partial.natoms() != natoms
            || partial.threads() != self.partition.threads()
            || self.partition.natoms() != natoms
            || !partial.is_consistent() {
            return Err(TopologyError::PartialSize {
                natoms,
                threads: self.partition.threads(),
            });
        }
        if natoms == 0 {
            partial.clear();
            return Ok(());
        }
        let rank = self.rank;
        let partition = self.partition;
        let forces = &mut partial.forces;
        let energy = &mut partial.energy;
        self.pool.install(|| {
            forces
                .par_chunks_mut(natoms)
                .zip(energy.par_iter_mut())
                .enumerate()
                .for_each(|(thread, (forces, energy))| {
                    *energy = accumulate_pairs(forces, positions, potential, box_length,
                                               partition.outer_range(rank, thread));
                });
        });
        Ok(())
    }
}

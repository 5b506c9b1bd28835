use na::Vector3;
use rayon::prelude::*;
use ljmd_core::PartialForces;
use crate::parallel::{Communicator, TopologyError};

/// Folds per-thread partial forces of every rank into the root's force array.
///
/// Forces and the potential energy travel in one packed buffer of
/// `3 * natoms + 1` values, so each evaluation costs a single reduction.
pub struct Reducer {
    buffer: Vec<f64>,
}

impl Reducer {
    pub fn new(natoms: usize) -> Self {
        Reducer {
            buffer: vec![0.0; 3 * natoms + 1],
        }
    }

    /// Sums the partials of this rank's threads into the packed buffer.
    fn pack(&mut self, partial: &PartialForces) {
        let natoms = partial.natoms();
        let threads = partial.threads();
        self.buffer.resize(3 * natoms + 1, 0.0);
        self.buffer[..3 * natoms]
            .par_chunks_mut(3)
            .enumerate()
            .for_each(|(i, chunk)| {
                let force: Vector3<f64> = (0..threads)
                    .map(|t| partial.forces[t * natoms + i])
                    .sum();
                chunk.copy_from_slice(force.as_slice());
            });
        self.buffer[3 * natoms] = partial.energy.iter().sum();
    }

    /// Returns the potential energy. On the root `forces` is overwritten with the
    /// global sum and the energy is global too; on other ranks `forces` is
    /// untouched and the energy is this rank's share.
    pub fn reduce(&mut self,
                  comm: &dyn Communicator,
                  partial: &PartialForces,
                  forces: &mut [Vector3<f64>]) -> Result<f64, TopologyError> {
        let natoms = partial.natoms();
        if !partial.is_consistent() {
            return Err(TopologyError::PartialSize {
                natoms,
                threads: partial.threads(),
            });
        }
        if forces.len() != natoms {
            return Err(TopologyError::ForceSize {
                expected: natoms,
                found: forces.len(),
            });
        }
        self.pack(partial);
        comm.reduce_sum(&mut self.buffer)?;
        if comm.is_root() {
            forces
                .iter_mut()
                .zip(self.buffer.chunks_exact(3))
                .for_each(|(f, chunk)| *f = Vector3::new(chunk[0], chunk[1], chunk[2]));
        }
        Ok(self.buffer[3 * natoms])
    }
}

use na::Vector3;
use crate::{ConfigError, Snapshot, SystemParameters};

/// Per-thread force accumulators of one rank.
///
/// Thread `t` owns `forces[t * natoms..(t + 1) * natoms]` and `energy[t]`.
/// Only the force evaluator writes here and only the reducer reads it.
#[derive(Clone, Debug)]
pub struct PartialForces {
    natoms: usize,
    threads: usize,
    pub forces: Vec<Vector3<f64>>,
    pub energy: Vec<f64>,
}

impl PartialForces {
    pub fn new(natoms: usize, threads: usize) -> Self {
        PartialForces {
            natoms,
            threads,
            forces: vec![Vector3::zeros(); natoms * threads],
            energy: vec![0.0; threads],
        }
    }

    pub fn natoms(&self) -> usize {
        self.natoms
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// True when the buffers still have the shape they were created with.
    pub fn is_consistent(&self) -> bool {
        self.forces.len() == self.natoms * self.threads && self.energy.len() == self.threads
    }

    pub fn clear(&mut self) {
        self.forces.iter_mut().for_each(|f| *f = Vector3::zeros());
        self.energy.iter_mut().for_each(|e| *e = 0.0);
    }

    /// Slice written by thread `thread`.
    pub fn thread_forces(&self, thread: usize) -> &[Vector3<f64>] {
        &self.forces[thread * self.natoms..(thread + 1) * self.natoms]
    }
}

/// Whole state of one simulation run on one rank.
#[derive(Clone, Debug)]
pub struct SimulationState {
    pub params: SystemParameters,
    nfi: usize,
    /// Kinetic energy in kcal/mol
    pub ekin: f64,
    /// Potential energy in kcal/mol
    pub epot: f64,
    /// Instantaneous temperature in K
    pub temp: f64,
    pub positions: Vec<Vector3<f64>>,
    pub velocities: Vec<Vector3<f64>>,
    /// Reduced total force. Only meaningful on the root rank.
    pub forces: Vec<Vector3<f64>>,
    pub partial: PartialForces,
}

impl SimulationState {
    /// Builds the state from validated parameters and a restart snapshot.
    /// `threads` is the number of force threads this rank will use.
    pub fn new(params: SystemParameters, snapshot: Snapshot, threads: usize) -> Result<Self, ConfigError> {
        if snapshot.positions.len() != params.natoms || snapshot.velocities.len() != params.natoms {
            return Err(ConfigError::AtomCount {
                expected: params.natoms,
                found: snapshot.positions.len().min(snapshot.velocities.len()),
            });
        }
        if threads == 0 {
            return Err(ConfigError::InvalidParameter("thread count must be positive".into()));
        }
        Ok(SimulationState {
            params,
            nfi: 0,
            ekin: 0.0,
            epot: 0.0,
            temp: 0.0,
            positions: snapshot.positions,
            velocities: snapshot.velocities,
            forces: vec![Vector3::zeros(); params.natoms],
            partial: PartialForces::new(params.natoms, threads),
        })
    }

    pub fn natoms(&self) -> usize {
        self.params.natoms
    }

    /// Current step index
    pub fn step(&self) -> usize {
        self.nfi
    }

    /// Moves the step cursor forward. Moving it back is ignored with a warning.
    pub fn set_step(&mut self, step: usize) {
        if step < self.nfi {
            log::warn!("Refusing to move step cursor back from {} to {}", self.nfi, step);
            return;
        }
        self.nfi = step;
    }

    pub fn advance_step(&mut self) {
        self.nfi += 1;
    }

    pub fn total_energy(&self) -> f64 {
        self.ekin + self.epot
    }

    /// Copy of positions and velocities, e.g. to restart from later.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            positions: self.positions.clone(),
            velocities: self.velocities.clone(),
        }
    }
}

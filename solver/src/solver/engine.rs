use ljmd_core::SimulationState;
use crate::macro_parameters::update_kinetic;
use crate::parallel::{Communicator, Partition, Reducer, TopologyError};
use crate::solver::{ForceEvaluator, LennardJones, VelocityVerlet};

/// Physics kernel behind the driver.
///
/// `compute_forces` is collective: every rank must call it. The other
/// operations only make sense on the root, which holds the reduced forces.
pub trait PhysicsEngine {
    /// Replaces `state.forces` and `state.epot` on the root with values for
    /// the current positions.
    fn compute_forces(&mut self, comm: &dyn Communicator, state: &mut SimulationState) -> Result<(), TopologyError>;

    /// First half kick followed by the drift of positions.
    fn kick_drift(&self, state: &mut SimulationState);

    /// Second half kick.
    fn kick(&self, state: &mut SimulationState);

    fn compute_kinetic(&self, state: &mut SimulationState);

    /// One full velocity Verlet step.
    fn integrate_step(&mut self, comm: &dyn Communicator, state: &mut SimulationState) -> Result<(), TopologyError> {
        if comm.is_root() {
            self.kick_drift(state);
        }
        self.compute_forces(comm, state)?;
        if comm.is_root() {
            self.kick(state);
        }
        Ok(())
    }
}

/// In-process Lennard-Jones engine: broadcast positions, evaluate this rank's
/// pairs on its thread pool, reduce to the root.
pub struct LennardJonesEngine {
    potential: LennardJones,
    box_length: f64,
    evaluator: ForceEvaluator,
    reducer: Reducer,
    integrator: VelocityVerlet,
    positions: Vec<f64>,
}

impl LennardJonesEngine {
    pub fn new(comm: &dyn Communicator, state: &SimulationState) -> Result<Self, TopologyError> {
        let natoms = state.natoms();
        let partition = Partition::new(natoms, comm.size(), state.partial.threads());
        Ok(LennardJonesEngine {
            potential: LennardJones::from_parameters(&state.params),
            box_length: state.params.box_length,
            evaluator: ForceEvaluator::new(partition, comm.rank())?,
            reducer: Reducer::new(natoms),
            integrator: VelocityVerlet,
            positions: vec![0.0; 3 * natoms],
        })
    }

    pub fn potential(&self) -> &LennardJones {
        &self.potential
    }

    /// Local checks every rank runs before the first collective of an evaluation.
    fn check_layout(&self, comm: &dyn Communicator, state: &SimulationState) -> Result<(), TopologyError> {
        let partition = self.evaluator.partition();
        if partition.ranks() != comm.size() {
            return Err(TopologyError::RankMismatch {
                expected: partition.ranks(),
                found: comm.size(),
            });
        }
        let natoms = state.natoms();
        let partial = &state.partial;
        if partial.natoms() != natoms || partial.threads() != partition.threads() || !partial.is_consistent() {
            return Err(TopologyError::PartialSize {
                natoms,
                threads: partition.threads(),
            });
        }
        if state.forces.len() != natoms {
            return Err(TopologyError::ForceSize {
                expected: natoms,
                found: state.forces.len(),
            });
        }
        Ok(())
    }

    fn share_positions(&mut self, comm: &dyn Communicator, state: &mut SimulationState) -> Result<(), TopologyError> {
        if comm.size() == 1 {
            return Ok(());
        }
        if comm.is_root() {
            for (chunk, p) in self.positions.chunks_exact_mut(3).zip(&state.positions) {
                chunk.copy_from_slice(p.as_slice());
            }
        }
        comm.broadcast(&mut self.positions)?;
        if !comm.is_root() {
            for (p, chunk) in state.positions.iter_mut().zip(self.positions.chunks_exact(3)) {
                p.copy_from_slice(chunk);
            }
        }
        Ok(())
    }
}

impl PhysicsEngine for LennardJonesEngine {
    /// All ranks first agree that their layouts are sound, so a rank with a
    /// broken buffer makes every rank fail instead of leaving the others
    /// waiting in a collective.
    fn compute_forces(&mut self, comm: &dyn Communicator, state: &mut SimulationState) -> Result<(), TopologyError> {
        let checked = self.check_layout(comm, state);
        if let Err(peer) = comm.agree_on_status(checked.is_err()) {
            return Err(checked.err().unwrap_or(peer));
        }
        self.share_positions(comm, state)?;
        self.evaluator.compute(&state.positions, &self.potential, self.box_length, &mut state.partial)?;
        let epot = self.reducer.reduce(comm, &state.partial, &mut state.forces)?;
        if comm.is_root() {
            state.epot = epot;
        }
        Ok(())
    }

    fn kick_drift(&self, state: &mut SimulationState) {
        self.integrator.update_velocities_positions(state);
    }

    fn kick(&self, state: &mut SimulationState) {
        self.integrator.update_velocities(state);
    }

    fn compute_kinetic(&self, state: &mut SimulationState) {
        update_kinetic(state);
    }
}

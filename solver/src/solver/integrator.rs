use rayon::prelude::*;
use ljmd_core::units::MVSQ2E;
use ljmd_core::SimulationState;

/// Velocity Verlet split around the force evaluation.
///
/// <https://doi.org/10.1103/PhysRev.159.98>
#[derive(Clone, Copy, Debug, Default)]
pub struct VelocityVerlet;

impl VelocityVerlet {
    fn half_kick_factor(state: &SimulationState) -> f64 {
        0.5 * state.params.dt / MVSQ2E / state.params.mass
    }

    /// Propagates velocities by half a step with the current forces and
    /// positions by a full step with the new velocities.
    pub fn update_velocities_positions(&self, state: &mut SimulationState) {
        let factor = Self::half_kick_factor(state);
        let dt = state.params.dt;
        let forces = &state.forces;
        state.velocities
            .par_iter_mut()
            .zip(state.positions.par_iter_mut())
            .zip(forces.par_iter())
            .for_each(|((velocity, position), force)| {
                *velocity += force * factor;
                *position += *velocity * dt;
            });
    }

    /// Propagates velocities by the second half step with the new forces.
    pub fn update_velocities(&self, state: &mut SimulationState) {
        let factor = Self::half_kick_factor(state);
        let forces = &state.forces;
        state.velocities
            .par_iter_mut()
            .zip(forces.par_iter())
            .for_each(|(velocity, force)| {
                *velocity += force * factor;
            });
    }
}

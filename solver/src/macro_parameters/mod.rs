mod energy;
mod temperature;

pub use energy::*;
pub use temperature::*;
use ljmd_core::SimulationState;
use na::Vector3;
use rayon::prelude::*;

/// Total momentum of atoms of equal `mass`.
pub fn get_total_momentum(velocities: &[Vector3<f64>], mass: f64) -> Vector3<f64> {
    let v: Vector3<f64> = velocities.par_iter().copied().sum();
    v * mass
}

/// Recomputes kinetic energy and temperature from the current velocities.
pub fn update_kinetic(state: &mut SimulationState) {
    state.ekin = get_kinetic_energy(&state.velocities, state.params.mass);
    state.temp = get_temperature(state.ekin, state.natoms());
}

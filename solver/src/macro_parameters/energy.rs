use na::Vector3;
use rayon::prelude::*;
use ljmd_core::units::MVSQ2E;

/// Kinetic energy in kcal/mol of atoms of equal `mass` (AMU) with velocities in Å/fs.
pub fn get_kinetic_energy(velocities: &[Vector3<f64>], mass: f64) -> f64 {
    let v_squared: f64 = velocities
        .par_iter()
        .map(|v| v.norm_squared())
        .sum();
    0.5 * MVSQ2E * mass * v_squared
}

use ljmd_core::units::K_BOLTZ;

/// Degrees of freedom left after removing centre of mass motion.
/// A single atom keeps all three.
pub fn degrees_of_freedom(natoms: usize) -> f64 {
    if natoms > 1 {
        (3 * natoms - 3) as f64
    } else {
        3.0
    }
}

/// Temperature in Kelvin from kinetic energy in kcal/mol
pub fn get_temperature(kinetic_energy: f64, natoms: usize) -> f64 {
    2.0 * kinetic_energy / degrees_of_freedom(natoms) / K_BOLTZ
}

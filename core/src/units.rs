//! Unit system: length in Å, mass in AMU, energy in kcal/mol, time in fs.

/// Boltzmann constant in kcal/mol/K
pub const K_BOLTZ: f64 = 0.0019872067;

/// Converts m*v^2 (AMU * Å^2 / fs^2) to kcal/mol
pub const MVSQ2E: f64 = 2390.05736153349;

mod engine;
mod force;
mod integrator;
mod potential;
mod solver;

pub use engine::*;
pub use force::*;
pub use integrator::*;
pub use potential::*;
pub use solver::*;

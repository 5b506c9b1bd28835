mod config;
mod error;
mod output;
mod restart;
mod state;
pub mod units;
extern crate nalgebra as na;

pub use config::{strip_comment, SimulationConfig, SystemParameters};
pub use error::ConfigError;
pub use output::{format_energy_line, format_trajectory_block, EnergyRecorder, FileOutput, Output};
pub use restart::{load_restart_from_file, read_restart, Snapshot};
pub use state::{PartialForces, SimulationState};

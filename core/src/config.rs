use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use crate::ConfigError;

/// Scalar parameters of a run. Set once at initialization and never changed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SystemParameters {
    /// Number of atoms
    pub natoms: usize,
    /// Mass of every atom in AMU
    pub mass: f64,
    /// Depth of the LJ well in kcal/mol
    pub epsilon: f64,
    /// Zero crossing distance of the LJ potential in Å
    pub sigma: f64,
    /// Cutoff radius in Å
    pub rcut: f64,
    /// Edge of the cubic box in Å
    pub box_length: f64,
    /// Number of integration steps
    pub nsteps: usize,
    /// Time step in fs
    pub dt: f64,
    /// Observables are written every `nprint` steps
    pub nprint: usize,
}

/// Parsed input file: physical parameters plus the files a run reads and writes.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    pub parameters: SystemParameters,
    pub restart_file: PathBuf,
    pub trajectory_file: PathBuf,
    pub energy_file: PathBuf,
}

const FIELDS: [&str; 12] = [
    "natoms",
    "mass",
    "epsilon",
    "sigma",
    "rcut",
    "box",
    "restart file",
    "trajectory file",
    "energy file",
    "nsteps",
    "dt",
    "nprint",
];

/// Cuts off a trailing `#` comment and surrounding whitespace.
pub fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => line[..pos].trim(),
        None => line.trim(),
    }
}

/// The whole value has to parse. Counts given as `3.0` or `100 steps` are rejected.
fn parse_field<T: FromStr>(value: &str, field: &'static str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        field,
        value: value.to_string(),
    })
}

impl SystemParameters {
    /// Checks the relations between parameters that the force kernel relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.natoms == 0 {
            return Err(ConfigError::InvalidParameter("natoms must be positive".into()));
        }
        if !(self.mass > 0.0) {
            return Err(ConfigError::InvalidParameter(format!("mass must be positive, got {}", self.mass)));
        }
        if !(self.sigma > 0.0) || !(self.epsilon >= 0.0) {
            return Err(ConfigError::InvalidParameter(format!(
                "bad LJ parameters: epsilon = {}, sigma = {}", self.epsilon, self.sigma)));
        }
        if !(self.box_length > 0.0) {
            return Err(ConfigError::InvalidParameter(format!("box must be positive, got {}", self.box_length)));
        }
        if !(self.rcut > 0.0) || self.rcut > 0.5 * self.box_length {
            return Err(ConfigError::InvalidParameter(format!(
                "cutoff {} must lie in (0, box / 2 = {}]", self.rcut, 0.5 * self.box_length)));
        }
        if !(self.dt > 0.0) {
            return Err(ConfigError::InvalidParameter(format!("dt must be positive, got {}", self.dt)));
        }
        if self.nprint == 0 {
            return Err(ConfigError::InvalidParameter("nprint must be positive".into()));
        }
        Ok(())
    }
}

impl SimulationConfig {
    /// Reads the twelve input values in their fixed order and validates them.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ConfigError> {
        let mut values: Vec<String> = Vec::with_capacity(FIELDS.len());
        for line in reader.lines().take(FIELDS.len()) {
            let line = line.map_err(|e| ConfigError::io("<input>", e))?;
            values.push(strip_comment(&line).to_string());
        }
        if values.len() < FIELDS.len() {
            return Err(ConfigError::MissingValue {
                line: values.len() + 1,
                field: FIELDS[values.len()],
            });
        }
        let path = |idx: usize| -> Result<PathBuf, ConfigError> {
            if values[idx].is_empty() {
                Err(ConfigError::InvalidValue { field: FIELDS[idx], value: String::new() })
            } else {
                Ok(PathBuf::from(&values[idx]))
            }
        };
        let parameters = SystemParameters {
            natoms: parse_field(&values[0], FIELDS[0])?,
            mass: parse_field(&values[1], FIELDS[1])?,
            epsilon: parse_field(&values[2], FIELDS[2])?,
            sigma: parse_field(&values[3], FIELDS[3])?,
            rcut: parse_field(&values[4], FIELDS[4])?,
            box_length: parse_field(&values[5], FIELDS[5])?,
            nsteps: parse_field(&values[9], FIELDS[9])?,
            dt: parse_field(&values[10], FIELDS[10])?,
            nprint: parse_field(&values[11], FIELDS[11])?,
        };
        parameters.validate()?;
        Ok(SimulationConfig {
            parameters,
            restart_file: path(6)?,
            trajectory_file: path(7)?,
            energy_file: path(8)?,
        })
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_reader(BufReader::new(file))
    }
}

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use na::Vector3;
use crate::ConfigError;

/// Positions and velocities of every atom, as stored in a restart file.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub positions: Vec<Vector3<f64>>,
    pub velocities: Vec<Vector3<f64>>,
}

impl Snapshot {
    /// All atoms at the origin and at rest. Ranks other than the root start from this
    /// and get real positions through the broadcast before every force evaluation.
    pub fn zeroed(natoms: usize) -> Self {
        Snapshot {
            positions: vec![Vector3::zeros(); natoms],
            velocities: vec![Vector3::zeros(); natoms],
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

fn parse_vector(line: &str, line_number: usize) -> Result<Vector3<f64>, ConfigError> {
    let malformed = || ConfigError::RestartLine {
        line: line_number,
        content: line.to_string(),
    };
    let mut values = line.split_whitespace().map(|v| v.parse::<f64>());
    let mut next = || -> Result<f64, ConfigError> {
        values.next().ok_or_else(malformed)?.map_err(|_| malformed())
    };
    let vector = Vector3::new(next()?, next()?, next()?);
    if values.next().is_some() {
        return Err(malformed());
    }
    Ok(vector)
}

/// Reads `2 * natoms` lines of three numbers: positions first, velocities after them.
///
/// Blank lines at the end of the file are ignored, any other deviation from
/// the expected line count is an error.
pub fn read_restart<R: BufRead>(reader: R, natoms: usize) -> Result<Snapshot, ConfigError> {
    let mut lines = vec![];
    for line in reader.lines() {
        lines.push(line.map_err(|e| ConfigError::io("<restart>", e))?);
    }
    while lines.last().map_or(false, |l| l.trim().is_empty()) {
        lines.pop();
    }
    if lines.len() != 2 * natoms {
        return Err(ConfigError::RestartLineCount {
            expected: 2 * natoms,
            found: lines.len(),
        });
    }
    let mut vectors = lines
        .iter()
        .enumerate()
        .map(|(i, line)| parse_vector(line, i + 1))
        .collect::<Result<Vec<_>, _>>()?;
    let velocities = vectors.split_off(natoms);
    Ok(Snapshot {
        positions: vectors,
        velocities,
    })
}

pub fn load_restart_from_file(path: &Path, natoms: usize) -> Result<Snapshot, ConfigError> {
    let file = File::open(path).map_err(|e| ConfigError::io(path, e))?;
    read_restart(BufReader::new(file), natoms)
}

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use crate::SimulationState;

/// Receiver of observables and positions on reporting steps.
pub trait Output {
    fn write_frame(&mut self, state: &SimulationState) -> io::Result<()>;
}

/// One line of the energy log: step, temperature, kinetic, potential and total energy.
pub fn format_energy_line(state: &SimulationState) -> String {
    format!("{:8} {:20.8} {:20.8} {:20.8} {:20.8}",
            state.step(), state.temp, state.ekin, state.epot, state.total_energy())
}

/// Trajectory block: header with step and total energy, then one line per atom.
pub fn format_trajectory_block(state: &SimulationState, label: &str) -> String {
    let mut block = format!("nfi = {:8}  etot = {:20.8}\n", state.step(), state.total_energy());
    for position in &state.positions {
        block.push_str(&format!("{:<4}{:20.8} {:20.8} {:20.8}\n",
                                label, position.x, position.y, position.z));
    }
    block
}

/// Appends frames to the energy and trajectory files named in the input.
#[derive(Clone, Debug)]
pub struct FileOutput {
    energy_file: PathBuf,
    trajectory_file: PathBuf,
    label: String,
}

impl FileOutput {
    /// Truncates both files so a run starts with empty logs.
    pub fn create(energy_file: &Path, trajectory_file: &Path) -> io::Result<Self> {
        File::create(energy_file)?;
        File::create(trajectory_file)?;
        Ok(FileOutput {
            energy_file: energy_file.to_path_buf(),
            trajectory_file: trajectory_file.to_path_buf(),
            label: String::from("Ar"),
        })
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    fn append(path: &Path, text: &str) -> io::Result<()> {
        let file = OpenOptions::new().append(true).create(true).open(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(text.as_bytes())?;
        writer.flush()
    }
}

impl Output for FileOutput {
    /// Both files are attempted even if the first write fails.
    fn write_frame(&mut self, state: &SimulationState) -> io::Result<()> {
        let energy = Self::append(&self.energy_file,
                                  &format!("{}\n", format_energy_line(state)));
        let trajectory = Self::append(&self.trajectory_file,
                                      &format_trajectory_block(state, &self.label));
        energy.and(trajectory)
    }
}

/// Keeps the energy lines in memory. Used where no files are wanted.
#[derive(Default)]
pub struct EnergyRecorder {
    pub lines: Vec<String>,
}

impl Output for EnergyRecorder {
    fn write_frame(&mut self, state: &SimulationState) -> io::Result<()> {
        self.lines.push(format_energy_line(state));
        Ok(())
    }
}

use std::env;
use std::io;
use std::path::Path;
use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use ljmd_core::{load_restart_from_file, ConfigError, FileOutput, SimulationConfig, SimulationState, Snapshot};
use ljmd_solver::macro_parameters::get_total_momentum;
use ljmd_solver::parallel::{Communicator, LocalCluster, SingleProcess, TopologyError, ROOT};
use ljmd_solver::solver::{LennardJonesEngine, RunSummary, Solver, SolverError};

pub const THREADS_ENV: &str = "LJMD_NUM_THREADS";

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error("can't open output files: {0}")]
    Output(#[from] io::Error),
}

/// Thread count from the environment. Anything but a positive integer means 1.
pub fn thread_hint(value: Option<&str>) -> usize {
    match value.map(|v| v.trim().parse::<usize>()) {
        None => 1,
        Some(Ok(threads)) if threads > 0 => threads,
        Some(_) => {
            log::warn!("Can't use {}={:?} as thread count, using 1 thread", THREADS_ENV, value.unwrap_or_default());
            1
        }
    }
}

pub fn resolve_threads(threads: Option<usize>) -> usize {
    threads.unwrap_or_else(|| thread_hint(env::var(THREADS_ENV).ok().as_deref()))
}

pub fn load_config(input: Option<&Path>) -> Result<SimulationConfig, ConfigError> {
    match input {
        Some(path) => SimulationConfig::load_from_file(path),
        None => SimulationConfig::from_reader(io::stdin().lock()),
    }
}

fn load(input: Option<&Path>) -> Result<(SimulationConfig, Snapshot), CliError> {
    let config = load_config(input)?;
    let snapshot = load_restart_from_file(&config.restart_file, config.parameters.natoms)?;
    log::info!("Read {} atoms from {}", snapshot.len(), config.restart_file.display());
    Ok((config, snapshot))
}

fn progress_bar(steps: usize, show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(steps as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} steps [{elapsed_precise}]") {
        pb.set_style(style);
    }
    pb
}

/// Everything one rank does for a run. Only the root's snapshot is read,
/// the others receive positions from it at every force evaluation.
fn run_rank<C: Communicator>(comm: C,
                             config: &SimulationConfig,
                             snapshot: &Snapshot,
                             threads: usize,
                             output: &FileOutput,
                             pb: &ProgressBar) -> Result<(RunSummary, SimulationState), CliError> {
    let params = config.parameters;
    let snapshot = if comm.rank() == ROOT { snapshot.clone() } else { Snapshot::zeroed(params.natoms) };
    let state = SimulationState::new(params, snapshot, threads)?;
    let engine = LennardJonesEngine::new(&comm, &state)?;
    let root = comm.is_root();
    let mut solver = Solver::new(state, engine, comm)?;
    let mut output = output.clone();
    let summary = solver.run(&mut output, |_| {
        if root {
            pb.inc(1);
        }
    })?;
    Ok((summary, solver.get_final_state()))
}

/// Full simulation on `ranks` ranks with `threads` force threads each.
/// Returns the summary and the root's final state.
pub fn run(input: Option<&Path>,
           ranks: usize,
           threads: usize,
           show_progress: bool,
           label: &str) -> Result<(RunSummary, SimulationState), CliError> {
    if ranks == 0 {
        return Err(TopologyError::EmptyWorld.into());
    }
    let (config, snapshot) = load(input)?;
    let output = FileOutput::create(&config.energy_file, &config.trajectory_file)?.with_label(label);
    let pb = progress_bar(config.parameters.nsteps, show_progress);
    log::info!("Using {} ranks with {} threads each", ranks, threads);
    let (summary, state) = if ranks == 1 {
        run_rank(SingleProcess, &config, &snapshot, threads, &output, &pb)?
    } else {
        LocalCluster::run(ranks, |comm| run_rank(comm, &config, &snapshot, threads, &output, &pb))?
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?
            .swap_remove(ROOT)
    };
    pb.finish_with_message(format!("Calculated. Energies saved to {}", config.energy_file.display()));
    log::debug!("Total momentum after run: {}",
                get_total_momentum(&state.velocities, state.params.mass).transpose());
    Ok((summary, state))
}

/// Observables of the initial configuration, computed on a single rank.
pub fn inspect(input: Option<&Path>, threads: usize) -> Result<SimulationState, CliError> {
    let (config, snapshot) = load(input)?;
    let state = SimulationState::new(config.parameters, snapshot, threads)?;
    let engine = LennardJonesEngine::new(&SingleProcess, &state)?;
    Ok(Solver::new(state, engine, SingleProcess)?.get_final_state())
}

pub fn describe(state: &SimulationState) -> String {
    let momentum = get_total_momentum(&state.velocities, state.params.mass);
    format!("atoms: {}\ntemperature: {:.8}\nkinetic energy: {:.8}\npotential energy: {:.8}\n\
             total energy: {:.8}\ntotal momentum: {:.8e} {:.8e} {:.8e}",
            state.natoms(), state.temp, state.ekin, state.epot, state.total_energy(),
            momentum.x, momentum.y, momentum.z)
}

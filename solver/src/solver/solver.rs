use std::time::Instant;
use thiserror::Error;
use ljmd_core::{format_energy_line, Output, SimulationState};
use crate::parallel::{Communicator, TopologyError};
use crate::solver::PhysicsEngine;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Forces and energies of step 0 are known
    Initialized,
    Running,
    Completed,
}

#[derive(Error, Debug)]
pub enum SolverError {
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error("simulation has already completed")]
    AlreadyCompleted,
}

/// Result of a finished run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunSummary {
    pub steps: usize,
    /// Wall clock seconds of the step loop, maximum over all ranks
    pub elapsed: f64,
}

/// Drives one run on one rank. Only the root integrates, evaluates kinetic
/// energy and writes output; the others take part in force evaluation.
pub struct Solver<E, C> {
    state: SimulationState,
    engine: E,
    comm: C,
    phase: Phase,
}

impl<E: PhysicsEngine, C: Communicator> Solver<E, C> {
    /// Computes forces and energies of the initial configuration.
    pub fn new(mut state: SimulationState, mut engine: E, comm: C) -> Result<Self, SolverError> {
        engine.compute_forces(&comm, &mut state)?;
        if comm.is_root() {
            engine.compute_kinetic(&mut state);
        }
        comm.barrier()?;
        Ok(Self {
            state,
            engine,
            comm,
            phase: Phase::Initialized,
        })
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn communicator(&self) -> &C {
        &self.comm
    }

    pub fn get_final_state(self) -> SimulationState {
        self.state
    }

    fn emit(&self, output: &mut dyn Output) {
        log::info!("{}", format_energy_line(&self.state));
        if let Err(e) = output.write_frame(&self.state) {
            log::error!("Can't write output at step {}: {}", self.state.step(), e);
        }
    }

    /// Runs all steps. `on_step` is called on every rank after each step.
    pub fn run(&mut self,
               output: &mut dyn Output,
               mut on_step: impl FnMut(&SimulationState)) -> Result<RunSummary, SolverError> {
        if self.phase == Phase::Completed {
            return Err(SolverError::AlreadyCompleted);
        }
        self.phase = Phase::Running;
        let root = self.comm.is_root();
        let nsteps = self.state.params.nsteps;
        let nprint = self.state.params.nprint;
        if root {
            log::info!("Starting simulation with {} atoms for {} steps on {} ranks",
                       self.state.natoms(), nsteps, self.comm.size());
            log::info!("     NFI                 TEMP                 EKIN                 EPOT                 ETOT");
            self.emit(output);
        }
        let start = Instant::now();
        for _ in 0..nsteps {
            self.state.advance_step();
            if root && self.state.step() % nprint == 0 {
                self.emit(output);
            }
            self.engine.integrate_step(&self.comm, &mut self.state)?;
            if root {
                self.engine.compute_kinetic(&mut self.state);
            }
            on_step(&self.state);
        }
        let elapsed = self.comm.reduce_max(start.elapsed().as_secs_f64())?;
        self.phase = Phase::Completed;
        if root {
            log::info!("Simulation done. Execution time: {:.6} s", elapsed);
        }
        Ok(RunSummary {
            steps: nsteps,
            elapsed,
        })
    }
}

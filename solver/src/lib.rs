extern crate ljmd_core;
extern crate nalgebra as na;
extern crate rayon;
pub mod macro_parameters;
pub mod parallel;
pub mod solver;

#[cfg(test)]
mod tests {
    use std::io;
    use na::Vector3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use ljmd_core::{EnergyRecorder, Output, Snapshot, SimulationState, SystemParameters};
    use crate::macro_parameters::{get_kinetic_energy, get_temperature, get_total_momentum};
    use crate::parallel::{Communicator, LocalCluster, SingleProcess, TopologyError, ROOT};
    use crate::solver::{LennardJonesEngine, Phase, PhysicsEngine, Solver, SolverError};

    fn argon_parameters(natoms: usize) -> SystemParameters {
        SystemParameters {
            natoms,
            mass: 39.948,
            epsilon: 0.2379,
            sigma: 3.405,
            rcut: 8.5,
            box_length: 17.158,
            nsteps: 100,
            dt: 5.0,
            nprint: 5,
        }
    }

    fn argon_3_snapshot() -> Snapshot {
        Snapshot {
            positions: vec![
                Vector3::new(6.67103294321331, 1.06574058650169, -1.78412295775301),
                Vector3::new(-10.6146871435653, -3.33432278188177, -16.5259458407765),
                Vector3::new(12.6336939877734, -2.59038677851747, 4.61680014503288),
            ],
            velocities: vec![
                Vector3::new(-1.5643224621482283e-03, 4.1676710257651452e-04, -7.5611349562333923e-04),
                Vector3::new(4.8497508563925346e-04, 2.2858522230176587e-05, 4.0710138209103827e-04),
                Vector3::new(-4.3352481732883966e-04, -6.1985040462745732e-04, -4.6520198934056357e-04),
            ],
        }
    }

    /// 64 atoms on a simple cubic lattice filling the box, shaken a little.
    fn jittered_lattice(seed: u64) -> Snapshot {
        let mut rng = StdRng::seed_from_u64(seed);
        let cell = 17.158 / 4.0;
        let mut snapshot = Snapshot::zeroed(64);
        for (n, (position, velocity)) in snapshot.positions.iter_mut()
            .zip(snapshot.velocities.iter_mut()).enumerate() {
            let grid = Vector3::new((n % 4) as f64, ((n / 4) % 4) as f64, (n / 16) as f64);
            let jitter = Vector3::new(rng.gen_range(-0.3..0.3), rng.gen_range(-0.3..0.3), rng.gen_range(-0.3..0.3));
            *position = grid * cell + jitter;
            *velocity = Vector3::new(rng.gen_range(-1e-3..1e-3), rng.gen_range(-1e-3..1e-3), rng.gen_range(-1e-3..1e-3));
        }
        snapshot
    }

    fn serial_solver(params: SystemParameters, snapshot: Snapshot) -> Solver<LennardJonesEngine, SingleProcess> {
        let state = SimulationState::new(params, snapshot, 1).expect("Can't create state");
        let engine = LennardJonesEngine::new(&SingleProcess, &state).expect("Can't create engine");
        Solver::new(state, engine, SingleProcess).expect("Can't initialize solver")
    }

    /// Runs on `ranks` ranks with `threads` threads each and returns the root's
    /// final state and energy lines.
    fn distributed_run(params: SystemParameters, snapshot: Snapshot, ranks: usize, threads: usize)
        -> (SimulationState, Vec<String>) {
        let mut results = LocalCluster::run(ranks, |comm| {
            let snapshot = if comm.rank() == ROOT { snapshot.clone() } else { Snapshot::zeroed(params.natoms) };
            let state = SimulationState::new(params, snapshot, threads).expect("Can't create state");
            let engine = LennardJonesEngine::new(&comm, &state).expect("Can't create engine");
            let mut solver = Solver::new(state, engine, comm).expect("Can't initialize solver");
            let mut output = EnergyRecorder::default();
            solver.run(&mut output, |_| {}).expect("Can't run solver");
            (solver.get_final_state(), output.lines)
        })
        .expect("Can't start ranks");
        results.swap_remove(ROOT)
    }

    fn assert_close(a: f64, b: f64, rel: f64) {
        assert!((a - b).abs() <= rel * a.abs().max(b.abs()), "{a} != {b}");
    }

    #[test]
    fn argon_3_initial_observables() {
        let solver = serial_solver(argon_parameters(3), argon_3_snapshot());
        let state = solver.state();
        assert_eq!(solver.phase(), Phase::Initialized);
        assert_eq!(state.step(), 0);
        assert_eq!(format!("{:.8}", state.ekin), "0.20921778");
        assert_eq!(format!("{:.8}", state.epot), "-0.09309049");
        assert_eq!(format!("{:.8}", state.temp), "35.09411488");
        assert_close(state.forces[0].x, -0.0022649003318247615, 1e-10);
        assert_close(state.forces[0].y, -0.07802770288103772, 1e-10);
        assert_close(state.forces[1].z, -0.03861445865232022, 1e-10);
        assert_close(state.forces[2].x, -0.006468851775449228, 1e-10);
    }

    #[test]
    fn argon_3_reporting_frames() {
        let mut solver = serial_solver(argon_parameters(3), argon_3_snapshot());
        let mut output = EnergyRecorder::default();
        let mut steps_seen = 0;
        let summary = solver.run(&mut output, |_| steps_seen += 1).expect("Can't run solver");
        assert_eq!(summary.steps, 100);
        assert_eq!(steps_seen, 100);
        assert!(summary.elapsed >= 0.0);
        assert_eq!(solver.phase(), Phase::Completed);
        assert_eq!(solver.state().step(), 100);
        assert_eq!(output.lines.len(), 21);
        assert_eq!(output.lines[0],
                   "       0          35.09411488           0.20921778          -0.09309049           0.11612729");
        assert_eq!(output.lines[1],
                   "       5          34.87869546           0.20793353          -0.09180625           0.11612729");
        let last: Vec<f64> = output.lines[20]
            .split_whitespace()
            .map(|v| v.parse().expect("Can't parse energy line"))
            .collect();
        assert_eq!(last[0], 100.0);
        assert_close(last[1], 32.02438952, 1e-8);
        assert_close(last[2], 0.19091724, 1e-7);
        assert_close(last[3], -0.07479005, 1e-7);
        let state = solver.state();
        assert_close(state.positions[0].x, 5.892605940580287, 1e-9);
        assert_close(state.positions[0].z, -2.1111571544606225, 1e-9);
        assert!(matches!(solver.run(&mut output, |_| {}), Err(SolverError::AlreadyCompleted)));
    }

    #[test]
    fn energy_conservation() {
        let mut solver = serial_solver(argon_parameters(3), argon_3_snapshot());
        let initial = solver.state().total_energy();
        let mut max_drift: f64 = 0.0;
        solver.run(&mut EnergyRecorder::default(), |state| {
            max_drift = max_drift.max(((state.total_energy() - initial) / initial).abs());
        }).expect("Can't run solver");
        assert!(max_drift < 0.01, "relative drift {max_drift}");
    }

    #[test]
    fn momentum_conserved() {
        let params = SystemParameters { dt: 2.0, nsteps: 50, ..argon_parameters(64) };
        let snapshot = jittered_lattice(7);
        let p0 = get_total_momentum(&snapshot.velocities, params.mass);
        let mut solver = serial_solver(params, snapshot);
        solver.run(&mut EnergyRecorder::default(), |state| {
            let p = get_total_momentum(&state.velocities, state.params.mass);
            assert!((p - p0).norm() < 1e-10, "momentum drifted to {p}");
        }).expect("Can't run solver");
    }

    #[test]
    fn integrator_reversibility() {
        let snapshot = argon_3_snapshot();
        let mut state = serial_solver(argon_parameters(3), snapshot.clone()).get_final_state();
        let mut engine = LennardJonesEngine::new(&SingleProcess, &state).unwrap();
        for _ in 0..50 {
            engine.integrate_step(&SingleProcess, &mut state).unwrap();
        }
        state.velocities.iter_mut().for_each(|v| *v = -*v);
        for _ in 0..50 {
            engine.integrate_step(&SingleProcess, &mut state).unwrap();
        }
        for (p, p0) in state.positions.iter().zip(&snapshot.positions) {
            assert!((p - p0).norm() < 1e-8, "{p} vs {p0}");
        }
        for (v, v0) in state.velocities.iter().zip(&snapshot.velocities) {
            assert!((v + v0).norm() < 1e-12);
        }
    }

    #[test]
    fn reduction_invariance() {
        let params = argon_parameters(64);
        let snapshot = jittered_lattice(42);
        let reference = serial_solver(params, snapshot.clone()).get_final_state();
        let scale = reference.forces.iter().map(|f| f.norm()).fold(0.0, f64::max);
        for (ranks, threads) in [(1, 4), (2, 3), (3, 2), (4, 4)] {
            let results = LocalCluster::run(ranks, |comm| {
                let snapshot = if comm.is_root() { snapshot.clone() } else { Snapshot::zeroed(64) };
                let state = SimulationState::new(params, snapshot, threads).unwrap();
                let engine = LennardJonesEngine::new(&comm, &state).unwrap();
                Solver::new(state, engine, comm).unwrap().get_final_state()
            }).unwrap();
            let state = &results[ROOT];
            assert_close(state.epot, reference.epot, 1e-9);
            for (f, f_ref) in state.forces.iter().zip(&reference.forces) {
                assert!((f - f_ref).norm() <= 1e-9 * scale, "{ranks}x{threads}: {f} vs {f_ref}");
            }
        }
    }

    #[test]
    fn distributed_run_matches_serial() {
        let params = argon_parameters(3);
        let mut serial = serial_solver(params, argon_3_snapshot());
        let mut serial_output = EnergyRecorder::default();
        serial.run(&mut serial_output, |_| {}).unwrap();
        let (state, lines) = distributed_run(params, argon_3_snapshot(), 3, 4);
        assert_eq!(lines.len(), serial_output.lines.len());
        assert_eq!(lines[0], serial_output.lines[0]);
        assert_close(state.total_energy(), serial.state().total_energy(), 1e-9);
        for (p, p_ref) in state.positions.iter().zip(&serial.state().positions) {
            assert!((p - p_ref).norm() < 1e-9);
        }
    }

    #[test]
    fn distributed_lattice_run() {
        let params = SystemParameters { nsteps: 10, nprint: 2, dt: 2.0, ..argon_parameters(64) };
        let mut serial = serial_solver(params, jittered_lattice(3));
        serial.run(&mut EnergyRecorder::default(), |_| {}).unwrap();
        let (state, lines) = distributed_run(params, jittered_lattice(3), 2, 3);
        assert_eq!(lines.len(), 6);
        assert_eq!(state.step(), 10);
        assert_close(state.epot, serial.state().epot, 1e-9);
        assert_close(state.ekin, serial.state().ekin, 1e-9);
    }

    #[test]
    fn kinetic_energy_and_temperature() {
        let snapshot = argon_3_snapshot();
        let ekin = get_kinetic_energy(&snapshot.velocities, 39.948);
        assert_eq!(format!("{:.8}", ekin), "0.20921778");
        assert_eq!(format!("{:.8}", get_temperature(ekin, 3)), "35.09411488");
        let single = get_kinetic_energy(&[Vector3::new(0.01, 0.0, 0.0)], 1.0);
        assert_close(get_temperature(single, 1), 2.0 * single / 3.0 / 0.0019872067, 1e-15);
    }

    #[test]
    fn single_atom_feels_nothing() {
        let snapshot = Snapshot {
            positions: vec![Vector3::new(1.0, 2.0, 3.0)],
            velocities: vec![Vector3::new(1e-3, 0.0, 0.0)],
        };
        let params = SystemParameters { nsteps: 10, ..argon_parameters(1) };
        let mut solver = serial_solver(params, snapshot);
        assert_eq!(solver.state().forces[0], Vector3::zeros());
        assert_eq!(solver.state().epot, 0.0);
        solver.run(&mut EnergyRecorder::default(), |_| {}).unwrap();
        let state = solver.state();
        assert_eq!(state.velocities[0], Vector3::new(1e-3, 0.0, 0.0));
        assert_close(state.positions[0].x, 1.0 + 10.0 * 5.0 * 1e-3, 1e-12);
    }

    #[test]
    fn rank_mismatch_is_fatal() {
        let params = argon_parameters(3);
        let state = SimulationState::new(params, argon_3_snapshot(), 1).unwrap();
        let results = LocalCluster::run(2, |comm| {
            let mut state = state.clone();
            let mut engine = LennardJonesEngine::new(&SingleProcess, &state).unwrap();
            engine.compute_forces(&comm, &mut state)
        }).unwrap();
        for result in results {
            assert_eq!(result, Err(TopologyError::RankMismatch { expected: 1, found: 2 }));
        }
    }

    #[test]
    fn broken_partial_on_one_rank_fails_every_rank() {
        let params = argon_parameters(3);
        let results = LocalCluster::run(2, |comm| {
            let mut state = SimulationState::new(params, argon_3_snapshot(), 1).unwrap();
            let mut engine = LennardJonesEngine::new(&comm, &state).unwrap();
            if comm.rank() == 1 {
                state.partial.forces.pop();
            }
            engine.compute_forces(&comm, &mut state)
        }).unwrap();
        assert_eq!(results[0], Err(TopologyError::PeerFailed { rank: 1 }));
        assert_eq!(results[1], Err(TopologyError::PartialSize { natoms: 3, threads: 1 }));
    }

    struct BrokenOutput;

    impl Output for BrokenOutput {
        fn write_frame(&mut self, _state: &SimulationState) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
    }

    #[test]
    fn write_errors_do_not_stop_run() {
        let mut reference = serial_solver(argon_parameters(3), argon_3_snapshot());
        reference.run(&mut EnergyRecorder::default(), |_| {}).unwrap();
        let mut solver = serial_solver(argon_parameters(3), argon_3_snapshot());
        let summary = solver.run(&mut BrokenOutput, |_| {}).expect("Can't run solver");
        assert_eq!(summary.steps, 100);
        assert_eq!(solver.phase(), Phase::Completed);
        assert_eq!(solver.state().step(), 100);
        assert_eq!(solver.state().positions, reference.state().positions);
        assert_eq!(solver.state().velocities, reference.state().velocities);
        assert_close(solver.state().ekin, reference.state().ekin, 1e-14);
    }

    #[test]
    fn periodic_images_are_equivalent() {
        let box_length = 17.158;
        let mut shifted = argon_3_snapshot();
        for position in shifted.positions.iter_mut() {
            position.x += 3.0 * box_length;
            position.z -= 2.0 * box_length;
        }
        let mut reference = serial_solver(argon_parameters(3), argon_3_snapshot());
        let mut solver = serial_solver(argon_parameters(3), shifted);
        assert_close(solver.state().ekin, reference.state().ekin, 1e-12);
        assert_close(solver.state().epot, reference.state().epot, 1e-12);
        for (f, f_ref) in solver.state().forces.iter().zip(&reference.state().forces) {
            assert!((f - f_ref).norm() <= 1e-11 * f_ref.norm(), "{f} vs {f_ref}");
        }
        reference.run(&mut EnergyRecorder::default(), |_| {}).unwrap();
        solver.run(&mut EnergyRecorder::default(), |_| {}).unwrap();
        assert_close(solver.state().epot, reference.state().epot, 1e-9);
        assert_close(solver.state().total_energy(), reference.state().total_energy(), 1e-9);
    }
}

use approx::assert_relative_eq;
use glam::DVec3;

use vof_rs::discretization::generator::create_tank;
use vof_rs::discretization::mesh::{Axis, CellId, Direction, Mesh};
use vof_rs::numerics::diagnostics::{NullSink, RecordingSink};
use vof_rs::numerics::pressure::PressureRelaxation;
use vof_rs::numerics::stability::StabilityGuard;
use vof_rs::numerics::sweep::SweepOrder;
use vof_rs::numerics::{fluid_divergence, Convergence, ConvergenceCriteria, ConvergenceMetric, Tolerance};
use vof_rs::physics::config::SolverConfig;

/// Closed box brimful of liquid, no free surface anywhere.
fn full_tank(dims: [usize; 3], config: &SolverConfig) -> Mesh {
    create_tank(dims, DVec3::splat(0.1), 10.0, config).expect("valid tank")
}

/// Nudge a handful of interior faces so the field is no longer
/// divergence free.
fn perturb(mesh: &mut Mesh) {
    for (n, cell) in mesh.interior_cells().enumerate() {
        let id = mesh.index(cell);
        for axis in Axis::ALL {
            if mesh.area(axis)[id] > 0.0 {
                mesh.velocity_mut(axis)[id] += 0.01 * ((n * 7 + axis.index() * 3) % 5) as f64 - 0.02;
            }
        }
    }
}

fn boundary_state(mesh: &Mesh) -> Vec<[f64; 4]> {
    (0..mesh.num_cells())
        .filter(|&id| mesh.is_boundary(mesh.cell(id)))
        .map(|id| [mesh.p[id], mesh.u[id], mesh.v[id], mesh.w[id]])
        .collect()
}

#[test]
fn single_cell_outflow() {
    let mut mesh = Mesh::new([5, 5, 5], DVec3::ONE).unwrap();
    let cell = CellId::new(2, 2, 2);
    let id = mesh.index(cell);
    mesh.fv[id] = 1.0;
    mesh.vof[id] = 1.0;
    mesh.peta[id] = 1.0;
    mesh.beta[id] = 1.0;
    for dir in Direction::ALL {
        let owner = mesh.face_owner(cell, dir).unwrap();
        let o = mesh.index(owner);
        match dir.axis() {
            Axis::X => mesh.ae[o] = 1.0,
            Axis::Y => mesh.an[o] = 1.0,
            Axis::Z => mesh.at[o] = 1.0,
        }
    }
    mesh.u[id] = 1.0;

    let mut config = SolverConfig {
        rho: 1.0,
        delt: 0.01,
        omg: 1.7,
        ..Default::default()
    };
    let report = PressureRelaxation::new().sweep(&mut mesh, &mut config, &mut NullSink);

    println!("P = {:.6}, U = {:.6}, D after = {:.6}", mesh.p[id], mesh.u[id], mesh.d[id]);
    assert_relative_eq!(report.max_divergence, 1.0);
    assert_relative_eq!(mesh.p[id], -1.0);
    assert_relative_eq!(mesh.u[id], 0.99, epsilon = 1e-12);
    // x: 0.99 - 0.01; y and z: each face pair now pulls in 0.02
    assert_relative_eq!(mesh.d[id], 0.94, epsilon = 1e-12);
    assert!(config.p_flag);
}

#[test]
fn correction_scales_divergence_by_one_minus_omg() {
    let mut config = SolverConfig::default();
    let mut mesh = create_tank([4, 3, 3], DVec3::ONE, 10.0, &config).unwrap();
    let left = mesh.index(CellId::new(1, 1, 1));
    let right = mesh.index(CellId::new(2, 1, 1));
    mesh.u[left] = 1.0;

    let report = PressureRelaxation::new().sweep(&mut mesh, &mut config, &mut NullSink);
    let omg = config.omg;

    println!("D left = {:.6e}, D right = {:.6e}", mesh.d[left], mesh.d[right]);
    assert_relative_eq!(report.max_divergence, 1.0);
    assert_relative_eq!(mesh.d[left], 1.0 - omg, epsilon = 1e-9);
    // the right cell saw the already corrected shared face
    assert_relative_eq!(mesh.d[right], -(1.0 - omg).powi(2), epsilon = 1e-9);
    assert!(mesh.d[right].abs() < (1.0 - omg).abs());
}

#[test]
fn boundary_layer_is_never_written() {
    let mut config = SolverConfig::default();
    let mut mesh = create_tank([6, 6, 7], DVec3::splat(0.1), 0.27, &config).unwrap();
    perturb(&mut mesh);
    let before = boundary_state(&mesh);

    let mut sink = RecordingSink::default();
    StabilityGuard.run(&mut mesh, &config, &mut sink);
    for iter in 1..=20 {
        config.iter = iter;
        PressureRelaxation::new().sweep(&mut mesh, &mut config, &mut sink);
    }

    assert_eq!(boundary_state(&mesh), before);
}

#[test]
fn hydrostatic_tank_is_at_rest() {
    let mut config = SolverConfig::default();
    let mut mesh = create_tank([6, 6, 8], DVec3::splat(0.1), 0.37, &config).unwrap();
    let pressure = mesh.p.clone();

    let guard = StabilityGuard.run(&mut mesh, &config, &mut NullSink);
    let report = PressureRelaxation::new().sweep(&mut mesh, &mut config, &mut NullSink);

    let drift = (&mesh.p - &pressure).amax();
    println!("surface cells {}, max |delp| {:.3e}, drift {:.3e}", report.surface_cells, report.max_correction, drift);
    assert_eq!(guard.clamps, 0);
    assert_eq!(report.surface_cells, 16);
    assert_eq!(report.surface_clamps, 0);
    assert!(!config.p_flag);
    assert!(report.max_correction < 1e-8);
    assert!(drift < 1e-8);
}

#[test]
fn sweeps_converge_in_either_order() {
    let convergence = Convergence {
        criteria: ConvergenceCriteria::Residual,
        tolerance: Tolerance::Absolute(1e-3),
        metric: ConvergenceMetric::MaxNorm,
    };

    for order in [SweepOrder::Lexicographic, SweepOrder::RedBlack] {
        let mut config = SolverConfig {
            sweep_order: order,
            ..Default::default()
        };
        let mut mesh = full_tank([6, 6, 6], &config);
        perturb(&mut mesh);

        let relaxation = PressureRelaxation::new();
        let mut sweeps = 0;
        loop {
            config.iter += 1;
            relaxation.sweep(&mut mesh, &mut config, &mut NullSink);
            sweeps += 1;
            if !config.p_flag || sweeps >= 2000 {
                break;
            }
        }

        let residual = convergence.norm(&fluid_divergence(&mesh, config.emf));
        println!("{:?}: {} sweeps, max |D| {:.3e}", order, sweeps, residual);
        assert!(!config.p_flag, "{order:?} did not converge");
        assert!(convergence.check_tolerance(residual, 1.0));

        // keep sweeping: once settled the field must stay converged and the
        // corrections keep shrinking
        config.iter += 1;
        let converged = relaxation.sweep(&mut mesh, &mut config, &mut NullSink);
        let mut last = converged;
        for extra in 1..=30 {
            config.iter += 1;
            last = relaxation.sweep(&mut mesh, &mut config, &mut NullSink);
            if extra > 10 {
                assert!(!last.unconverged, "{order:?} relapsed {extra} sweeps after converging");
            }
        }
        println!(
            "{:?}: max |delp| {:.3e} -> {:.3e} after 30 more sweeps",
            order, converged.max_correction, last.max_correction
        );
        assert!(!config.p_flag);
        assert!(last.max_correction < converged.max_correction);
    }
}

#[test]
fn hydrostatic_tank_stays_at_rest_over_many_sweeps() {
    let mut config = SolverConfig::default();
    let mut mesh = create_tank([6, 6, 8], DVec3::splat(0.1), 0.37, &config).unwrap();
    let pressure = mesh.p.clone();
    let relaxation = PressureRelaxation::new();

    for iter in 1..=25 {
        config.iter = iter;
        let report = relaxation.sweep(&mut mesh, &mut config, &mut NullSink);
        assert!(!config.p_flag, "sweep {iter} flagged the resting tank");
        assert!(report.max_correction < 1e-8);
    }
    assert!((&mesh.p - &pressure).amax() < 1e-8);
}

use crate::discretization::mesh::{Direction, Mesh};
use crate::numerics::diagnostics::{DiagnosticSink, StabilityClamp};
use crate::numerics::sweep::ordered_sweep;
use crate::numerics::timing::record_guard;
use crate::physics::config::SolverConfig;

/// Velocity change a pressure jump `dp` across spacing `del` induces in one
/// timestep.
#[inline]
pub fn velocity_change(dp: f64, del: f64, config: &SolverConfig) -> f64 {
    config.delt * dp / (del * config.rho)
}

/// Inverse of [`velocity_change`].
#[inline]
pub fn pressure_for_velocity(dv: f64, del: f64, config: &SolverConfig) -> f64 {
    dv * del * config.rho / config.delt
}

/// CFL-like bound on the velocity change across a face of open area `area`
/// between cells whose smaller open volume is `fv_min`.
#[inline]
pub fn stability_limit(fv_min: f64, area: f64, del: f64, config: &SolverConfig) -> f64 {
    config.con * (fv_min / area) * del / config.delt
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GuardReport {
    /// Face pairs whose pressure excess was compared against the limit.
    pub pairs_checked: usize,
    pub clamps: usize,
    /// Largest `|dv| / stabil_limit` seen, before clamping.
    pub worst_ratio: f64,
}

/// Clamps pressure differences between neighboring fluid cells that would
/// push a face velocity past the stability limit in one timestep.
///
/// Only `P` of interior cells is written; velocities and divergence are left
/// alone. Meant to run before the relaxation sweeps of a timestep.
#[derive(Clone, Copy, Debug, Default)]
pub struct StabilityGuard;

impl StabilityGuard {
    pub fn run(
        &self,
        mesh: &mut Mesh,
        config: &SolverConfig,
        sink: &mut dyn DiagnosticSink,
    ) -> GuardReport {
        record_guard(|| self.run_inner(mesh, config, sink))
    }

    fn run_inner(
        &self,
        mesh: &mut Mesh,
        config: &SolverConfig,
        sink: &mut dyn DiagnosticSink,
    ) -> GuardReport {
        let emf = config.emf;
        let mut report = GuardReport::default();

        for cell in ordered_sweep(mesh, config.sweep_order) {
            for dir in Direction::ALL {
                let Some(neighbor) = mesh.neighbor(cell, dir) else {
                    continue;
                };
                let (c, n) = (mesh.index(cell), mesh.index(neighbor));

                if mesh.vof[c] < emf || mesh.vof[n] < emf {
                    continue;
                }
                if mesh.fv[c] < emf || mesh.fv[n] < emf {
                    continue;
                }

                let ax = mesh.face_area(cell, dir);
                if ax < emf {
                    continue;
                }

                let axis = dir.axis();
                let del = mesh.spacing(axis);
                let ux = mesh.face_velocity(cell, dir);
                let hydrostatic = config.gravity_component(axis) * del * config.rho * dir.sign();

                let dp = mesh.p[c] - mesh.p[n] + hydrostatic;
                if dp <= emf {
                    continue;
                }
                report.pairs_checked += 1;

                let dv = velocity_change(dp, del, config);
                let mut limit = stability_limit(mesh.fv[c].min(mesh.fv[n]), ax, del, config);
                // flow already runs the way the jump pushes it
                if dir.sign() * ux > emf {
                    limit = (limit - ux.abs()).max(emf).min(limit);
                }

                report.worst_ratio = report.worst_ratio.max(dv.abs() / limit);
                if dv.abs() <= limit {
                    continue;
                }

                let new_dp = pressure_for_velocity(limit, del, config) - hydrostatic;
                mesh.p[c] = mesh.p[n] + new_dp - emf;
                report.clamps += 1;

                sink.stability_clamp(&StabilityClamp {
                    cell,
                    neighbor,
                    old_dp: dp,
                    new_dp,
                    dv,
                    stabil_limit: limit,
                });
            }
        }

        report
    }
}

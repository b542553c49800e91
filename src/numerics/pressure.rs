//! One relaxation sweep of the pressure/velocity correction.
//!
//! Fully submerged cells take a Newton-like step on their divergence residual;
//! free-surface cells get a pressure interpolated between their interpolation
//! neighbor and the (zero) surface pressure. Either way the correction is
//! applied to `P` and to the six face velocities of the cell, in place.

use crate::discretization::mesh::{CellId, Direction, Mesh};
use crate::numerics::diagnostics::{ConvergenceTrouble, DiagnosticSink, SurfaceClamp};
use crate::numerics::stability::{pressure_for_velocity, stability_limit, velocity_change};
use crate::numerics::sweep::ordered_sweep;
use crate::numerics::timing::record_sweep;
use crate::physics::config::{SolverConfig, SurfaceClampMode};

/// What a surface cell interpolates against: the neighbor across the face
/// named by its `n_vof`, and the geometry of that face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceStencil {
    pub direction: Direction,
    pub neighbor: CellId,
    /// Open area of the shared face.
    pub ax: f64,
    /// Velocity on the shared face.
    pub ux: f64,
    pub del: f64,
    /// Gravity component along the face normal.
    pub g: f64,
    /// Opposite face, when the cell on that side is not a surface cell.
    pub ignored: Option<Direction>,
}

impl SurfaceStencil {
    pub fn new(mesh: &Mesh, cell: CellId, config: &SolverConfig) -> Option<Self> {
        let direction = mesh.n_vof[mesh.index(cell)]?;
        let neighbor = mesh.neighbor(cell, direction)?;
        let axis = direction.axis();
        let ignored = mesh
            .neighbor(cell, direction.opposite())
            .filter(|&behind| mesh.n_vof[mesh.index(behind)].is_none())
            .map(|_| direction.opposite());

        Some(Self {
            direction,
            neighbor,
            ax: mesh.face_area(cell, direction),
            ux: mesh.face_velocity(cell, direction),
            del: mesh.spacing(axis),
            g: config.gravity_component(axis),
            ignored,
        })
    }
}

/// Pressure under a liquid column: `|g|·rho·(VOF + 0.5)·del`.
pub fn hydrostatic_estimate(vof: f64, del: f64, config: &SolverConfig) -> f64 {
    config.gravity().length() * config.rho * (vof + 0.5) * del
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SweepReport {
    pub iter: u32,
    pub surface_cells: usize,
    pub interior_cells: usize,
    pub unconverged_cells: usize,
    pub surface_clamps: usize,
    /// Largest `|D|` of the interior cells before their correction.
    pub max_divergence: f64,
    /// Largest `|delp|` applied to any cell.
    pub max_correction: f64,
    /// Copy of `p_flag` at the end of the sweep.
    pub unconverged: bool,
}

/// Performs relaxation sweeps over a mesh.
///
/// The optional previous-timestep snapshot is read only, for convergence
/// diagnostics.
#[derive(Clone, Copy, Debug, Default)]
pub struct PressureRelaxation<'a> {
    previous: Option<&'a Mesh>,
}

impl<'a> PressureRelaxation<'a> {
    pub fn new() -> Self {
        Self { previous: None }
    }

    pub fn with_previous(previous: &'a Mesh) -> Self {
        Self {
            previous: Some(previous),
        }
    }

    /// One Gauss-Seidel sweep over the interior cells. Clears `config.p_flag`
    /// on entry and sets it if any cell stays above `epsi / FV`.
    pub fn sweep(
        &self,
        mesh: &mut Mesh,
        config: &mut SolverConfig,
        sink: &mut dyn DiagnosticSink,
    ) -> SweepReport {
        record_sweep(|| self.sweep_inner(mesh, config, sink))
    }

    fn sweep_inner(
        &self,
        mesh: &mut Mesh,
        config: &mut SolverConfig,
        sink: &mut dyn DiagnosticSink,
    ) -> SweepReport {
        config.p_flag = false;
        let emf = config.emf;
        let mut report = SweepReport {
            iter: config.iter,
            ..Default::default()
        };

        for cell in ordered_sweep(mesh, config.sweep_order) {
            let c = mesh.index(cell);
            if mesh.fv[c] < emf || mesh.vof[c] < emf {
                continue;
            }

            let surface = SurfaceStencil::new(mesh, cell, config);
            let delp = match surface {
                Some(stencil) => {
                    report.surface_cells += 1;
                    self.surface_correction(mesh, cell, &stencil, config, sink, &mut report)
                }
                None => {
                    report.interior_cells += 1;
                    self.interior_correction(mesh, cell, config, sink, &mut report)
                }
            };

            apply_correction(mesh, cell, delp, config);
            report.max_correction = report.max_correction.max(delp.abs());

            // D is the volume-normalised flux balance with no density factor.
            // Surface cells keep the D = 0 written by `surface_correction`.
            if surface.is_none() {
                mesh.d[c] = mesh.flux_balance(cell) / mesh.fv[c];
            }
        }

        report.unconverged = config.p_flag;
        report
    }

    /// Pressure change that puts a surface cell on the line between its
    /// interpolation neighbor and the surface pressure. Forces `D = 0`.
    fn surface_correction(
        &self,
        mesh: &mut Mesh,
        cell: CellId,
        stencil: &SurfaceStencil,
        config: &SolverConfig,
        sink: &mut dyn DiagnosticSink,
        report: &mut SweepReport,
    ) -> f64 {
        let emf = config.emf;
        let c = mesh.index(cell);
        let n = mesh.index(stencil.neighbor);
        let peta = mesh.peta[c];

        let mut plmn = mesh.p[n];
        // small floating droplet: the neighbor is surface too, use the surface pressure
        if mesh.n_vof[n].is_some() {
            plmn = 0.0;
        }
        let neighbor_blocked = mesh.fv[n] < emf;
        if neighbor_blocked {
            plmn = hydrostatic_estimate(mesh.vof[c], stencil.del, config);
        }

        let mut delp = (1.0 - peta) * plmn;

        if !neighbor_blocked && stencil.ax >= emf {
            if let Some(relieved) = relieve_surface_pressure(mesh, cell, stencil, plmn, delp, config)
            {
                report.surface_clamps += 1;
                if relieved.write_neighbor && mesh.is_interior(stencil.neighbor) {
                    mesh.p[n] = relieved.plmn;
                }
                sink.surface_clamp(&SurfaceClamp {
                    cell,
                    neighbor: stencil.neighbor,
                    old_correction: delp - mesh.p[c],
                    new_correction: relieved.delp - mesh.p[c],
                    dv: relieved.dv,
                    ux: stencil.ux,
                    plmn: relieved.plmn,
                    stabil_limit: relieved.limit,
                });
                delp = relieved.delp;
            }
        }

        mesh.d[c] = 0.0;
        delp - mesh.p[c]
    }

    /// Divergence-driven pressure step for a fully submerged cell.
    fn interior_correction(
        &self,
        mesh: &mut Mesh,
        cell: CellId,
        config: &mut SolverConfig,
        sink: &mut dyn DiagnosticSink,
        report: &mut SweepReport,
    ) -> f64 {
        let emf = config.emf;
        let c = mesh.index(cell);
        let fv = mesh.fv[c];
        let vof = mesh.vof[c];

        let mut d = mesh.flux_balance(cell) / fv;
        // de-foaming: let partly filled cells drain instead of lingering
        if vof < 1.0 - emf {
            d += (100.0 * config.epsi).min(0.1 * (1.0 - vof) / config.delt);
        }
        mesh.d[c] = d;
        report.max_divergence = report.max_divergence.max(d.abs());

        let mut delp = -mesh.beta[c] * d * mesh.peta[c];
        delp /= config.schedule.omg_adjustment(config.iter, config.omg);

        if d.abs() > config.epsi / fv {
            config.p_flag = true;
            report.unconverged_cells += 1;
            if config.trouble_report.is_due(config.iter) {
                sink.slow_convergence(&self.trouble(mesh, cell, delp, config));
            }
        }

        delp
    }

    fn trouble(&self, mesh: &Mesh, cell: CellId, delp: f64, config: &SolverConfig) -> ConvergenceTrouble {
        let c = mesh.index(cell);
        let neighbor_normals = Direction::ALL.map(|dir| {
            mesh.neighbor(cell, dir)
                .and_then(|nb| mesh.n_vof[mesh.index(nb)])
        });
        let previous = self
            .previous
            .filter(|prev| prev.dims == mesh.dims);

        ConvergenceTrouble {
            cell,
            iter: config.iter,
            p: mesh.p[c],
            p_previous: previous.map(|prev| prev.p[c]),
            vof: mesh.vof[c],
            delp,
            divergence: mesh.d[c],
            peta: mesh.peta[c],
            beta: mesh.beta[c],
            neighbor_normals,
            velocity: mesh.velocity_at(cell),
            velocity_previous: previous.map(|prev| prev.velocity_at(cell)),
        }
    }
}

struct Relieved {
    plmn: f64,
    delp: f64,
    dv: f64,
    limit: f64,
    write_neighbor: bool,
}

/// Stability check of the pressure a surface cell imposes toward its
/// neighbor. Returns the relieved values when the limit is exceeded.
fn relieve_surface_pressure(
    mesh: &Mesh,
    cell: CellId,
    stencil: &SurfaceStencil,
    plmn: f64,
    delp: f64,
    config: &SolverConfig,
) -> Option<Relieved> {
    let c = mesh.index(cell);
    let n = mesh.index(stencil.neighbor);
    let peta = mesh.peta[c];
    let del = stencil.del;
    let ux = stencil.ux;
    // +1 when the face velocity points from the neighbor into the cell
    let inward = -stencil.direction.sign();

    let dp = plmn - delp;
    let dv = velocity_change(dp, del, config);
    let limit = stability_limit(mesh.fv[c].min(mesh.fv[n]), stencil.ax, del, config);

    match config.surface_clamp {
        SurfaceClampMode::Halved => {
            let limit = if inward * ux > 0.0 {
                (limit - ux.abs()).max(config.emf).min(limit / 2.0)
            } else {
                limit / 2.0
            };
            if dv.abs() <= limit || peta <= 0.0 {
                return None;
            }
            let dp = pressure_for_velocity(limit, del, config).copysign(dp);
            let plmn = dp / peta;
            Some(Relieved {
                plmn,
                delp: (1.0 - peta) * plmn,
                dv,
                limit,
                write_neighbor: true,
            })
        }
        SurfaceClampMode::Legacy => {
            if (dv * inward + ux).abs() <= limit && dv.abs() <= limit / 4.0 {
                return None;
            }
            Some(Relieved {
                plmn,
                delp: plmn - dp / 2.0,
                dv,
                limit,
                write_neighbor: false,
            })
        }
    }
}

/// Adds `delp` to the cell pressure and projects it onto the open faces of
/// the cell: faces on the +x/+y/+z side speed up outward, faces on the other
/// side slow down. Faces stored on boundary-layer cells are left to the
/// boundary conditions.
fn apply_correction(mesh: &mut Mesh, cell: CellId, delp: f64, config: &SolverConfig) {
    let c = mesh.index(cell);
    mesh.p[c] += delp;

    for dir in Direction::ALL {
        let Some(owner) = mesh.face_owner(cell, dir) else {
            continue;
        };
        if !mesh.is_interior(owner) {
            continue;
        }
        let axis = dir.axis();
        let o = mesh.index(owner);
        if mesh.area(axis)[o] <= config.emf {
            continue;
        }
        let dv = config.delt * mesh.reciprocal(axis) * delp / config.rho;
        mesh.velocity_mut(axis)[o] += dir.sign() * dv;
    }
}

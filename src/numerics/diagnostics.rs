//! Records emitted when a pass clamps pressure or a cell keeps failing to
//! converge, and the sinks that receive them.

use glam::DVec3;

use crate::discretization::mesh::{CellId, Direction};

/// A pressure jump between two fluid cells that the stability guard clamped.
#[derive(Clone, Debug, PartialEq)]
pub struct StabilityClamp {
    pub cell: CellId,
    pub neighbor: CellId,
    /// Pressure difference including the hydrostatic term, before clamping.
    pub old_dp: f64,
    /// Pressure difference written back, without the hydrostatic term.
    pub new_dp: f64,
    /// Velocity change the old difference would have induced.
    pub dv: f64,
    pub stabil_limit: f64,
}

/// A free-surface pressure that the relaxation sweep had to relieve.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceClamp {
    pub cell: CellId,
    pub neighbor: CellId,
    /// Correction `delp − P(cell)` before and after relieving.
    pub old_correction: f64,
    pub new_correction: f64,
    pub dv: f64,
    /// Face velocity between the cell and its interpolation neighbor.
    pub ux: f64,
    /// Neighbor pressure after relieving.
    pub plmn: f64,
    pub stabil_limit: f64,
}

/// State of a cell still above tolerance late in the iteration.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvergenceTrouble {
    pub cell: CellId,
    pub iter: u32,
    pub p: f64,
    /// Pressure in the previous-timestep snapshot, when one was supplied.
    pub p_previous: Option<f64>,
    pub vof: f64,
    pub delp: f64,
    pub divergence: f64,
    pub peta: f64,
    pub beta: f64,
    /// Surface orientation of the six neighbors, in [`Direction::ALL`] order.
    pub neighbor_normals: [Option<Direction>; 6],
    pub velocity: DVec3,
    pub velocity_previous: Option<DVec3>,
}

/// Receives the observational output of the pressure passes.
///
/// Implementations must not feed back into the numerics; every call happens
/// after the corresponding correction has been decided.
pub trait DiagnosticSink {
    fn stability_clamp(&mut self, record: &StabilityClamp);

    fn surface_clamp(&mut self, record: &SurfaceClamp);

    fn slow_convergence(&mut self, _record: &ConvergenceTrouble) {}
}

/// Forwards every record to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn stability_clamp(&mut self, r: &StabilityClamp) {
        log::warn!(
            "stability limit violation in cell {:?} to {:?}: dp {:.6e} -> {:.6e} (dv {:.3e}, limit {:.3e})",
            (r.cell.i, r.cell.j, r.cell.k),
            (r.neighbor.i, r.neighbor.j, r.neighbor.k),
            r.old_dp,
            r.new_dp,
            r.dv,
            r.stabil_limit
        );
    }

    fn surface_clamp(&mut self, r: &SurfaceClamp) {
        log::warn!(
            "excessive pressure gradient at surface cell {:?} (neighbor {:?}): {:.6e} -> {:.6e}, dv {:.3e}, ux {:.3e}, plmn {:.6e}",
            (r.cell.i, r.cell.j, r.cell.k),
            (r.neighbor.i, r.neighbor.j, r.neighbor.k),
            r.old_correction,
            r.new_correction,
            r.dv,
            r.ux,
            r.plmn
        );
    }

    fn slow_convergence(&mut self, r: &ConvergenceTrouble) {
        log::debug!(
            "cell {:?} having trouble with convergence at iter {}: P {:.6e} PN {:?} VOF {:.4} delp {:.3e} D {:.3e} PETA {:.4} BETA {:.3e} neighbors {:?} U {:?} UN {:?}",
            (r.cell.i, r.cell.j, r.cell.k),
            r.iter,
            r.p,
            r.p_previous,
            r.vof,
            r.delp,
            r.divergence,
            r.peta,
            r.beta,
            r.neighbor_normals,
            r.velocity,
            r.velocity_previous
        );
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn stability_clamp(&mut self, _record: &StabilityClamp) {}

    fn surface_clamp(&mut self, _record: &SurfaceClamp) {}
}

/// Keeps every record, for tests and summaries.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub stability: Vec<StabilityClamp>,
    pub surface: Vec<SurfaceClamp>,
    pub trouble: Vec<ConvergenceTrouble>,
}

impl RecordingSink {
    pub fn is_empty(&self) -> bool {
        self.stability.is_empty() && self.surface.is_empty() && self.trouble.is_empty()
    }

    pub fn clear(&mut self) {
        self.stability.clear();
        self.surface.clear();
        self.trouble.clear();
    }
}

impl DiagnosticSink for RecordingSink {
    fn stability_clamp(&mut self, record: &StabilityClamp) {
        self.stability.push(record.clone());
    }

    fn surface_clamp(&mut self, record: &SurfaceClamp) {
        self.surface.push(record.clone());
    }

    fn slow_convergence(&mut self, record: &ConvergenceTrouble) {
        self.trouble.push(record.clone());
    }
}

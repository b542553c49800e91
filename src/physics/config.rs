use glam::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::discretization::mesh::Axis;
use crate::numerics::schedule::RelaxationSchedule;
use crate::numerics::sweep::SweepOrder;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f64 },
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("empty-fraction threshold must lie in (0, 1), got {0}")]
    EmptyFraction(f64),
    #[error("damping window {window} divides by omg {divisor:+}, which must be positive")]
    DampingDivisor { window: usize, divisor: f64 },
}

/// How the surface-cell branch bounds the pressure it imposes on its
/// interpolation neighbor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceClampMode {
    /// Halve the stability limit and rebuild the neighbor pressure from it.
    #[default]
    Halved,
    /// Older rule: halve the pressure jump whenever the induced velocity,
    /// added to the face velocity, exceeds the limit or exceeds a quarter of it
    /// on its own. Leaves the neighbor pressure untouched.
    Legacy,
}

/// When unconverged cells are reported to the diagnostic sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TroubleReport {
    pub after_iter: u32,
    /// Report on every `every`th iteration; 0 disables reporting.
    pub every: u32,
}

impl Default for TroubleReport {
    fn default() -> Self {
        Self {
            after_iter: 200,
            every: 100,
        }
    }
}

impl TroubleReport {
    pub fn is_due(&self, iter: u32) -> bool {
        self.every > 0 && iter > self.after_iter && iter % self.every == 0
    }
}

/// Physical and numerical constants shared by both pressure passes.
///
/// Read-only during a pass, except `p_flag`, which
/// [`PressureRelaxation`](crate::numerics::pressure::PressureRelaxation)
/// clears on entry and raises for any unconverged cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Fluid density.
    pub rho: f64,
    pub gx: f64,
    pub gy: f64,
    pub gz: f64,
    /// Sound speed squared. Only validated; the pressure passes are
    /// incompressible.
    pub csq: f64,
    /// Empty-fraction threshold below which a volume, area or fill is zero.
    pub emf: f64,
    /// Divergence tolerance.
    pub epsi: f64,
    /// Stability constant of the CFL-like limit.
    pub con: f64,
    /// Over-relaxation factor.
    pub omg: f64,
    pub delt: f64,
    /// Outer iteration counter, advanced by the caller.
    pub iter: u32,
    /// Set when any cell stays unconverged in the last relaxation sweep.
    #[serde(skip)]
    pub p_flag: bool,

    pub surface_clamp: SurfaceClampMode,
    pub sweep_order: SweepOrder,
    pub schedule: RelaxationSchedule,
    pub trouble_report: TroubleReport,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            rho: 1000.0,
            gx: 0.0,
            gy: 0.0,
            gz: -9.81,
            csq: 1.0e10,
            emf: 1.0e-6,
            epsi: 1.0e-3,
            con: 0.3,
            omg: 1.7,
            delt: 1.0e-3,
            iter: 0,
            p_flag: false,
            surface_clamp: SurfaceClampMode::default(),
            sweep_order: SweepOrder::default(),
            schedule: RelaxationSchedule::default(),
            trouble_report: TroubleReport::default(),
        }
    }
}

impl SolverConfig {
    pub fn gravity(&self) -> DVec3 {
        DVec3::new(self.gx, self.gy, self.gz)
    }

    pub fn gravity_component(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.gx,
            Axis::Y => self.gy,
            Axis::Z => self.gz,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = [
            ("rho", self.rho),
            ("gx", self.gx),
            ("gy", self.gy),
            ("gz", self.gz),
            ("csq", self.csq),
            ("emf", self.emf),
            ("epsi", self.epsi),
            ("con", self.con),
            ("omg", self.omg),
            ("delt", self.delt),
        ];
        if let Some(&(name, value)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::NotFinite { name, value });
        }

        let positive = [
            ("rho", self.rho),
            ("csq", self.csq),
            ("epsi", self.epsi),
            ("con", self.con),
            ("omg", self.omg),
            ("delt", self.delt),
        ];
        if let Some(&(name, value)) = positive.iter().find(|(_, v)| *v <= 0.0) {
            return Err(ConfigError::NonPositive { name, value });
        }

        if self.emf <= 0.0 || self.emf >= 1.0 {
            return Err(ConfigError::EmptyFraction(self.emf));
        }

        for (window, w) in self.schedule.windows.iter().enumerate() {
            let divisor = self.omg + w.omg_offset;
            if divisor <= 0.0 {
                return Err(ConfigError::DampingDivisor { window, divisor });
            }
        }

        Ok(())
    }
}

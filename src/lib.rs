//! Pressure projection for incompressible free-surface flow on a structured
//! 3D grid, with the liquid tracked as a Volume-of-Fluid fraction.
//!
//! The crate provides the two per-timestep passes that enforce mass
//! conservation: [`numerics::stability::StabilityGuard`] pre-conditions the
//! pressure field against updates that would break the explicit scheme, and
//! [`numerics::pressure::PressureRelaxation`] performs one Gauss-Seidel sweep
//! of the pressure/velocity correction. Advection, interface reconstruction and
//! the timestep loop itself belong to the caller.

pub mod discretization;
pub mod numerics;
pub mod physics;
pub mod processing;

pub use discretization::mesh::{Axis, CellId, Direction, Mesh, MeshError};
pub use numerics::diagnostics::{DiagnosticSink, LogSink, NullSink, RecordingSink};
pub use numerics::pressure::{PressureRelaxation, SweepReport};
pub use numerics::stability::{GuardReport, StabilityGuard};
pub use physics::config::{ConfigError, SolverConfig, SurfaceClampMode};

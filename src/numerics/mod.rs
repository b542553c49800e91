pub mod diagnostics;
pub mod pressure;
pub mod schedule;
pub mod stability;
pub mod sweep;
pub mod timing;

use nalgebra::DVector;

use crate::discretization::mesh::Mesh;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tolerance {
    Absolute(f64),
    Relative(f64),
    Combined(f64, f64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConvergenceMetric {
    L2Norm,
    MaxNorm,
}

/// What a driver watches between relaxation sweeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConvergenceCriteria {
    /// Divergence residual of the submerged cells.
    Residual,
    /// Pressure change over the last sweep.
    Update,
    Both,
}

/// Outer-loop stopping test on top of the per-cell `p_flag`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Convergence {
    pub criteria: ConvergenceCriteria,
    pub tolerance: Tolerance,
    pub metric: ConvergenceMetric,
}

impl Convergence {
    pub fn norm(&self, vector: &DVector<f64>) -> f64 {
        if vector.is_empty() {
            return 0.0;
        }
        match self.metric {
            ConvergenceMetric::L2Norm => vector.norm(),
            ConvergenceMetric::MaxNorm => vector.amax(),
        }
    }

    pub fn check_tolerance(&self, norm: f64, initial_norm: f64) -> bool {
        let relative = |tol: f64| initial_norm > 0.0 && norm / initial_norm < tol;
        match self.tolerance {
            Tolerance::Absolute(tol) => norm < tol,
            Tolerance::Relative(tol) => relative(tol),
            Tolerance::Combined(abs_tol, rel_tol) => norm < abs_tol || relative(rel_tol),
        }
    }

    /// `pressure_change` is `P` after the sweep minus `P` before it.
    pub fn check_convergence(
        &self,
        mesh: &Mesh,
        emf: f64,
        pressure_change: &DVector<f64>,
        initial_residual_norm: f64,
        initial_update_norm: f64,
    ) -> bool {
        let residual = || self.check_tolerance(self.norm(&fluid_divergence(mesh, emf)), initial_residual_norm);
        let update = || self.check_tolerance(self.norm(pressure_change), initial_update_norm);
        match self.criteria {
            ConvergenceCriteria::Residual => residual(),
            ConvergenceCriteria::Update => update(),
            ConvergenceCriteria::Both => residual() && update(),
        }
    }
}

/// `D` of every interior cell that holds liquid and is not a surface cell,
/// in sweep order. Surface cells are excluded since the sweep pins their
/// `D` to zero.
pub fn fluid_divergence(mesh: &Mesh, emf: f64) -> DVector<f64> {
    let values: Vec<f64> = mesh
        .interior_cells()
        .map(|cell| mesh.index(cell))
        .filter(|&c| mesh.fv[c] >= emf && mesh.vof[c] >= emf && mesh.n_vof[c].is_none())
        .map(|c| mesh.d[c])
        .collect();
    DVector::from_vec(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretization::mesh::{CellId, Direction};
    use glam::DVec3;

    fn convergence(criteria: ConvergenceCriteria, tolerance: Tolerance) -> Convergence {
        Convergence {
            criteria,
            tolerance,
            metric: ConvergenceMetric::MaxNorm,
        }
    }

    #[test]
    fn divergence_skips_void_and_surface_cells() {
        let mut mesh = Mesh::new([4, 3, 3], DVec3::ONE).unwrap();
        let a = mesh.index(CellId::new(1, 1, 1));
        let b = mesh.index(CellId::new(2, 1, 1));
        for id in [a, b] {
            mesh.fv[id] = 1.0;
            mesh.vof[id] = 1.0;
        }
        mesh.d[a] = -3.0;
        mesh.d[b] = 7.0;
        mesh.n_vof[b] = Some(Direction::West);

        let d = fluid_divergence(&mesh, 1e-6);
        assert_eq!(d.as_slice(), &[-3.0]);
    }

    #[test]
    fn norms_of_empty_field_are_zero() {
        let c = convergence(ConvergenceCriteria::Residual, Tolerance::Absolute(1e-3));
        assert_eq!(c.norm(&DVector::zeros(0)), 0.0);
        let c = Convergence {
            metric: ConvergenceMetric::L2Norm,
            ..c
        };
        assert_eq!(c.norm(&DVector::from_vec(vec![3.0, -4.0])), 5.0);
    }

    #[test]
    fn tolerance_modes() {
        let abs = convergence(ConvergenceCriteria::Residual, Tolerance::Absolute(1e-3));
        assert!(abs.check_tolerance(5e-4, 1.0));
        assert!(!abs.check_tolerance(5e-3, 1.0));

        let rel = convergence(ConvergenceCriteria::Residual, Tolerance::Relative(1e-2));
        assert!(rel.check_tolerance(5e-3, 1.0));
        assert!(!rel.check_tolerance(5e-3, 0.0));

        let both = convergence(ConvergenceCriteria::Residual, Tolerance::Combined(1e-6, 1e-2));
        assert!(both.check_tolerance(5e-7, 0.0));
        assert!(both.check_tolerance(0.5, 100.0));
    }

    #[test]
    fn update_criterion_reads_pressure_change() {
        let mesh = Mesh::new([3, 3, 3], DVec3::ONE).unwrap();
        let c = convergence(ConvergenceCriteria::Update, Tolerance::Absolute(1e-2));
        let small = DVector::from_vec(vec![1e-3, -2e-3]);
        let large = DVector::from_vec(vec![1e-3, -2.0]);
        assert!(c.check_convergence(&mesh, 1e-6, &small, 1.0, 1.0));
        assert!(!c.check_convergence(&mesh, 1e-6, &large, 1.0, 1.0));
    }
}

use crate::discretization::mesh::{Axis, CellId, Mesh};
use crate::physics::config::SolverConfig;

/// Fill `BETA` for every interior fluid cell.
///
/// One interior correction `delp = −BETA·D` then moves the divergence of the
/// cell to `(1 − omg)·D`, ignoring later updates of its neighbors. Only faces
/// the sweep actually moves count: open (`> emf`) and stored on an interior
/// cell. Blocked cells and cells without such a face get zero.
pub fn relaxation_coefficients(mesh: &mut Mesh, config: &SolverConfig) {
    mesh.beta.fill(0.0);
    for cell in mesh.interior_cells() {
        let c = mesh.index(cell);
        if mesh.fv[c] < config.emf {
            continue;
        }
        let stiffness = face_stiffness(mesh, cell, config.emf);
        if stiffness > 0.0 {
            mesh.beta[c] = config.omg * config.rho * mesh.fv[c] / (config.delt * stiffness);
        }
    }
}

/// `Σ RD²·(A₊ + A₋)` over the movable faces of `cell`.
fn face_stiffness(mesh: &Mesh, cell: CellId, emf: f64) -> f64 {
    Axis::ALL
        .iter()
        .map(|&axis| {
            let (plus, minus) = axis.directions();
            let open: f64 = [plus, minus]
                .into_iter()
                .filter_map(|dir| mesh.face_owner(cell, dir))
                .filter(|&owner| mesh.is_interior(owner))
                .map(|owner| mesh.area(axis)[mesh.index(owner)])
                .filter(|&area| area > emf)
                .sum();
            mesh.reciprocal(axis).powi(2) * open
        })
        .sum()
}

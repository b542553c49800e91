use super::mesh::{Axis, Direction, Mesh, MeshError};
use crate::physics::coefficients::relaxation_coefficients;
use crate::physics::config::SolverConfig;
use glam::DVec3;

/// Build a box whose interior cells are fully open and whose boundary layer
/// is solid wall.
///
/// Faces between two interior cells are open; every face touching the
/// boundary layer is closed, so the box holds its liquid.
pub fn create_box_mesh(dims: [usize; 3], spacing: DVec3) -> Result<Mesh, MeshError> {
    let mut mesh = Mesh::new(dims, spacing)?;

    for cell in mesh.interior_cells() {
        let id = mesh.index(cell);
        mesh.fv[id] = 1.0;
        for axis in Axis::ALL {
            let (plus, _) = axis.directions();
            let open = mesh
                .neighbor(cell, plus)
                .is_some_and(|next| mesh.is_interior(next));
            if open {
                match axis {
                    Axis::X => mesh.ae[id] = 1.0,
                    Axis::Y => mesh.an[id] = 1.0,
                    Axis::Z => mesh.at[id] = 1.0,
                }
            }
        }
    }

    Ok(mesh)
}

/// Interpolation factor of a surface cell whose liquid rests on the cell
/// below: places zero pressure at the height `VOF·del` above the cell bottom.
pub fn interface_peta(vof: f64) -> f64 {
    (1.0 / (vof + 0.5)).min(1.0)
}

/// Fill the box with liquid at rest up to `level`, measured from the bottom of
/// the first interior layer.
///
/// Every open cell gets the liquid fraction of its layer. Partly filled cells
/// and full cells under void become surface cells interpolating against the
/// cell below them; the rest are submerged with `PETA = 1`. Pressure is
/// hydrostatic, zero at the free surface. Velocities are left untouched.
pub fn fill_liquid(mesh: &mut Mesh, level: f64, config: &SolverConfig) {
    let dz = mesh.spacing(Axis::Z);
    let weight = config.gravity().length() * config.rho;

    for cell in mesh.interior_cells() {
        let id = mesh.index(cell);
        mesh.n_vof[id] = None;
        mesh.peta[id] = 0.0;
        mesh.p[id] = 0.0;
        mesh.vof[id] = 0.0;
        if mesh.fv[id] < config.emf {
            continue;
        }
        let bottom = (cell.k - 1) as f64 * dz;
        mesh.vof[id] = ((level - bottom) / dz).clamp(0.0, 1.0);
    }

    for cell in mesh.interior_cells() {
        let id = mesh.index(cell);
        let vof = mesh.vof[id];
        if vof < config.emf {
            continue;
        }
        let void_above = mesh
            .neighbor(cell, Direction::Top)
            .filter(|&above| mesh.is_interior(above))
            .is_some_and(|above| mesh.vof[mesh.index(above)] < config.emf);

        if void_above || vof < 1.0 - config.emf {
            mesh.n_vof[id] = Some(Direction::Bottom);
            mesh.peta[id] = interface_peta(vof);
            let p_below = weight * (vof + 0.5) * dz;
            mesh.p[id] = (1.0 - mesh.peta[id]) * p_below;
        } else {
            let centre = (cell.k as f64 - 0.5) * dz;
            mesh.peta[id] = 1.0;
            mesh.p[id] = weight * (level - centre).max(0.0);
        }
    }
}

/// Box mesh, liquid layer and relaxation coefficients in one call.
pub fn create_tank(
    dims: [usize; 3],
    spacing: DVec3,
    level: f64,
    config: &SolverConfig,
) -> Result<Mesh, MeshError> {
    let mut mesh = create_box_mesh(dims, spacing)?;
    fill_liquid(&mut mesh, level, config);
    relaxation_coefficients(&mut mesh, config);
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretization::mesh::CellId;

    #[test]
    fn box_walls_are_closed() {
        let mesh = create_box_mesh([4, 4, 4], DVec3::ONE).unwrap();
        let inner = CellId::new(1, 1, 1);
        assert_eq!(mesh.face_area(inner, Direction::East), 1.0);
        assert_eq!(mesh.face_area(inner, Direction::West), 0.0);
        assert_eq!(mesh.face_area(CellId::new(2, 2, 2), Direction::Top), 0.0);
        assert_eq!(mesh.fv[mesh.index(CellId::new(0, 1, 1))], 0.0);
        assert!(mesh.check_fractions().is_ok());
    }

    #[test]
    fn peta_places_surface_at_fill_height() {
        assert_eq!(interface_peta(0.5), 1.0);
        assert_eq!(interface_peta(0.2), 1.0);
        assert!((interface_peta(1.0) - 2.0 / 3.0).abs() < 1e-15);
    }

    #[test]
    fn liquid_layer_is_hydrostatic() {
        let config = SolverConfig {
            rho: 1.0,
            gz: -10.0,
            ..Default::default()
        };
        let mut mesh = create_box_mesh([3, 3, 6], DVec3::ONE).unwrap();
        fill_liquid(&mut mesh, 2.75, &config);

        let at = |k| mesh.index(CellId::new(1, 1, k));
        assert_eq!(mesh.vof[at(1)], 1.0);
        assert_eq!(mesh.vof[at(2)], 1.0);
        assert_eq!(mesh.vof[at(3)], 0.75);
        assert_eq!(mesh.vof[at(4)], 0.0);

        assert_eq!(mesh.n_vof[at(2)], None);
        assert_eq!(mesh.n_vof[at(3)], Some(Direction::Bottom));
        assert_eq!(mesh.peta[at(1)], 1.0);

        // depth below the surface times rho·|g|
        assert!((mesh.p[at(1)] - 22.5).abs() < 1e-12);
        assert!((mesh.p[at(2)] - 12.5).abs() < 1e-12);
        assert!((mesh.p[at(3)] - 2.5).abs() < 1e-12);
        assert_eq!(mesh.p[at(4)], 0.0);
    }

    #[test]
    fn tank_has_relaxation_gain_in_the_liquid() {
        let config = SolverConfig::default();
        let mesh = create_tank([5, 5, 5], DVec3::splat(0.1), 0.2, &config).unwrap();
        let id = mesh.index(CellId::new(2, 2, 1));
        assert!(mesh.beta[id] > 0.0);
    }
}

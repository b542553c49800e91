//! Visiting order of the interior cells during a pass.
//!
//! Both passes update the mesh in place, so a cell reads the pressures and
//! face velocities already written by the cells visited before it in the same
//! sweep (Gauss-Seidel). Changing the order changes the intermediate values
//! and the number of sweeps to convergence.

use serde::{Deserialize, Serialize};

use crate::discretization::mesh::{CellId, Mesh};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepOrder {
    /// `i` outermost, `k` innermost.
    #[default]
    Lexicographic,
    /// All cells with even `i + j + k` first, then the odd ones, each color in
    /// lexicographic order. Cells of one color share no face, so a color could
    /// be processed in any order; convergence differs from `Lexicographic`.
    RedBlack,
}

/// Interior cells of `mesh` in the given order.
pub fn ordered_sweep(mesh: &Mesh, order: SweepOrder) -> impl Iterator<Item = CellId> + use<> {
    let colors: &'static [Option<usize>] = match order {
        SweepOrder::Lexicographic => &[None],
        SweepOrder::RedBlack => &[Some(0), Some(1)],
    };
    let cells = mesh.interior_cells();
    colors.iter().flat_map(move |&color| {
        cells
            .clone()
            .filter(move |cell| color.is_none_or(|c| cell.parity() == c))
    })
}

use glam::DVec3;
use nalgebra::DVector;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MeshError {
    #[error("grid needs at least 3 cells along every axis, got {0:?}")]
    TooSmall([usize; 3]),
    #[error("cell spacing must be positive and finite, got {0:?}")]
    InvalidSpacing([f64; 3]),
    #[error("{field} = {value} at cell {cell:?} is outside [0, 1]")]
    FractionOutOfRange {
        field: &'static str,
        cell: CellId,
        value: f64,
    },
}

/// Integer coordinates of a cell in the structured grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellId {
    pub i: usize,
    pub j: usize,
    pub k: usize,
}

impl CellId {
    pub const fn new(i: usize, j: usize, k: usize) -> Self {
        Self { i, j, k }
    }

    /// Red/black color of the cell, 0 or 1.
    pub fn parity(self) -> usize {
        (self.i + self.j + self.k) % 2
    }
}

impl From<(usize, usize, usize)> for CellId {
    fn from((i, j, k): (usize, usize, usize)) -> Self {
        Self::new(i, j, k)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// The (positive, negative) face directions along this axis.
    pub fn directions(self) -> (Direction, Direction) {
        match self {
            Axis::X => (Direction::East, Direction::West),
            Axis::Y => (Direction::North, Direction::South),
            Axis::Z => (Direction::Top, Direction::Bottom),
        }
    }
}

/// One of the six face neighbors of a cell.
///
/// East/North/Top point along +x/+y/+z. The face in a positive direction is
/// stored on the cell itself (`U`, `V`, `W`, `AE`, `AN`, `AT`); the face in a
/// negative direction is stored on the neighbor it leads to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    East,
    West,
    North,
    South,
    Top,
    Bottom,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::East,
        Direction::West,
        Direction::North,
        Direction::South,
        Direction::Top,
        Direction::Bottom,
    ];

    pub fn axis(self) -> Axis {
        match self {
            Direction::East | Direction::West => Axis::X,
            Direction::North | Direction::South => Axis::Y,
            Direction::Top | Direction::Bottom => Axis::Z,
        }
    }

    pub fn is_positive(self) -> bool {
        matches!(self, Direction::East | Direction::North | Direction::Top)
    }

    /// +1.0 toward the positive-axis neighbor, -1.0 otherwise.
    pub fn sign(self) -> f64 {
        if self.is_positive() { 1.0 } else { -1.0 }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::Top => Direction::Bottom,
            Direction::Bottom => Direction::Top,
        }
    }

    pub fn offset(self) -> [isize; 3] {
        match self {
            Direction::East => [1, 0, 0],
            Direction::West => [-1, 0, 0],
            Direction::North => [0, 1, 0],
            Direction::South => [0, -1, 0],
            Direction::Top => [0, 0, 1],
            Direction::Bottom => [0, 0, -1],
        }
    }
}

/// Cell-centered and face-centered fields of a uniform structured grid.
///
/// All fields are flat vectors indexed by [`Mesh::index`], with `k` varying
/// fastest. Surface orientation `n_vof` is `None` for void and fully
/// submerged cells; for a surface cell it names the face across which the
/// interpolation neighbor lies.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub dims: [usize; 3],
    /// Cell sizes (DELX, DELY, DELZ).
    pub spacing: DVec3,

    pub p: DVector<f64>,
    pub vof: DVector<f64>,
    pub fv: DVector<f64>,
    pub d: DVector<f64>,
    pub n_vof: Vec<Option<Direction>>,
    pub peta: DVector<f64>,
    pub beta: DVector<f64>,

    // Face fields, stored on the cell for its east/north/top face.
    pub u: DVector<f64>,
    pub v: DVector<f64>,
    pub w: DVector<f64>,
    pub ae: DVector<f64>,
    pub an: DVector<f64>,
    pub at: DVector<f64>,
}

impl Mesh {
    /// Allocate a grid with every field zeroed (fully blocked and empty).
    pub fn new(dims: [usize; 3], spacing: DVec3) -> Result<Self, MeshError> {
        if dims.iter().any(|&n| n < 3) {
            return Err(MeshError::TooSmall(dims));
        }
        if !spacing.is_finite() || spacing.min_element() <= 0.0 {
            return Err(MeshError::InvalidSpacing(spacing.to_array()));
        }

        let n = dims[0] * dims[1] * dims[2];
        let zeros = || DVector::zeros(n);
        Ok(Self {
            dims,
            spacing,
            p: zeros(),
            vof: zeros(),
            fv: zeros(),
            d: zeros(),
            n_vof: vec![None; n],
            peta: zeros(),
            beta: zeros(),
            u: zeros(),
            v: zeros(),
            w: zeros(),
            ae: zeros(),
            an: zeros(),
            at: zeros(),
        })
    }

    pub fn num_cells(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    #[inline]
    pub fn index(&self, cell: CellId) -> usize {
        (cell.i * self.dims[1] + cell.j) * self.dims[2] + cell.k
    }

    pub fn cell(&self, index: usize) -> CellId {
        let k = index % self.dims[2];
        let j = (index / self.dims[2]) % self.dims[1];
        let i = index / (self.dims[1] * self.dims[2]);
        CellId::new(i, j, k)
    }

    /// Neighbor across `dir`, or `None` when it would leave the grid.
    pub fn neighbor(&self, cell: CellId, dir: Direction) -> Option<CellId> {
        let [di, dj, dk] = dir.offset();
        let step = |x: usize, d: isize, max: usize| {
            x.checked_add_signed(d).filter(|&y| y < max)
        };
        Some(CellId::new(
            step(cell.i, di, self.dims[0])?,
            step(cell.j, dj, self.dims[1])?,
            step(cell.k, dk, self.dims[2])?,
        ))
    }

    /// True for cells in `[1, max-2]` along every axis.
    pub fn is_interior(&self, cell: CellId) -> bool {
        let inside = |x: usize, max: usize| x >= 1 && x + 1 < max;
        inside(cell.i, self.dims[0]) && inside(cell.j, self.dims[1]) && inside(cell.k, self.dims[2])
    }

    pub fn is_boundary(&self, cell: CellId) -> bool {
        !self.is_interior(cell)
    }

    pub fn interior_cells(&self) -> impl Iterator<Item = CellId> + Clone + use<> {
        let [ni, nj, nk] = self.dims;
        (1..ni - 1).flat_map(move |i| {
            (1..nj - 1).flat_map(move |j| (1..nk - 1).map(move |k| CellId::new(i, j, k)))
        })
    }

    pub fn spacing(&self, axis: Axis) -> f64 {
        self.spacing[axis.index()]
    }

    /// RDX, RDY or RDZ.
    pub fn reciprocal(&self, axis: Axis) -> f64 {
        1.0 / self.spacing(axis)
    }

    pub fn area(&self, axis: Axis) -> &DVector<f64> {
        match axis {
            Axis::X => &self.ae,
            Axis::Y => &self.an,
            Axis::Z => &self.at,
        }
    }

    pub fn velocity(&self, axis: Axis) -> &DVector<f64> {
        match axis {
            Axis::X => &self.u,
            Axis::Y => &self.v,
            Axis::Z => &self.w,
        }
    }

    pub fn velocity_mut(&mut self, axis: Axis) -> &mut DVector<f64> {
        match axis {
            Axis::X => &mut self.u,
            Axis::Y => &mut self.v,
            Axis::Z => &mut self.w,
        }
    }

    /// Cell whose storage slot holds the face of `cell` in direction `dir`.
    pub fn face_owner(&self, cell: CellId, dir: Direction) -> Option<CellId> {
        if dir.is_positive() {
            Some(cell)
        } else {
            self.neighbor(cell, dir)
        }
    }

    /// Open area fraction of the face of `cell` in direction `dir`.
    /// Faces on the outside of the grid are closed.
    pub fn face_area(&self, cell: CellId, dir: Direction) -> f64 {
        self.face_owner(cell, dir)
            .map_or(0.0, |owner| self.area(dir.axis())[self.index(owner)])
    }

    pub fn face_velocity(&self, cell: CellId, dir: Direction) -> f64 {
        self.face_owner(cell, dir)
            .map_or(0.0, |owner| self.velocity(dir.axis())[self.index(owner)])
    }

    /// Area-weighted net outflow through the six faces of `cell`:
    /// `RDX(AE·U − AE₋·U₋) + RDY(AN·V − AN₋·V₋) + RDZ(AT·W − AT₋·W₋)`.
    /// Dividing by `FV` gives the divergence residual.
    pub fn flux_balance(&self, cell: CellId) -> f64 {
        Axis::ALL
            .iter()
            .map(|&axis| {
                let (plus, minus) = axis.directions();
                let flux = |dir| self.face_area(cell, dir) * self.face_velocity(cell, dir);
                self.reciprocal(axis) * (flux(plus) - flux(minus))
            })
            .sum()
    }

    /// Face velocities stored on `cell` as a vector (U, V, W).
    pub fn velocity_at(&self, cell: CellId) -> DVec3 {
        let id = self.index(cell);
        DVec3::new(self.u[id], self.v[id], self.w[id])
    }

    /// Check that every fractional field lies in `[0, 1]`.
    pub fn check_fractions(&self) -> Result<(), MeshError> {
        let fields: [(&'static str, &DVector<f64>); 6] = [
            ("FV", &self.fv),
            ("VOF", &self.vof),
            ("AE", &self.ae),
            ("AN", &self.an),
            ("AT", &self.at),
            ("PETA", &self.peta),
        ];
        for (field, values) in fields {
            if let Some((index, &value)) = values
                .iter()
                .enumerate()
                .find(|(_, x)| !(0.0..=1.0).contains(*x))
            {
                return Err(MeshError::FractionOutOfRange {
                    field,
                    cell: self.cell(index),
                    value,
                });
            }
        }
        Ok(())
    }
}

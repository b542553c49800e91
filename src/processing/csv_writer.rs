use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use nalgebra::DVector;

use crate::discretization::mesh::{Axis, CellId, Mesh};
use crate::numerics::pressure::SweepReport;

/// Write equally long columns under a header line.
pub fn write_columns<P: AsRef<Path>>(path: P, headers: &[&str], columns: &[Vec<f64>]) -> io::Result<()> {
    if headers.len() != columns.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} headers for {} columns", headers.len(), columns.len()),
        ));
    }
    let n_rows = columns.first().map_or(0, Vec::len);
    if let Some(bad) = columns.iter().position(|col| col.len() != n_rows) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("column '{}' has {} rows, expected {}", headers[bad], columns[bad].len(), n_rows),
        ));
    }

    let mut file = BufWriter::new(File::create(path)?);
    writeln!(file, "{}", headers.join(","))?;
    for row in 0..n_rows {
        let line: Vec<String> = columns.iter().map(|col| format!("{:.15e}", col[row])).collect();
        writeln!(file, "{}", line.join(","))?;
    }
    file.flush()
}

/// One row per sweep: iteration, cell counts, largest divergence and
/// correction, and whether the sweep left unconverged cells.
pub fn write_sweep_history<P: AsRef<Path>>(path: P, reports: &[SweepReport]) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(
        file,
        "iter,surface_cells,interior_cells,unconverged_cells,surface_clamps,max_divergence,max_correction,p_flag"
    )?;
    for r in reports {
        writeln!(
            file,
            "{},{},{},{},{},{:.15e},{:.15e},{}",
            r.iter,
            r.surface_cells,
            r.interior_cells,
            r.unconverged_cells,
            r.surface_clamps,
            r.max_divergence,
            r.max_correction,
            u8::from(r.unconverged)
        )?;
    }
    file.flush()
}

/// Cell-centre fields along the grid line through `start` parallel to
/// `axis`, boundary layer included.
pub fn write_profile<P: AsRef<Path>>(path: P, mesh: &Mesh, start: CellId, axis: Axis) -> io::Result<()> {
    let n = mesh.dims[axis.index()];
    let del = mesh.spacing(axis);
    let cells: Vec<CellId> = (0..n)
        .map(|s| match axis {
            Axis::X => CellId::new(s, start.j, start.k),
            Axis::Y => CellId::new(start.i, s, start.k),
            Axis::Z => CellId::new(start.i, start.j, s),
        })
        .collect();
    let field = |values: &DVector<f64>| -> Vec<f64> {
        cells.iter().map(|&c| values[mesh.index(c)]).collect()
    };

    let position: Vec<f64> = (0..n).map(|s| (s as f64 - 0.5) * del).collect();
    write_columns(
        path,
        &["position", "p", "vof", "d", "peta"],
        &[position, field(&mesh.p), field(&mesh.vof), field(&mesh.d), field(&mesh.peta)],
    )
}

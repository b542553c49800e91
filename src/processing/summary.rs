use crate::discretization::mesh::Mesh;
use crate::numerics::diagnostics::RecordingSink;
use crate::numerics::pressure::SweepReport;
use crate::numerics::stability::GuardReport;
use crate::physics::config::SolverConfig;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Aggregate of the guard and relaxation passes run over one timestep.
#[derive(Clone, Debug, Default)]
pub struct SweepSummary {
    // Mesh info
    pub dims: [usize; 3],
    pub spacing: [f64; 3],
    pub fluid_cells: usize,
    pub surface_cells: usize,

    // Constants
    pub omg: f64,
    pub epsi: f64,
    pub delt: f64,

    // Guard
    pub guard_runs: usize,
    pub guard_clamps: usize,
    pub worst_guard_ratio: f64,

    // Relaxation
    pub sweeps: usize,
    pub last_iter: Option<u32>,
    pub initial_max_divergence: Option<f64>,
    pub final_max_divergence: Option<f64>,
    pub surface_clamps: usize,
    pub converged: bool,

    // Diagnostics
    pub trouble_records: usize,
}

impl SweepSummary {
    pub fn from_problem(mesh: &Mesh, config: &SolverConfig) -> Self {
        let fluid: Vec<usize> = mesh
            .interior_cells()
            .map(|cell| mesh.index(cell))
            .filter(|&c| mesh.fv[c] >= config.emf && mesh.vof[c] >= config.emf)
            .collect();
        let surface_cells = fluid.iter().filter(|&&c| mesh.n_vof[c].is_some()).count();

        Self {
            dims: mesh.dims,
            spacing: mesh.spacing.to_array(),
            fluid_cells: fluid.len(),
            surface_cells,
            omg: config.omg,
            epsi: config.epsi,
            delt: config.delt,
            ..Default::default()
        }
    }

    pub fn add_guard(&mut self, report: &GuardReport) {
        self.guard_runs += 1;
        self.guard_clamps += report.clamps;
        self.worst_guard_ratio = self.worst_guard_ratio.max(report.worst_ratio);
    }

    pub fn add_sweep(&mut self, report: &SweepReport) {
        self.sweeps += 1;
        self.last_iter = Some(report.iter);
        self.initial_max_divergence.get_or_insert(report.max_divergence);
        self.final_max_divergence = Some(report.max_divergence);
        self.surface_clamps += report.surface_clamps;
        self.converged = !report.unconverged;
    }

    pub fn add_diagnostics(&mut self, sink: &RecordingSink) {
        self.trouble_records += sink.trouble.len();
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = File::create(path)?;

        writeln!(file, "{}", "=".repeat(60))?;
        writeln!(file, "FREE-SURFACE PRESSURE SOLVE SUMMARY")?;
        writeln!(file, "{}", "=".repeat(60))?;
        writeln!(file)?;

        writeln!(file, "MESH STATISTICS")?;
        writeln!(file, "{}", "-".repeat(60))?;
        writeln!(
            file,
            "Grid:                {} x {} x {}",
            self.dims[0], self.dims[1], self.dims[2]
        )?;
        writeln!(
            file,
            "Spacing:             {:.6e}, {:.6e}, {:.6e}",
            self.spacing[0], self.spacing[1], self.spacing[2]
        )?;
        writeln!(file, "Fluid cells:         {}", self.fluid_cells)?;
        writeln!(file, "Surface cells:       {}", self.surface_cells)?;
        writeln!(file)?;

        writeln!(file, "RELAXATION CONSTANTS")?;
        writeln!(file, "{}", "-".repeat(60))?;
        writeln!(file, "Over-relaxation:     {:.4}", self.omg)?;
        writeln!(file, "Tolerance (epsi):    {:.6e}", self.epsi)?;
        writeln!(file, "Timestep:            {:.6e}", self.delt)?;
        writeln!(file)?;

        if self.guard_runs > 0 {
            writeln!(file, "STABILITY GUARD")?;
            writeln!(file, "{}", "-".repeat(60))?;
            writeln!(file, "Runs:                {}", self.guard_runs)?;
            writeln!(file, "Clamped pairs:       {}", self.guard_clamps)?;
            writeln!(file, "Worst dv/limit:      {:.4}", self.worst_guard_ratio)?;
            writeln!(file)?;
        }

        if self.sweeps > 0 {
            writeln!(file, "RELAXATION SWEEPS")?;
            writeln!(file, "{}", "-".repeat(60))?;
            writeln!(file, "Sweeps:              {}", self.sweeps)?;
            if let Some(iter) = self.last_iter {
                writeln!(file, "Last iteration:      {}", iter)?;
            }
            if let (Some(first), Some(last)) = (self.initial_max_divergence, self.final_max_divergence) {
                writeln!(file, "Max |D| first:       {:.6e}", first)?;
                writeln!(file, "Max |D| last:        {:.6e}", last)?;
            }
            writeln!(file, "Surface clamps:      {}", self.surface_clamps)?;
            writeln!(file, "Converged:           {}", self.converged)?;
            writeln!(file, "Trouble reports:     {}", self.trouble_records)?;
            writeln!(file)?;
        }

        writeln!(file, "{}", "=".repeat(60))?;

        Ok(())
    }

    pub fn print_to_console(&self) {
        println!("\n{}", "=".repeat(60));
        println!("PRESSURE SOLVE SUMMARY");
        println!("{}", "=".repeat(60));
        println!(
            "Mesh:          {} fluid cells, {} at the surface",
            self.fluid_cells, self.surface_cells
        );
        println!(
            "Guard:         {} clamps in {} runs",
            self.guard_clamps, self.guard_runs
        );
        if let (Some(first), Some(last)) = (self.initial_max_divergence, self.final_max_divergence) {
            println!("Max |D|:       {:.3e} -> {:.3e}", first, last);
        }
        println!(
            "Sweeps:        {} ({})",
            self.sweeps,
            if self.converged { "converged" } else { "not converged" }
        );
        println!("{}\n", "=".repeat(60));
    }
}

use serde::{Deserialize, Serialize};

/// Range of outer iterations `first..=last` during which the interior
/// pressure correction is divided by `omg + omg_offset`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DampingWindow {
    pub first: u32,
    pub last: u32,
    pub omg_offset: f64,
}

impl DampingWindow {
    pub fn contains(&self, iter: u32) -> bool {
        (self.first..=self.last).contains(&iter)
    }
}

/// Iteration-dependent under/over-relaxation of the interior correction.
///
/// The default schedule under-relaxes iterations 51–74 (divide by
/// `omg − 0.1`) and over-relaxes iterations 101–124 (divide by `omg + 0.1`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelaxationSchedule {
    pub windows: Vec<DampingWindow>,
}

impl Default for RelaxationSchedule {
    fn default() -> Self {
        Self {
            windows: vec![
                DampingWindow {
                    first: 51,
                    last: 74,
                    omg_offset: -0.1,
                },
                DampingWindow {
                    first: 101,
                    last: 124,
                    omg_offset: 0.1,
                },
            ],
        }
    }
}

impl RelaxationSchedule {
    /// No damping at any iteration.
    pub fn none() -> Self {
        Self {
            windows: Vec::new(),
        }
    }

    /// Divisor applied to the interior correction at iteration `iter`;
    /// 1.0 outside every window.
    pub fn omg_adjustment(&self, iter: u32, omg: f64) -> f64 {
        self.windows
            .iter()
            .filter(|w| w.contains(iter))
            .map(|w| omg + w.omg_offset)
            .product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_windows_match_fixed_iteration_ranges() {
        let schedule = RelaxationSchedule::default();
        let omg = 1.7;
        for iter in [0, 50, 75, 100, 125, 500] {
            assert_eq!(schedule.omg_adjustment(iter, omg), 1.0, "iter {iter}");
        }
        for iter in [51, 60, 74] {
            assert_eq!(schedule.omg_adjustment(iter, omg), omg - 0.1, "iter {iter}");
        }
        for iter in [101, 124] {
            assert_eq!(schedule.omg_adjustment(iter, omg), omg + 0.1, "iter {iter}");
        }
    }

    #[test]
    fn empty_schedule_never_damps() {
        let schedule = RelaxationSchedule::none();
        assert_eq!(schedule.omg_adjustment(60, 1.7), 1.0);
    }
}

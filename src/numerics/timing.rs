#![allow(unused)]
use std::cell::RefCell;
use std::time::Duration;

#[derive(Default, Clone)]
pub struct TimingStats {
    pub sweep_times: Vec<Duration>,
    pub guard_times: Vec<Duration>,
    pub total_time: Duration,
}

impl TimingStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(feature = "timing")]
    pub fn print_summary(&self) {
        if self.sweep_times.is_empty() && self.guard_times.is_empty() {
            return;
        }

        let total_sweep: Duration = self.sweep_times.iter().sum();
        let total_guard: Duration = self.guard_times.iter().sum();
        let overhead = self.total_time.saturating_sub(total_sweep + total_guard);
        let avg_ms = |total: Duration, n: usize| {
            if n == 0 {
                0.0
            } else {
                total.as_secs_f64() * 1000.0 / n as f64
            }
        };

        println!("\n{}", "=".repeat(60));
        println!("{:^60}", "PRESSURE SOLVER TIMING SUMMARY");
        println!("{}", "=".repeat(60));
        println!(
            "Total time:                    {:.3}s",
            self.total_time.as_secs_f64()
        );
        println!("{}", "-".repeat(60));
        println!("Component breakdown:");
        println!(
            "  Relaxation sweeps:         {:>9.3}ms  (avg: {:>9.3}ms)",
            total_sweep.as_secs_f64() * 1000.0,
            avg_ms(total_sweep, self.sweep_times.len())
        );
        println!(
            "  Stability guard:           {:>9.3}ms  (avg: {:>9.3}ms)",
            total_guard.as_secs_f64() * 1000.0,
            avg_ms(total_guard, self.guard_times.len())
        );
        println!("{}", "=".repeat(60));
        println!(
            "Overhead/Other:                {:>9.3}ms",
            overhead.as_secs_f64() * 1000.0
        );
        println!(
            "Passes:                        {} sweeps, {} guards\n",
            self.sweep_times.len(),
            self.guard_times.len()
        );
    }

    #[cfg(not(feature = "timing"))]
    pub fn print_summary(&self) {}
}

#[cfg(feature = "timing")]
thread_local! {
    static TIMING_STATS: RefCell<TimingStats> = RefCell::new(TimingStats::new());
}

#[cfg(feature = "timing")]
pub fn reset_timing() {
    TIMING_STATS.with(|stats| {
        *stats.borrow_mut() = TimingStats::new();
    });
}

#[cfg(not(feature = "timing"))]
pub fn reset_timing() {}

#[cfg(feature = "timing")]
fn record<F, R>(f: F, push: fn(&mut TimingStats, Duration)) -> R
where
    F: FnOnce() -> R,
{
    let start = std::time::Instant::now();
    let result = f();
    let elapsed = start.elapsed();
    TIMING_STATS.with(|stats| push(&mut stats.borrow_mut(), elapsed));
    result
}

#[cfg(feature = "timing")]
pub fn record_sweep<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    record(f, |s, d| s.sweep_times.push(d))
}

#[cfg(not(feature = "timing"))]
pub fn record_sweep<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    f()
}

#[cfg(feature = "timing")]
pub fn record_guard<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    record(f, |s, d| s.guard_times.push(d))
}

#[cfg(not(feature = "timing"))]
pub fn record_guard<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    f()
}

#[cfg(feature = "timing")]
pub fn finalize_timing(total_time: Duration) -> TimingStats {
    TIMING_STATS.with(|stats| {
        let mut s = stats.borrow_mut();
        s.total_time = total_time;
        s.clone()
    })
}

#[cfg(not(feature = "timing"))]
pub fn finalize_timing(_total_time: Duration) -> TimingStats {
    TimingStats::new()
}

pub fn finalize_and_print(total_time: Duration) {
    finalize_timing(total_time).print_summary();
}

// Per-Slot Metric Trackers: Backlog Stability, Approximation Gap
// Stability is judged on the backlog trend, not on a single end-of-run value

use crossbar_engine::*;

use crate::report::ComparisonResult;
use crate::scenarios::Overrides;

// ─── Backlog Stability Tracker ──────────────────────────────────────────────

/// Records total backlog per slot and estimates its growth rate.
/// A stable switch settles to a flat backlog; an overloaded one grows linearly.
pub struct BacklogTracker {
    pub samples: Vec<u64>,
    pub peak: u64,
}

impl BacklogTracker {
    pub fn new() -> Self {
        Self { samples: Vec::new(), peak: 0 }
    }

    pub fn record_slot(&mut self, result: &SlotResult) {
        self.samples.push(result.total_backlog);
        self.peak = self.peak.max(result.total_backlog);
    }

    /// Least-squares slope over the second half of the run (units per slot).
    /// The first half is treated as warm-up.
    pub fn growth_rate(&self) -> f64 {
        let tail = &self.samples[self.samples.len() / 2..];
        let n = tail.len() as f64;
        if tail.len() < 2 {
            return 0.0;
        }
        let mean_x = (n - 1.0) / 2.0;
        let mean_y = tail.iter().map(|&y| y as f64).sum::<f64>() / n;
        let mut cov = 0.0;
        let mut var = 0.0;
        for (x, &y) in tail.iter().enumerate() {
            let dx = x as f64 - mean_x;
            cov += dx * (y as f64 - mean_y);
            var += dx * dx;
        }
        cov / var
    }
}

// ─── Paired Comparison: approximate vs exact ────────────────────────────────

/// Run `kind` and the exact merge on identical traffic and compare delays.
/// The approximate side takes the same table, bound and frequency overrides
/// as the Monte Carlo scenarios.
pub fn run_paired_comparison(
    kind: SchedulerKind,
    ports: usize,
    slots: u64,
    load: f64,
    seed: u64,
    overrides: &Overrides,
) -> Result<ComparisonResult, ConfigError> {
    let base = SimConfig { ports, load, seed, ..Default::default() };
    let mut exact = SwitchSimulation::from_config(base.clone())?;
    let mut approx = SwitchSimulation::from_config(SimConfig {
        scheduler: overrides.scheduler(kind, seed, None, None),
        ..base
    })?;

    let mut identical = true;
    for _ in 0..slots {
        let a = exact.tick_core();
        let b = approx.tick_core();
        if a.schedule != b.schedule {
            identical = false;
        }
    }

    let exact_delay = exact.stats().mean_delay;
    let approx_delay = approx.stats().mean_delay;
    Ok(ComparisonResult {
        scheduler: approx.scheduler_name().to_string(),
        load,
        exact_mean_delay: exact_delay,
        approx_mean_delay: approx_delay,
        delay_ratio: if exact_delay > 0.0 { approx_delay / exact_delay } else { 1.0 },
        identical_schedules: identical,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(total_backlog: u64) -> SlotResult {
        SlotResult {
            slot: 0, arrivals: 0, departures: 0, schedule_weight: 0,
            effective_size: 0, total_backlog, cycles: 0, schedule: Vec::new(),
        }
    }

    #[test]
    fn flat_backlog_has_no_growth() {
        let mut t = BacklogTracker::new();
        for _ in 0..100 {
            t.record_slot(&slot(7));
        }
        assert!(t.growth_rate().abs() < 1e-12);
    }

    #[test]
    fn linear_backlog_growth() {
        let mut t = BacklogTracker::new();
        for s in 0..100 {
            t.record_slot(&slot(3 * s));
        }
        assert!((t.growth_rate() - 3.0).abs() < 1e-9);
        assert_eq!(t.peak, 297);
    }

    #[test]
    fn knowledge_protocol_matches_exact_schedules() {
        let r = run_paired_comparison(SchedulerKind::Knowledge, 8, 300, 0.8, 1, &Overrides::default()).unwrap();
        assert!(r.identical_schedules);
        assert!((r.delay_ratio - 1.0).abs() < 1e-12);
    }

    #[test]
    fn comparison_uses_the_ouroboros_table_override() {
        let defaults = run_paired_comparison(SchedulerKind::Ouroboros, 8, 1000, 0.9, 2, &Overrides::default()).unwrap();
        assert!(!defaults.identical_schedules, "power-of-two table should misjudge some cycle");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ouroboros_8.txt");
        std::fs::write(&path, "0 0 0 0 0 0 0 0\n").unwrap();
        let overrides = Overrides { ouroboros_table: Some(path), ..Default::default() };
        let flagless = run_paired_comparison(SchedulerKind::Ouroboros, 8, 1000, 0.9, 2, &overrides).unwrap();
        assert!(flagless.identical_schedules);
    }

    #[test]
    fn comparison_uses_the_frequency_override() {
        let overrides = Overrides { frequency: Some(1), ..Default::default() };
        let r = run_paired_comparison(SchedulerKind::Ouroboros, 8, 500, 0.9, 4, &overrides).unwrap();
        assert!(r.identical_schedules);
    }

    #[test]
    fn comparison_rejects_a_missing_table() {
        let overrides = Overrides { broadcast_table: Some("/nonexistent/bsit.txt".into()), ..Default::default() };
        assert!(run_paired_comparison(SchedulerKind::Broadcast, 8, 10, 0.5, 0, &overrides).is_err());
    }
}

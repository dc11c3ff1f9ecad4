// Benchmark Report Types
// Structured JSON output: one record per run, aggregated per scenario

use serde::Serialize;

// ─── Per-Run Summary Statistics ─────────────────────────────────────────────

/// Mean of one metric over the runs of a scenario or sweep point, with a 95%
/// confidence half-width. The half-width uses Student's t up to 30 degrees of
/// freedom and 1.96 beyond.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub ci95: f64,
    pub min: f64,
    pub max: f64,
    pub runs: usize,
}

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self { mean: 0.0, std_dev: 0.0, ci95: 0.0, min: 0.0, max: 0.0, runs: 0 };
        }
        // Welford running mean and M2.
        let mut mean = 0.0;
        let mut m2 = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for (k, &x) in samples.iter().enumerate() {
            let delta = x - mean;
            mean += delta / (k + 1) as f64;
            m2 += delta * (x - mean);
            min = min.min(x);
            max = max.max(x);
        }
        let runs = samples.len();
        let std_dev = if runs > 1 { (m2 / (runs - 1) as f64).sqrt() } else { 0.0 };
        let ci95 = student_t_975(runs - 1) * std_dev / (runs as f64).sqrt();
        Self { mean, std_dev, ci95, min, max, runs }
    }
}

/// Two-sided 95% quantile of Student's t with `dof` degrees of freedom.
fn student_t_975(dof: usize) -> f64 {
    const T: [f64; 30] = [
        12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228,
        2.201, 2.179, 2.160, 2.145, 2.131, 2.120, 2.110, 2.101, 2.093, 2.086,
        2.080, 2.074, 2.069, 2.064, 2.060, 2.056, 2.052, 2.048, 2.045, 2.042,
    ];
    match dof {
        0 => 0.0,
        d if d <= T.len() => T[d - 1],
        _ => 1.960,
    }
}

// ─── Single-Run Result ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct BenchResult {
    pub scenario: String,
    pub name: String,
    pub category: String,
    pub scheduler: String,
    pub seed: u64,
    pub pass: bool,
    pub ports: usize,
    pub slots: u64,
    pub load: f64,
    pub arrivals: u64,
    pub departures: u64,
    pub throughput: f64,
    pub mean_delay: f64,
    pub p90_delay: u64,
    pub p99_delay: u64,
    pub max_delay: u64,
    pub final_backlog: u64,
    /// Least-squares backlog slope over the second half of the run, units/slot.
    pub backlog_growth: f64,
    pub mean_schedule_weight: f64,
    pub mean_effective_size: f64,
    pub computed_fraction: f64,
    pub wrong_rate: f64,
    pub bound_fallbacks: u64,
    pub exact_slots: u64,
    pub broadcast_rounds_per_slot: f64,
    pub reconstruction_hops: u64,
    pub elapsed_ms: u128,
    pub slots_per_sec: f64,
}

// ─── Monte Carlo Report (per-scenario aggregation) ──────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloReport {
    pub scenario_name: String,
    pub label: String,
    pub category: String,
    pub n_runs: usize,
    pub pass_rate: f64,
    pub throughput: Stats,
    pub mean_delay: Stats,
    pub p99_delay: Stats,
    pub backlog_growth: Stats,
    pub computed_fraction: Stats,
    pub wrong_rate: Stats,
    pub elapsed_ms: Stats,
    pub slots_per_sec: Stats,
    pub individual_runs: Vec<BenchResult>,
}

// ─── Approximation Gap Summary ──────────────────────────────────────────────

/// Same traffic and seed, approximate scheduler against the exact merge.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    pub scheduler: String,
    pub load: f64,
    pub exact_mean_delay: f64,
    pub approx_mean_delay: f64,
    pub delay_ratio: f64,
    pub identical_schedules: bool,
}

// ─── Top-Level Report ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BenchReport {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub n_runs_per_scenario: usize,
    pub summary: Summary,
    pub comparisons: Vec<ComparisonResult>,
    pub scenarios: Vec<MonteCarloReport>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
}

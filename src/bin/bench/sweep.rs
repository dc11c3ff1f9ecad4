// Delay Sweeps: one delay curve per scheduler across loads or burst sizes
// Every point is a Monte Carlo mean over consecutive seeds

use crossbar_engine::*;
use serde::Serialize;

use crate::report::Stats;
use crate::scenarios::Overrides;

/// Loads stepped through by a load sweep when none are given.
pub const DEFAULT_LOADS: [f64; 11] = [0.99, 0.95, 0.9, 0.8, 0.7, 0.6, 0.5, 0.4, 0.3, 0.2, 0.1];

/// Mean burst lengths stepped through by a burst sweep when none are given.
pub const DEFAULT_BURSTS: [f64; 5] = [1.0, 4.0, 16.0, 64.0, 256.0];

/// Load a burst sweep runs at when no loads are given.
pub const DEFAULT_BURST_LOAD: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SweepKind {
    /// Bernoulli arrivals, one point per load.
    Load,
    /// On/off bursts, one point per (burst length, load).
    Burst,
}

// ─── Plan ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SweepPlan {
    pub kind: SweepKind,
    pub loads: Vec<f64>,
    pub bursts: Vec<f64>,
    pub traffic: Vec<TrafficModel>,
    pub schedulers: Vec<SchedulerKind>,
    pub ports: usize,
    pub slots: u64,
    pub runs: usize,
    pub seed: u64,
}

impl SweepPlan {
    /// `(load, injection)` for every operating point, in run order.
    pub fn operating_points(&self) -> Vec<(f64, Injection)> {
        match self.kind {
            SweepKind::Load => self.loads.iter().map(|&load| (load, Injection::Bernoulli)).collect(),
            SweepKind::Burst => self
                .bursts
                .iter()
                .flat_map(|&mean_burst| {
                    self.loads.iter().map(move |&load| (load, Injection::Burst { mean_burst }))
                })
                .collect(),
        }
    }

    /// Rows the sweep reports: one per traffic model, scheduler and point.
    pub fn row_count(&self) -> usize {
        self.traffic.len() * self.schedulers.len() * self.operating_points().len()
    }
}

// ─── Results ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SweepRow {
    pub traffic: &'static str,
    pub scheduler: &'static str,
    pub load: f64,
    pub mean_burst: Option<f64>,
    pub throughput: Stats,
    pub mean_delay: Stats,
    pub p99_delay: Stats,
    pub wrong_rate: Stats,
    pub messages_per_slot: Stats,
}

#[derive(Debug, Serialize)]
pub struct SweepReport {
    pub timestamp: String,
    pub kind: SweepKind,
    pub ports: usize,
    pub slots: u64,
    pub runs: usize,
    pub rows: Vec<SweepRow>,
}

/// Run every point of `plan`. Run `r` of each point uses seed `plan.seed + r`,
/// so all schedulers see the same traffic at a given point.
pub fn run_sweep(plan: &SweepPlan, overrides: &Overrides) -> Result<Vec<SweepRow>, ConfigError> {
    let mut rows = Vec::with_capacity(plan.row_count());
    for &traffic in &plan.traffic {
        for &kind in &plan.schedulers {
            for (load, injection) in plan.operating_points() {
                rows.push(run_point(plan, overrides, traffic, kind, load, injection)?);
            }
        }
    }
    Ok(rows)
}

fn run_point(
    plan: &SweepPlan,
    overrides: &Overrides,
    traffic: TrafficModel,
    kind: SchedulerKind,
    load: f64,
    injection: Injection,
) -> Result<SweepRow, ConfigError> {
    let mut throughput = Vec::with_capacity(plan.runs);
    let mut mean_delay = Vec::with_capacity(plan.runs);
    let mut p99_delay = Vec::with_capacity(plan.runs);
    let mut wrong_rate = Vec::with_capacity(plan.runs);
    let mut messages = Vec::with_capacity(plan.runs);

    for run in 0..plan.runs {
        let seed = plan.seed + run as u64;
        let mut sim = SwitchSimulation::from_config(SimConfig {
            ports: plan.ports,
            load,
            traffic,
            injection,
            seed,
            scheduler: overrides.scheduler(kind, seed, None, None),
            track_delays: true,
        })?;
        let stats = sim.run(plan.slots);
        let sched = sim.scheduler_metrics();
        throughput.push(stats.throughput);
        mean_delay.push(stats.mean_delay);
        p99_delay.push(stats.p99_delay as f64);
        wrong_rate.push(sched.cycles.wrong_rate());
        messages.push(sched.knowledge.messages as f64 / plan.slots.max(1) as f64);
    }

    let row = SweepRow {
        traffic: traffic.name(),
        scheduler: kind.name(),
        load,
        mean_burst: match injection {
            Injection::Burst { mean_burst } => Some(mean_burst),
            Injection::Bernoulli => None,
        },
        throughput: Stats::from_samples(&throughput),
        mean_delay: Stats::from_samples(&mean_delay),
        p99_delay: Stats::from_samples(&p99_delay),
        wrong_rate: Stats::from_samples(&wrong_rate),
        messages_per_slot: Stats::from_samples(&messages),
    };
    log::debug!(
        "{} {} load {:.2} burst {:?}: mean delay {:.2}",
        row.traffic, row.scheduler, row.load, row.mean_burst, row.mean_delay.mean
    );
    Ok(row)
}

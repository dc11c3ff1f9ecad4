// Scenario Definitions: scheduler variant × traffic matrix × load
// Zero engine changes: every scenario is a SimConfig plus pass criteria

use crossbar_engine::{Injection, SchedulerConfig, SchedulerKind, SimConfig, TrafficModel};

// ─── Scenario Configuration ─────────────────────────────────────────────────

pub struct Scenario {
    pub name: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub ports: usize,
    pub slots: u64,
    pub load: f64,
    pub traffic: TrafficModel,
    pub injection: Injection,
    pub scheduler: SchedulerKind,
    /// Ouroboros backlog bound.
    pub bound: Option<u64>,
    /// Ouroboros exact-merge frequency.
    pub frequency: Option<u32>,
    pub criteria: PassCriteria,
}

pub struct PassCriteria {
    pub min_throughput: f64,
    pub max_mean_delay: Option<f64>,
    /// Backlog slope (units/slot) above which the run counts as unstable.
    pub max_backlog_growth: Option<f64>,
}

impl Default for PassCriteria {
    fn default() -> Self {
        Self {
            min_throughput: 0.95,
            max_mean_delay: None,
            max_backlog_growth: Some(0.05),
        }
    }
}

/// CLI overrides applied on top of a scenario.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub ports: Option<usize>,
    pub slots: Option<u64>,
    pub ouroboros_table: Option<std::path::PathBuf>,
    pub broadcast_table: Option<std::path::PathBuf>,
    pub bound: Option<u64>,
    pub frequency: Option<u32>,
}

impl Overrides {
    /// Scheduler configuration for `kind`. Table, bound and frequency
    /// overrides only reach the kinds that accept them; `bound` and
    /// `frequency` are the fallbacks when the CLI leaves them unset.
    pub fn scheduler(
        &self,
        kind: SchedulerKind,
        seed: u64,
        bound: Option<u64>,
        frequency: Option<u32>,
    ) -> SchedulerConfig {
        let mut scheduler = SchedulerConfig::new(kind);
        scheduler.seed = seed;
        match kind {
            SchedulerKind::Ouroboros => {
                scheduler.ouroboros_table = self.ouroboros_table.clone();
                scheduler.bound = self.bound.or(bound);
                scheduler.exact_frequency = self.frequency.or(frequency);
            }
            SchedulerKind::Broadcast => {
                scheduler.broadcast_table = self.broadcast_table.clone();
            }
            SchedulerKind::Exact | SchedulerKind::Knowledge => {}
        }
        scheduler
    }
}

impl Scenario {
    pub fn slots(&self, overrides: &Overrides) -> u64 {
        overrides.slots.unwrap_or(self.slots)
    }

    /// Build the run configuration for one seed.
    pub fn config(&self, seed: u64, overrides: &Overrides) -> SimConfig {
        let scheduler = overrides.scheduler(self.scheduler, seed, self.bound, self.frequency);
        SimConfig {
            ports: overrides.ports.unwrap_or(self.ports),
            load: self.load,
            traffic: self.traffic,
            injection: self.injection,
            seed,
            scheduler,
            track_delays: true,
        }
    }
}

// ─── Scenario Definitions ───────────────────────────────────────────────────

fn scenario(
    name: &'static str,
    label: &'static str,
    category: &'static str,
    scheduler: SchedulerKind,
    traffic: TrafficModel,
    load: f64,
) -> Scenario {
    Scenario {
        name, label, category,
        ports: 32, slots: 20_000, load, traffic,
        injection: Injection::Bernoulli,
        scheduler, bound: None, frequency: None,
        criteria: PassCriteria::default(),
    }
}

pub fn scenarios() -> Vec<Scenario> {
    use SchedulerKind::*;
    use TrafficModel::*;

    let mut all = vec![
        // ─── Exact merge baseline (4) ───────────────────────────────────
        scenario("EXACT_UNIFORM_60", "Exact: Uniform 0.6", "exact", Exact, Uniform, 0.6),
        scenario("EXACT_UNIFORM_90", "Exact: Uniform 0.9", "exact", Exact, Uniform, 0.9),
        scenario("EXACT_DIAGONAL_90", "Exact: Diagonal 0.9", "exact", Exact, Diagonal, 0.9),
        scenario("EXACT_LOGDIAG_90", "Exact: Log-Diagonal 0.9", "exact", Exact, LogDiagonal, 0.9),

        // ─── Ouroboros table (4) ────────────────────────────────────────
        scenario("OURO_UNIFORM_60", "Ouroboros: Uniform 0.6", "ouroboros", Ouroboros, Uniform, 0.6),
        scenario("OURO_UNIFORM_90", "Ouroboros: Uniform 0.9", "ouroboros", Ouroboros, Uniform, 0.9),
        scenario("OURO_QUASI_90", "Ouroboros: Quasi-Diagonal 0.9", "ouroboros", Ouroboros, QuasiDiagonal, 0.9),
        Scenario {
            frequency: Some(8),
            ..scenario("OURO_MIXED_90", "Ouroboros 1/8 exact: Uniform 0.9", "ouroboros", Ouroboros, Uniform, 0.9)
        },

        // ─── Bounded companion (2) ──────────────────────────────────────
        Scenario {
            bound: Some(16),
            ..scenario("BOUNDED_UNIFORM_90", "Bounded(16): Uniform 0.9", "bounded", Ouroboros, Uniform, 0.9)
        },
        Scenario {
            bound: Some(16),
            ..scenario("BOUNDED_DIAGONAL_90", "Bounded(16): Diagonal 0.9", "bounded", Ouroboros, Diagonal, 0.9)
        },

        // ─── Broadcast accounting & distributed protocol (3) ────────────
        scenario("BCAST_UNIFORM_90", "Broadcast: Uniform 0.9", "broadcast", Broadcast, Uniform, 0.9),
        scenario("KNOW_UNIFORM_90", "Knowledge: Uniform 0.9", "knowledge", Knowledge, Uniform, 0.9),
        scenario("KNOW_LOGDIAG_90", "Knowledge: Log-Diagonal 0.9", "knowledge", Knowledge, LogDiagonal, 0.9),
    ];

    // ─── Bursty traffic (2) ─────────────────────────────────────────────
    all.push(Scenario {
        injection: Injection::Burst { mean_burst: 16.0 },
        criteria: PassCriteria { max_backlog_growth: Some(0.2), ..Default::default() },
        ..scenario("EXACT_BURST_80", "Exact: Bursty(16) 0.8", "burst", Exact, Uniform, 0.8)
    });
    all.push(Scenario {
        injection: Injection::Burst { mean_burst: 16.0 },
        criteria: PassCriteria { max_backlog_growth: Some(0.2), ..Default::default() },
        ..scenario("OURO_BURST_80", "Ouroboros: Bursty(16) 0.8", "burst", Ouroboros, Uniform, 0.8)
    });

    // ─── Overload sanity (1) ────────────────────────────────────────────
    // Arrivals at every input every slot: throughput must stay high even
    // though the backlog never settles.
    all.push(Scenario {
        criteria: PassCriteria { min_throughput: 0.9, max_mean_delay: None, max_backlog_growth: None },
        ..scenario("EXACT_UNIFORM_100", "Exact: Uniform 1.0", "stress", Exact, Uniform, 1.0)
    });

    all
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_names_are_unique() {
        let all = scenarios();
        let mut names: Vec<_> = all.iter().map(|s| s.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), all.len());
    }

    #[test]
    fn every_scenario_config_validates() {
        for s in scenarios() {
            let cfg = s.config(0, &Overrides::default());
            assert!(cfg.validate().is_ok(), "{} is invalid", s.name);
        }
    }

    #[test]
    fn overrides_only_touch_matching_kinds() {
        let overrides = Overrides { bound: Some(4), ports: Some(8), ..Default::default() };
        for s in scenarios() {
            let cfg = s.config(1, &overrides);
            assert_eq!(cfg.ports, 8);
            assert!(cfg.validate().is_ok(), "{} rejects overrides", s.name);
        }
    }

    #[test]
    fn cli_bound_wins_over_scenario_bound() {
        let overrides = Overrides { bound: Some(4), frequency: Some(2), ..Default::default() };
        let ouro = overrides.scheduler(SchedulerKind::Ouroboros, 3, Some(16), None);
        assert_eq!(ouro.bound, Some(4));
        assert_eq!(ouro.exact_frequency, Some(2));
        assert_eq!(ouro.seed, 3);
        let exact = overrides.scheduler(SchedulerKind::Exact, 3, Some(16), None);
        assert_eq!(exact.bound, None);
        assert!(exact.validate().is_ok());
    }
}

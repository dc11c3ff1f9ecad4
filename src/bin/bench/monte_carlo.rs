// Monte Carlo Infrastructure: N runs per scenario with statistical aggregation
// Each scenario runs N times with seeds base..base+N, computing mean ± 95% CI

use crossbar_engine::*;

use crate::metrics::BacklogTracker;
use crate::report::*;
use crate::scenarios::{Overrides, Scenario};
use crate::time_series::TimeSeriesRecorder;

use std::time::Instant;

/// Run a single scenario iteration with a specific seed.
pub fn run_single(
    scenario: &Scenario,
    seed: u64,
    overrides: &Overrides,
    time_series_dir: Option<&std::path::Path>,
) -> Result<BenchResult, ConfigError> {
    let start = Instant::now();
    let config = scenario.config(seed, overrides);
    let ports = config.ports;
    let slots = scenario.slots(overrides);
    let mut sim = SwitchSimulation::from_config(config)?;

    let mut backlog = BacklogTracker::new();
    let mut time_series = if time_series_dir.is_some() {
        Some(TimeSeriesRecorder::new())
    } else {
        None
    };

    for _ in 0..slots {
        let result = sim.tick_core();
        backlog.record_slot(&result);
        if let Some(ref mut ts) = time_series {
            ts.record(&result);
        }
    }

    // Write time series if enabled
    if let (Some(ts), Some(dir)) = (&time_series, time_series_dir) {
        let path = dir.join(format!("seed-{}.jsonl", seed));
        if let Err(e) = ts.write_jsonl(&path) {
            log::warn!("failed to write time series {}: {}", path.display(), e);
        }
    }

    let elapsed = start.elapsed();
    let elapsed_secs = elapsed.as_secs_f64().max(0.001);

    let stats = sim.stats();
    let switch = sim.switch_metrics();
    let sched = sim.scheduler_metrics();
    let backlog_growth = backlog.growth_rate();

    // Evaluate pass/fail
    let criteria = &scenario.criteria;
    let mut pass = stats.throughput >= criteria.min_throughput;
    if let Some(max_delay) = criteria.max_mean_delay {
        if stats.mean_delay > max_delay {
            pass = false;
        }
    }
    if let Some(max_growth) = criteria.max_backlog_growth {
        if backlog_growth > max_growth {
            pass = false;
        }
    }

    Ok(BenchResult {
        scenario: scenario.label.to_string(),
        name: scenario.name.to_string(),
        category: scenario.category.to_string(),
        scheduler: sim.scheduler_name().to_string(),
        seed,
        pass,
        ports,
        slots,
        load: scenario.load,
        arrivals: stats.total_arrivals,
        departures: stats.total_departures,
        throughput: stats.throughput,
        mean_delay: stats.mean_delay,
        p90_delay: stats.p90_delay,
        p99_delay: stats.p99_delay,
        max_delay: stats.max_delay,
        final_backlog: stats.total_backlog,
        backlog_growth,
        mean_schedule_weight: switch.mean_schedule_weight(),
        mean_effective_size: switch.mean_effective_size(),
        computed_fraction: sched.cycles.computed_fraction(),
        wrong_rate: sched.cycles.wrong_rate(),
        bound_fallbacks: sched.cycles.bound_fallbacks,
        exact_slots: sched.cycles.exact_slots,
        broadcast_rounds_per_slot: sched.broadcast.mean_rounds_per_slot(),
        reconstruction_hops: sched.knowledge.reconstruction_hops,
        elapsed_ms: elapsed.as_millis(),
        slots_per_sec: slots as f64 / elapsed_secs,
    })
}

/// Run Monte Carlo: N runs of a scenario, aggregate stats.
pub fn run_monte_carlo(
    scenario: &Scenario,
    n_runs: usize,
    base_seed: u64,
    overrides: &Overrides,
    time_series_base: Option<&std::path::Path>,
) -> Result<MonteCarloReport, ConfigError> {
    let ts_dir = time_series_base.map(|base| base.join(scenario.name.to_lowercase()));

    let mut results = Vec::with_capacity(n_runs);
    for i in 0..n_runs {
        let seed = base_seed + i as u64;
        let result = run_single(scenario, seed, overrides, ts_dir.as_deref())?;
        log::debug!(
            "{} seed {}: throughput {:.4}, mean delay {:.2}",
            scenario.name, seed, result.throughput, result.mean_delay
        );
        results.push(result);
    }

    Ok(aggregate(scenario, results))
}

/// Aggregate individual runs into a MonteCarloReport.
fn aggregate(scenario: &Scenario, results: Vec<BenchResult>) -> MonteCarloReport {
    let n = results.len();
    let passed = results.iter().filter(|r| r.pass).count();
    let pass_rate = if n == 0 { 0.0 } else { passed as f64 / n as f64 };

    let stat = |f: fn(&BenchResult) -> f64| {
        Stats::from_samples(&results.iter().map(f).collect::<Vec<_>>())
    };

    MonteCarloReport {
        scenario_name: scenario.name.to_string(),
        label: scenario.label.to_string(),
        category: scenario.category.to_string(),
        n_runs: n,
        pass_rate,
        throughput: stat(|r| r.throughput),
        mean_delay: stat(|r| r.mean_delay),
        p99_delay: stat(|r| r.p99_delay as f64),
        backlog_growth: stat(|r| r.backlog_growth),
        computed_fraction: stat(|r| r.computed_fraction),
        wrong_rate: stat(|r| r.wrong_rate),
        elapsed_ms: stat(|r| r.elapsed_ms as f64),
        slots_per_sec: stat(|r| r.slots_per_sec),
        individual_runs: results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::scenarios;

    #[test]
    fn short_runs_aggregate() {
        let all = scenarios();
        let scenario = all.iter().find(|s| s.name == "KNOW_UNIFORM_90").unwrap();
        let overrides = Overrides { ports: Some(8), slots: Some(200), ..Default::default() };
        let report = run_monte_carlo(scenario, 3, 10, &overrides, None).unwrap();
        assert_eq!(report.n_runs, 3);
        assert_eq!(report.individual_runs[2].seed, 12);
        assert!(report.throughput.mean > 0.5);
    }

    #[test]
    fn missing_table_aborts_the_scenario() {
        let all = scenarios();
        let scenario = all.iter().find(|s| s.name == "OURO_UNIFORM_60").unwrap();
        let overrides = Overrides {
            ouroboros_table: Some("/nonexistent/ouroboros.txt".into()),
            ..Default::default()
        };
        assert!(run_monte_carlo(scenario, 1, 0, &overrides, None).is_err());
    }
}

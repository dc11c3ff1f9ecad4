// Crossbar Benchmark Runner v1.0.0: Merge-Scheduler Validation
// Monte Carlo (N=30), seedable ChaCha8 traffic, per-slot audit trail
//
// Usage:
//   cargo run --release --bin bench                        # Run all scenarios (30 runs each)
//   cargo run --release --bin bench -- --runs 5            # Quick mode (5 runs each)
//   cargo run --release --bin bench -- OURO                # Filter by name
//   cargo run --release --bin bench -- --time-series       # Enable JSONL output
//   cargo run --release --bin bench -- --seed 42           # Custom base seed
//   cargo run --release --bin bench -- --ouroboros data/ouroboros_32.txt
//   cargo run --release --bin bench -- --sweep load --runs 5    # Delay vs load curves
//   cargo run --release --bin bench -- --sweep burst --loads 0.8 --bursts 4,16,64
//
// Logging goes through env_logger: RUST_LOG=debug for per-run detail.

mod report;
mod scenarios;
mod monte_carlo;
mod metrics;
mod time_series;
mod sweep;

use clap::Parser;
use crossbar_engine::{SchedulerKind, TrafficModel};
use report::*;
use scenarios::*;
use metrics::run_paired_comparison;
use serde::Serialize;
use sweep::{SweepKind, SweepPlan, SweepReport};
use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

// ─── CLI ────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "bench", about = "Monte Carlo benchmark of crossbar merge schedulers")]
struct Cli {
    /// Runs per scenario
    #[arg(long, default_value_t = 30)]
    runs: usize,

    /// Base seed; run i uses seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Override the port count of every scenario
    #[arg(long)]
    ports: Option<usize>,

    /// Override the slot count of every scenario
    #[arg(long)]
    slots: Option<u64>,

    /// Write per-slot JSONL under benchmark-results/time-series
    #[arg(long)]
    time_series: bool,

    /// Ouroboros flags file for ouroboros scenarios
    #[arg(long)]
    ouroboros: Option<PathBuf>,

    /// Broadcast-iteration file for broadcast scenarios
    #[arg(long)]
    broadcast: Option<PathBuf>,

    /// Backlog bound for ouroboros scenarios
    #[arg(long)]
    bound: Option<u64>,

    /// Merge one slot in FREQUENCY exactly in ouroboros scenarios
    #[arg(long)]
    frequency: Option<u32>,

    /// Output directory for the JSON report
    #[arg(long, default_value = "benchmark-results")]
    out: PathBuf,

    /// Sweep delay across loads or burst lengths instead of running scenarios
    #[arg(long, value_enum)]
    sweep: Option<SweepKind>,

    /// Loads for --sweep (comma separated)
    #[arg(long, value_delimiter = ',')]
    loads: Vec<f64>,

    /// Mean burst lengths for --sweep burst (comma separated)
    #[arg(long, value_delimiter = ',')]
    bursts: Vec<f64>,

    /// Traffic models for --sweep (default: all four)
    #[arg(long, value_delimiter = ',')]
    traffic: Vec<TrafficModel>,

    /// Schedulers for --sweep (default: all four)
    #[arg(long, value_delimiter = ',')]
    schedulers: Vec<SchedulerKind>,

    /// Only run scenarios whose name, label or category contains this
    filter: Option<String>,
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let overrides = Overrides {
        ports: cli.ports,
        slots: cli.slots,
        ouroboros_table: cli.ouroboros.clone(),
        broadcast_table: cli.broadcast.clone(),
        bound: cli.bound,
        frequency: cli.frequency,
    };

    if let Some(kind) = cli.sweep {
        run_sweep_mode(&cli, kind, &overrides);
        return;
    }

    let all_scenarios = scenarios();

    let to_run: Vec<&Scenario> = match &cli.filter {
        Some(f) => {
            let f_lower = f.to_lowercase();
            all_scenarios.iter()
                .filter(|s| s.name.to_lowercase().contains(&f_lower)
                          || s.label.to_lowercase().contains(&f_lower)
                          || s.category.to_lowercase().contains(&f_lower))
                .collect()
        }
        None => all_scenarios.iter().collect(),
    };

    if to_run.is_empty() {
        log::error!("no scenarios match filter: {:?}", cli.filter);
        std::process::exit(1);
    }

    let ts_dir = if cli.time_series {
        Some(cli.out.join("time-series"))
    } else {
        None
    };

    println!("\n  Crossbar Benchmark Runner v1.0.0");
    println!("  PRNG: ChaCha8Rng | Runs/scenario: {} | Base seed: {}", cli.runs, cli.seed);
    println!("  Running {} scenario(s)...\n", to_run.len());
    println!("  {:<34} {:>5} {:>14} {:>9} {:>7} {:>9} {:>7}",
        "Scenario", "Pass%", "Throughput", "Delay", "P99", "Computed", "Time");
    println!("  {}", "-".repeat(92));

    let suite_start = Instant::now();
    let mut mc_reports = Vec::new();

    for scenario in &to_run {
        let report = match monte_carlo::run_monte_carlo(
            scenario,
            cli.runs,
            cli.seed,
            &overrides,
            ts_dir.as_deref(),
        ) {
            Ok(r) => r,
            Err(e) => {
                log::error!("{}: {}", scenario.name, e);
                std::process::exit(1);
            }
        };

        let pass_pct = report.pass_rate * 100.0;
        let status = if pass_pct >= 93.3 { "PASS" } else { "FAIL" };

        println!("  {:<34} {:>4}% {:>7.4}±{:<6.4} {:>9.2} {:>7.0} {:>8.1}% {:>5.0}ms  {}",
            report.label,
            pass_pct as u32,
            report.throughput.mean, report.throughput.ci95,
            report.mean_delay.mean,
            report.p99_delay.mean,
            report.computed_fraction.mean * 100.0,
            report.elapsed_ms.mean,
            status,
        );

        mc_reports.push(report);
    }

    let suite_elapsed = suite_start.elapsed();

    // ─── Approximation Gap ──────────────────────────────────────────────

    let ports = cli.ports.unwrap_or(32);
    let mut comparisons = Vec::new();
    for kind in [SchedulerKind::Ouroboros, SchedulerKind::Broadcast, SchedulerKind::Knowledge] {
        match run_paired_comparison(kind, ports, 5_000, 0.9, cli.seed, &overrides) {
            Ok(c) => comparisons.push(c),
            Err(e) => log::warn!("paired comparison for {} skipped: {}", kind.name(), e),
        }
    }

    // ─── Summary ────────────────────────────────────────────────────────

    let total = mc_reports.len();
    let passed = mc_reports.iter().filter(|r| r.pass_rate >= 0.933).count();
    let failed = total - passed;

    println!("  {}", "-".repeat(92));
    println!("  Total: {}  Passed: {}  Failed: {}  Suite time: {:.1}s\n",
        total, passed, failed, suite_elapsed.as_secs_f64());

    println!("  Approximation gap vs exact merge (N={}, load 0.9):", ports);
    for c in &comparisons {
        println!("    {:<18} delay ratio {:>6.3}  identical schedules: {}",
            c.scheduler, c.delay_ratio, if c.identical_schedules { "yes" } else { "no" });
    }
    println!();

    // ─── Write JSON Report ──────────────────────────────────────────────

    let timestamp = timestamp();

    let report = BenchReport {
        timestamp: timestamp.clone(),
        version: "1.0.0",
        prng: "ChaCha8Rng",
        n_runs_per_scenario: cli.runs,
        summary: Summary {
            total,
            passed,
            failed,
            pass_rate: passed as f64 / total as f64,
        },
        comparisons,
        scenarios: mc_reports,
    };

    let path = cli.out.join(format!("bench-{}.json", timestamp));
    if let Err(e) = write_json(&report, &path) {
        log::error!("failed to write {}: {}", path.display(), e);
        std::process::exit(1);
    }
    println!("  Results saved to: {}\n", path.display());

    if failed > 0 {
        std::process::exit(1);
    }
}

// ─── Sweep Mode ─────────────────────────────────────────────────────────────

fn run_sweep_mode(cli: &Cli, kind: SweepKind, overrides: &Overrides) {
    let loads = match (kind, cli.loads.is_empty()) {
        (_, false) => cli.loads.clone(),
        (SweepKind::Load, true) => sweep::DEFAULT_LOADS.to_vec(),
        (SweepKind::Burst, true) => vec![sweep::DEFAULT_BURST_LOAD],
    };
    let plan = SweepPlan {
        kind,
        loads,
        bursts: if cli.bursts.is_empty() { sweep::DEFAULT_BURSTS.to_vec() } else { cli.bursts.clone() },
        traffic: if cli.traffic.is_empty() {
            vec![TrafficModel::Uniform, TrafficModel::Diagonal, TrafficModel::LogDiagonal, TrafficModel::QuasiDiagonal]
        } else {
            cli.traffic.clone()
        },
        schedulers: if cli.schedulers.is_empty() {
            vec![SchedulerKind::Exact, SchedulerKind::Ouroboros, SchedulerKind::Broadcast, SchedulerKind::Knowledge]
        } else {
            cli.schedulers.clone()
        },
        ports: cli.ports.unwrap_or(32),
        slots: cli.slots.unwrap_or(20_000),
        runs: cli.runs,
        seed: cli.seed,
    };

    println!("\n  Crossbar Delay Sweep ({:?})", kind);
    println!("  Ports: {} | Slots: {} | Runs/point: {} | Rows: {}\n",
        plan.ports, plan.slots, plan.runs, plan.row_count());
    println!("  {:<15} {:<10} {:>6} {:>7} {:>16} {:>8} {:>9}",
        "Traffic", "Scheduler", "Load", "Burst", "Mean delay", "P99", "Wrong%");
    println!("  {}", "-".repeat(78));

    let rows = match sweep::run_sweep(&plan, overrides) {
        Ok(rows) => rows,
        Err(e) => {
            log::error!("sweep aborted: {}", e);
            std::process::exit(1);
        }
    };
    for row in &rows {
        println!("  {:<15} {:<10} {:>6.2} {:>7} {:>8.2}±{:<7.2} {:>8.0} {:>8.2}%",
            row.traffic,
            row.scheduler,
            row.load,
            row.mean_burst.map(|b| format!("{}", b)).unwrap_or_else(|| "-".to_string()),
            row.mean_delay.mean, row.mean_delay.ci95,
            row.p99_delay.mean,
            row.wrong_rate.mean * 100.0,
        );
    }

    let timestamp = timestamp();
    let path = cli.out.join(format!("sweep-{:?}-{}.json", kind, timestamp).to_lowercase());
    let report = SweepReport {
        timestamp,
        kind,
        ports: plan.ports,
        slots: plan.slots,
        runs: plan.runs,
        rows,
    };
    if let Err(e) = write_json(&report, &path) {
        log::error!("failed to write {}: {}", path.display(), e);
        std::process::exit(1);
    }
    println!("\n  Results saved to: {}\n", path.display());
}

fn timestamp() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
        .to_string()
}

fn write_json<T: Serialize>(report: &T, path: &std::path::Path) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    std::fs::write(path, json)
}

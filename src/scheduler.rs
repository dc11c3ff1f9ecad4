// Copyright (c) 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Scheduler trait and its merge-variant implementations.
//!
//! Every variant shares the same per-slot shape: build the candidate from this
//! slot's arrivals, then merge it with the previous schedule. Only the merge
//! step differs, so implementations provide [`Scheduler::decide`] and inherit
//! [`Scheduler::schedule`].

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::arrival::candidate_matching;
use crate::broadcast::{broadcast_merge, BroadcastTable};
use crate::config::{ConfigError, SchedulerConfig, SchedulerKind};
use crate::cycles::CycleDecomposition;
use crate::knowledge::knowledge_merge;
use crate::matching::Matching;
use crate::merge::assemble;
use crate::metrics::SchedulerMetrics;
use crate::ouroboros::{decide_cycles, ouroboros_merge, OuroborosTable};
use crate::types::{Backlog, PortId, Weight};

pub trait Scheduler {
    fn name(&self) -> &'static str;

    /// Merge `previous` with an already completed `candidate`.
    fn decide(&mut self, previous: &Matching, candidate: &Matching, backlog: &Backlog) -> Matching;

    /// Full per-slot step: candidate from arrivals, then [`decide`](Self::decide).
    fn schedule(&mut self, arrivals: &[Option<PortId>], previous: &Matching, backlog: &Backlog) -> Matching {
        let candidate = candidate_matching(arrivals, backlog);
        self.decide(previous, &candidate, backlog)
    }

    fn metrics(&self) -> &SchedulerMetrics;

    /// Clear counters and restore any random state to its seed.
    fn reset(&mut self);
}

// ---------------------------------------------------------------------------
// Exact
// ---------------------------------------------------------------------------

pub struct ExactScheduler {
    metrics: SchedulerMetrics,
}

impl ExactScheduler {
    pub fn new(ports: usize) -> Self {
        Self { metrics: SchedulerMetrics::new(ports) }
    }
}

impl Scheduler for ExactScheduler {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn decide(&mut self, previous: &Matching, candidate: &Matching, backlog: &Backlog) -> Matching {
        let decomposition = CycleDecomposition::new(previous, candidate, backlog);
        let decisions = decide_cycles(&decomposition, None, None, &mut self.metrics);
        assemble(previous, candidate, &decomposition, &decisions)
    }

    fn metrics(&self) -> &SchedulerMetrics {
        &self.metrics
    }

    fn reset(&mut self) {
        self.metrics.reset();
    }
}

// ---------------------------------------------------------------------------
// Ouroboros
// ---------------------------------------------------------------------------

/// Table-driven merge with an optional backlog bound and optional random
/// exact slots.
pub struct OuroborosScheduler {
    table: OuroborosTable,
    bound: Option<Weight>,
    exact_frequency: Option<u32>,
    seed: u64,
    rng: ChaCha8Rng,
    metrics: SchedulerMetrics,
}

impl OuroborosScheduler {
    pub fn new(table: OuroborosTable) -> Self {
        let ports = table.len();
        Self {
            table,
            bound: None,
            exact_frequency: None,
            seed: 0,
            rng: ChaCha8Rng::seed_from_u64(0),
            metrics: SchedulerMetrics::new(ports),
        }
    }

    pub fn with_bound(mut self, bound: Weight) -> Self {
        self.bound = Some(bound);
        self
    }

    /// Merge roughly one slot in `frequency` exactly. Panics on zero.
    pub fn with_exact_frequency(mut self, frequency: u32, seed: u64) -> Self {
        assert!(frequency > 0, "exact-merge frequency must be at least 1");
        self.exact_frequency = Some(frequency);
        self.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    pub fn table(&self) -> &OuroborosTable {
        &self.table
    }
}

impl Scheduler for OuroborosScheduler {
    fn name(&self) -> &'static str {
        if self.bound.is_some() { "ouroboros-bounded" } else { "ouroboros" }
    }

    fn decide(&mut self, previous: &Matching, candidate: &Matching, backlog: &Backlog) -> Matching {
        let exact_slot = match self.exact_frequency {
            Some(frequency) => self.rng.gen_range(0..frequency) == 0,
            None => false,
        };
        if !exact_slot {
            return ouroboros_merge(previous, candidate, backlog, &self.table, self.bound, &mut self.metrics);
        }
        self.metrics.cycles.exact_slots += 1;
        let decomposition = CycleDecomposition::new(previous, candidate, backlog);
        let decisions = decide_cycles(&decomposition, None, None, &mut self.metrics);
        assemble(previous, candidate, &decomposition, &decisions)
    }

    fn metrics(&self) -> &SchedulerMetrics {
        &self.metrics
    }

    fn reset(&mut self) {
        self.metrics.reset();
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }
}

// ---------------------------------------------------------------------------
// Broadcast
// ---------------------------------------------------------------------------

pub struct BroadcastScheduler {
    table: BroadcastTable,
    metrics: SchedulerMetrics,
}

impl BroadcastScheduler {
    pub fn new(table: BroadcastTable) -> Self {
        let ports = table.len();
        Self { table, metrics: SchedulerMetrics::new(ports) }
    }
}

impl Scheduler for BroadcastScheduler {
    fn name(&self) -> &'static str {
        "broadcast"
    }

    fn decide(&mut self, previous: &Matching, candidate: &Matching, backlog: &Backlog) -> Matching {
        broadcast_merge(previous, candidate, backlog, &self.table, &mut self.metrics)
    }

    fn metrics(&self) -> &SchedulerMetrics {
        &self.metrics
    }

    fn reset(&mut self) {
        self.metrics.reset();
    }
}

// ---------------------------------------------------------------------------
// Knowledge discovery
// ---------------------------------------------------------------------------

pub struct KnowledgeScheduler {
    metrics: SchedulerMetrics,
}

impl KnowledgeScheduler {
    pub fn new(ports: usize) -> Self {
        Self { metrics: SchedulerMetrics::new(ports) }
    }
}

impl Scheduler for KnowledgeScheduler {
    fn name(&self) -> &'static str {
        "knowledge"
    }

    fn decide(&mut self, previous: &Matching, candidate: &Matching, backlog: &Backlog) -> Matching {
        knowledge_merge(previous, candidate, backlog, &mut self.metrics)
    }

    fn metrics(&self) -> &SchedulerMetrics {
        &self.metrics
    }

    fn reset(&mut self) {
        self.metrics.reset();
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Build the configured variant for an `ports`-port switch, loading any
/// table files it names.
pub fn build_scheduler(config: &SchedulerConfig, ports: usize) -> Result<Box<dyn Scheduler>, ConfigError> {
    config.validate()?;
    let scheduler: Box<dyn Scheduler> = match config.kind {
        SchedulerKind::Exact => Box::new(ExactScheduler::new(ports)),
        SchedulerKind::Ouroboros => {
            let table = match &config.ouroboros_table {
                Some(path) => OuroborosTable::load(path, ports)?,
                None => OuroborosTable::power_of_two(ports),
            };
            log::info!(
                "ouroboros table flags lengths {:?}",
                table.flagged_lengths().collect::<Vec<_>>()
            );
            let mut s = OuroborosScheduler::new(table);
            if let Some(bound) = config.bound {
                s = s.with_bound(bound);
            }
            if let Some(frequency) = config.exact_frequency {
                s = s.with_exact_frequency(frequency, config.seed);
            }
            Box::new(s)
        }
        SchedulerKind::Broadcast => {
            let table = match &config.broadcast_table {
                Some(path) => BroadcastTable::load(path, ports)?,
                None => BroadcastTable::doubling(ports),
            };
            Box::new(BroadcastScheduler::new(table))
        }
        SchedulerKind::Knowledge => Box::new(KnowledgeScheduler::new(ports)),
    };
    log::debug!("built {} scheduler for {} ports", scheduler.name(), ports);
    Ok(scheduler)
}

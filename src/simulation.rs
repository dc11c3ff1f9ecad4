// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Crossbar Scheduling Simulation Suite - Simulation Core

use std::collections::VecDeque;
use wasm_bindgen::prelude::*;

use crate::config::{ConfigError, SimConfig};
use crate::matching::Matching;
use crate::metrics::{SchedulerMetrics, SwitchMetrics};
use crate::scheduler::{build_scheduler, Scheduler};
use crate::traffic::TrafficGenerator;
use crate::types::*;

// ─── SwitchSimulation struct ─────────────────────────────────────────────────

#[wasm_bindgen]
pub struct SwitchSimulation {
    pub(crate) config: SimConfig,
    pub(crate) slot: u64,

    pub(crate) backlog: Backlog,
    /// Arrival slot of every queued unit, one FIFO per VOQ, row-major.
    /// Left empty when delays are not tracked.
    pub(crate) queued_at: Vec<VecDeque<u64>>,
    pub(crate) schedule: Matching,

    pub(crate) traffic: TrafficGenerator,
    pub(crate) scheduler: Box<dyn Scheduler>,
    pub(crate) metrics: SwitchMetrics,
}

// ─── Internal Logic (Testable, pure Rust) ────────────────────────────────────

impl SwitchSimulation {
    pub fn from_config(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let ports = config.ports;
        let scheduler = build_scheduler(&config.scheduler, ports)?;
        let traffic = TrafficGenerator::new(config.seed, ports, config.load, config.traffic, config.injection);
        log::info!(
            "switch: {} ports, {} traffic at load {:.3}, {} scheduler, seed {}",
            ports, config.traffic.name(), config.load, scheduler.name(), config.seed
        );
        Ok(Self {
            slot: 0,
            backlog: Backlog::new(ports),
            queued_at: if config.track_delays { vec![VecDeque::new(); ports * ports] } else { Vec::new() },
            schedule: Matching::identity(ports),
            traffic,
            scheduler,
            metrics: SwitchMetrics::default(),
            config,
        })
    }

    /// Advance one slot: arrivals, scheduling, departures.
    pub fn tick_core(&mut self) -> SlotResult {
        self.slot += 1;
        let now = self.slot;
        let ports = self.config.ports;

        // 1. Arrivals
        let arrivals = self.traffic.next_slot();
        let mut arrived = 0u32;
        for (input, request) in arrivals.iter().enumerate() {
            if let Some(output) = *request {
                self.backlog.increment(input, output);
                if self.config.track_delays {
                    self.queued_at[input * ports + output].push_back(now);
                }
                arrived += 1;
            }
        }

        // 2. Schedule
        let cycles_before = self.scheduler.metrics().lengths.total();
        self.schedule = self.scheduler.schedule(&arrivals, &self.schedule, &self.backlog);
        let cycles = self.scheduler.metrics().lengths.total() - cycles_before;

        let mut schedule_weight = 0;
        let mut effective_size = 0u32;
        for (input, &output) in self.schedule.as_slice().iter().enumerate() {
            let w = self.backlog[(input, output)];
            schedule_weight += w;
            if w > 0 {
                effective_size += 1;
            }
        }

        // 3. Departures
        let mut departed = 0u32;
        for (input, &output) in self.schedule.as_slice().iter().enumerate() {
            if !self.backlog.decrement(input, output) {
                continue;
            }
            departed += 1;
            if self.config.track_delays {
                match self.queued_at[input * ports + output].pop_front() {
                    Some(arrived_at) => self.metrics.delays.record(now - arrived_at),
                    None => panic!(
                        "invariant violated: VOQ ({}, {}) has backlog but no queued arrival",
                        input, output
                    ),
                }
            }
        }

        self.metrics.slots += 1;
        self.metrics.arrivals += arrived as u64;
        self.metrics.departures += departed as u64;
        self.metrics.schedule_weight_sum += schedule_weight;
        self.metrics.effective_size_sum += effective_size as u64;

        let total_backlog = self.backlog.total();
        log::trace!(
            "slot {}: {} in, {} out, weight {}, backlog {}",
            now, arrived, departed, schedule_weight, total_backlog
        );

        SlotResult {
            slot: now,
            arrivals: arrived,
            departures: departed,
            schedule_weight,
            effective_size,
            total_backlog,
            cycles,
            schedule: self.schedule.as_slice().to_vec(),
        }
    }

    /// Run `slots` slots and return the cumulative statistics.
    pub fn run(&mut self, slots: u64) -> SimStats {
        for _ in 0..slots {
            self.tick_core();
        }
        self.stats()
    }

    pub fn stats(&self) -> SimStats {
        let delays = &self.metrics.delays;
        SimStats {
            slots: self.slot,
            total_arrivals: self.metrics.arrivals,
            total_departures: self.metrics.departures,
            throughput: self.metrics.throughput(),
            mean_delay: delays.mean(),
            max_delay: delays.max(),
            p90_delay: delays.percentile(0.90),
            p95_delay: delays.percentile(0.95),
            p99_delay: delays.percentile(0.99),
            total_backlog: self.backlog.total(),
        }
    }

    /// Back to slot 0 with the same configuration and seeds.
    pub fn reset_core(&mut self) {
        let c = &self.config;
        self.traffic = TrafficGenerator::new(c.seed, c.ports, c.load, c.traffic, c.injection);
        self.backlog.clear();
        self.queued_at.iter_mut().for_each(VecDeque::clear);
        self.schedule = Matching::identity(c.ports);
        self.scheduler.reset();
        self.metrics.reset();
        self.slot = 0;
        log::debug!("simulation reset");
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn slot(&self) -> u64 {
        self.slot
    }

    pub fn backlog(&self) -> &Backlog {
        &self.backlog
    }

    pub fn current_schedule(&self) -> &Matching {
        &self.schedule
    }

    pub fn switch_metrics(&self) -> &SwitchMetrics {
        &self.metrics
    }

    pub fn scheduler_metrics(&self) -> &SchedulerMetrics {
        self.scheduler.metrics()
    }

    pub fn scheduler_name(&self) -> &'static str {
        self.scheduler.name()
    }
}

// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Crossbar Scheduling Simulation Suite - Type Definitions

use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Port index in `[0, N)`. Inputs and outputs share the same index space.
pub type PortId = usize;

/// Backlog carried by one VOQ, and sums of such backlogs.
pub type Weight = u64;

/// Requested output per input for one slot, `None` when the input is idle.
pub type ArrivalVector = Vec<Option<PortId>>;

// ─── Backlog ─────────────────────────────────────────────────────────────────

/// NxN virtual-output-queue occupancy, `backlog[(i, k)]` units queued at
/// input `i` for output `k`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backlog {
    ports: usize,
    cells: Vec<Weight>,
}

impl Backlog {
    pub fn new(ports: usize) -> Self {
        Self { ports, cells: vec![0; ports * ports] }
    }

    /// Build from explicit rows. Panics when the rows are not square.
    pub fn from_rows(rows: &[Vec<Weight>]) -> Self {
        let ports = rows.len();
        let mut cells = Vec::with_capacity(ports * ports);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), ports, "backlog row {} has {} cells, expected {}", i, row.len(), ports);
            cells.extend_from_slice(row);
        }
        Self { ports, cells }
    }

    pub fn ports(&self) -> usize {
        self.ports
    }

    pub fn get(&self, input: PortId, output: PortId) -> Weight {
        self.cells[input * self.ports + output]
    }

    pub fn set(&mut self, input: PortId, output: PortId, value: Weight) {
        self.cells[input * self.ports + output] = value;
    }

    pub fn increment(&mut self, input: PortId, output: PortId) {
        self.cells[input * self.ports + output] += 1;
    }

    /// Remove one unit. Returns `false` (and changes nothing) if the VOQ is empty.
    pub fn decrement(&mut self, input: PortId, output: PortId) -> bool {
        let cell = &mut self.cells[input * self.ports + output];
        if *cell == 0 {
            return false;
        }
        *cell -= 1;
        true
    }

    pub fn total(&self) -> Weight {
        self.cells.iter().sum()
    }

    pub fn row(&self, input: PortId) -> &[Weight] {
        &self.cells[input * self.ports..(input + 1) * self.ports]
    }

    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = 0);
    }

    pub fn to_rows(&self) -> Vec<Vec<Weight>> {
        self.cells.chunks(self.ports.max(1)).map(|r| r.to_vec()).collect()
    }
}

impl Index<(PortId, PortId)> for Backlog {
    type Output = Weight;

    fn index(&self, (input, output): (PortId, PortId)) -> &Weight {
        &self.cells[input * self.ports + output]
    }
}

// ─── Cycle Decision ──────────────────────────────────────────────────────────

/// Which of the two merged matchings a cycle keeps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Side {
    Previous = 0,
    Candidate = 1,
}

impl Side {
    /// Exact decision rule: the candidate wins only when it carries strictly
    /// more backlog than the previous matching on the same cycle.
    pub fn from_weight_diff(weight_diff: i64) -> Self {
        if weight_diff < 0 { Self::Candidate } else { Self::Previous }
    }
}

// ─── SlotResult ──────────────────────────────────────────────────────────────

/// Per-slot observation handed back by the simulation driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotResult {
    pub slot: u64,
    pub arrivals: u32,
    pub departures: u32,
    /// Backlog on the committed schedule's edges before departures.
    pub schedule_weight: Weight,
    /// Scheduled pairs with a non-empty VOQ.
    pub effective_size: u32,
    pub total_backlog: Weight,
    pub cycles: u64,
    pub schedule: Vec<PortId>,
}

// ─── SimStats ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimStats {
    pub slots: u64,
    pub total_arrivals: u64,
    pub total_departures: u64,
    pub throughput: f64,
    pub mean_delay: f64,
    pub max_delay: u64,
    pub p90_delay: u64,
    pub p95_delay: u64,
    pub p99_delay: u64,
    pub total_backlog: Weight,
}

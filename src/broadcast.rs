// Copyright (c) 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Exact merge with broadcast-round accounting.
//!
//! The schedule is identical to [`crate::merge::merge`]. In addition, each
//! cycle is charged the number of broadcast rounds an exact distributed
//! protocol needs for a cycle of its length, looked up in a per-length table.

use std::path::Path;

use crate::cycles::CycleDecomposition;
use crate::matching::Matching;
use crate::merge::{assemble, exact_decisions};
use crate::metrics::SchedulerMetrics;
use crate::tables::{read_table, TableError};
use crate::types::Backlog;

/// `rounds[L - 1]` broadcast rounds for a cycle of length `L`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastTable {
    rounds: Vec<u64>,
}

impl BroadcastTable {
    pub fn from_rounds(rounds: Vec<u64>) -> Self {
        Self { rounds }
    }

    /// Worst-case reconstruction hops of the pointer-doubling protocol: none
    /// when the length is a power of two, otherwise one per set bit of `L - 1`.
    pub fn doubling(ports: usize) -> Self {
        let rounds = (1..=ports)
            .map(|len: usize| {
                if len.is_power_of_two() { 0 } else { (len - 1).count_ones() as u64 }
            })
            .collect();
        Self { rounds }
    }

    pub fn load(path: &Path, ports: usize) -> Result<Self, TableError> {
        Ok(Self::from_rounds(read_table(path, ports)?))
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn rounds(&self, length: usize) -> u64 {
        assert!(
            length >= 1 && length <= self.rounds.len(),
            "invariant violated: cycle length {} outside broadcast table of {} entries",
            length, self.rounds.len()
        );
        self.rounds[length - 1]
    }
}

/// Exact merge, charging each cycle its broadcast rounds.
pub fn broadcast_merge(
    previous: &Matching,
    candidate: &Matching,
    backlog: &Backlog,
    table: &BroadcastTable,
    metrics: &mut SchedulerMetrics,
) -> Matching {
    assert_eq!(
        table.len(), previous.len(),
        "invariant violated: broadcast table has {} entries for {} ports",
        table.len(), previous.len()
    );
    let decomposition = CycleDecomposition::new(previous, candidate, backlog);

    let mut slot_rounds = 0;
    for cycle in decomposition.cycles() {
        let rounds = table.rounds(cycle.length);
        metrics.lengths.record(cycle.length);
        if rounds > 0 {
            metrics.broadcast.cycles_with_rounds += 1;
        }
        slot_rounds += rounds;
    }

    let counters = &mut metrics.broadcast;
    counters.slots += 1;
    counters.rounds += slot_rounds;
    if slot_rounds > 0 {
        counters.slots_with_rounds += 1;
    }

    let decisions = exact_decisions(&decomposition);
    assemble(previous, candidate, &decomposition, &decisions)
}

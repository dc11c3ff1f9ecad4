// Copyright (c) 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Ouroboros-table merge.
//!
//! A per-length flag table lets a merge keep `previous` on whole classes of
//! cycles without computing their weights. Since the decision is made
//! blind, every table-decided cycle is checked against the exact rule
//! afterwards and disagreements are counted.
//!
//! The bounded companion variant overrides the table on any cycle holding an
//! edge whose backlog exceeds a threshold: long-starved VOQs are always
//! computed.

use std::path::Path;

use crate::cycles::CycleDecomposition;
use crate::matching::Matching;
use crate::merge::assemble;
use crate::metrics::SchedulerMetrics;
use crate::tables::{read_table, TableError};
use crate::types::{Backlog, Side, Weight};

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// `skip[L - 1]` is set when cycles of length `L` keep `previous` uncomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OuroborosTable {
    skip: Vec<bool>,
}

impl OuroborosTable {
    pub fn from_flags(skip: Vec<bool>) -> Self {
        Self { skip }
    }

    /// Nonzero entries are flagged.
    pub fn from_values(values: &[u64]) -> Self {
        Self { skip: values.iter().map(|&v| v != 0).collect() }
    }

    /// Table that flags nothing; the merge then behaves exactly.
    pub fn empty(ports: usize) -> Self {
        Self { skip: vec![false; ports] }
    }

    /// Flags every length that is not a power of two. Power-of-two cycles are
    /// the ones the distributed protocol resolves without reconstruction.
    pub fn power_of_two(ports: usize) -> Self {
        Self { skip: (1..=ports).map(|len| !len.is_power_of_two()).collect() }
    }

    pub fn load(path: &Path, ports: usize) -> Result<Self, TableError> {
        Ok(Self::from_values(&read_table(path, ports)?))
    }

    pub fn len(&self) -> usize {
        self.skip.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skip.is_empty()
    }

    pub fn skips(&self, length: usize) -> bool {
        assert!(
            length >= 1 && length <= self.skip.len(),
            "invariant violated: cycle length {} outside Ouroboros table of {} entries",
            length, self.skip.len()
        );
        self.skip[length - 1]
    }

    pub fn flagged_lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.skip.iter().enumerate().filter(|(_, &s)| s).map(|(i, _)| i + 1)
    }
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// Decide every cycle and record the outcome.
///
/// With `table` set to `None` every cycle is computed, which is the exact
/// merge with full accounting. `bound` only matters for flagged cycles.
pub fn decide_cycles(
    decomposition: &CycleDecomposition,
    table: Option<&OuroborosTable>,
    bound: Option<Weight>,
    metrics: &mut SchedulerMetrics,
) -> Vec<Side> {
    let counters = &mut metrics.cycles;
    let mut any_table_decided = false;
    let mut decisions = Vec::with_capacity(decomposition.len());

    for cycle in decomposition.cycles() {
        let length = cycle.length as u64;
        counters.cycles += 1;
        counters.ports += length;
        metrics.lengths.record(cycle.length);

        let flagged = table.map_or(false, |t| t.skips(cycle.length));
        let over_bound = flagged && bound.map_or(false, |b| cycle.max_edge > b);

        if flagged && !over_bound {
            any_table_decided = true;
            counters.table_decided += 1;
            counters.table_weight += cycle.red;
            counters.total_weight += cycle.red;
            if cycle.exact_side() == Side::Candidate {
                counters.wrong += 1;
                counters.wrong_weight += cycle.green - cycle.red;
                counters.ports_wrong += length;
            }
            decisions.push(Side::Previous);
        } else {
            if over_bound {
                counters.bound_fallbacks += 1;
            }
            counters.computed += 1;
            counters.ports_computed += length;
            counters.computed_weight += cycle.chosen_weight();
            counters.total_weight += cycle.chosen_weight();
            decisions.push(cycle.exact_side());
        }
    }

    counters.slots += 1;
    if !any_table_decided {
        counters.slots_all_computed += 1;
    }
    decisions
}

/// Table-driven merge of `previous` and `candidate`.
pub fn ouroboros_merge(
    previous: &Matching,
    candidate: &Matching,
    backlog: &Backlog,
    table: &OuroborosTable,
    bound: Option<Weight>,
    metrics: &mut SchedulerMetrics,
) -> Matching {
    assert_eq!(
        table.len(), previous.len(),
        "invariant violated: Ouroboros table has {} entries for {} ports",
        table.len(), previous.len()
    );
    let decomposition = CycleDecomposition::new(previous, candidate, backlog);
    let decisions = decide_cycles(&decomposition, Some(table), bound, metrics);
    assemble(previous, candidate, &decomposition, &decisions)
}

// Copyright (c) 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Cycle decomposition of the union of two perfect matchings.
//!
//! Following `previous` from input `i` reaches output `previous[i]`, and
//! following `candidate` backwards from that output reaches the next input
//! `candidate⁻¹[previous[i]]`. Repeating the step partitions the ports into
//! disjoint alternating cycles. Each cycle can independently keep its
//! `previous` edges or adopt its `candidate` edges and the result is still a
//! permutation.

use crate::matching::Matching;
use crate::types::{Backlog, PortId, Side, Weight};

/// One alternating cycle, summarised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    /// Smallest input on the cycle; the walk starts here.
    pub leader: PortId,
    pub length: usize,
    /// Backlog on the cycle's `previous` edges.
    pub red: Weight,
    /// Backlog on the cycle's `candidate` edges.
    pub green: Weight,
    /// Largest single-edge backlog across both sides.
    pub max_edge: Weight,
}

impl Cycle {
    /// `red - green`. Negative means the candidate side carries more.
    pub fn weight_diff(&self) -> i64 {
        self.red as i64 - self.green as i64
    }

    pub fn exact_side(&self) -> Side {
        Side::from_weight_diff(self.weight_diff())
    }

    /// Backlog of the side the exact rule picks.
    pub fn chosen_weight(&self) -> Weight {
        self.red.max(self.green)
    }
}

/// Every port assigned to exactly one [`Cycle`].
#[derive(Debug, Clone)]
pub struct CycleDecomposition {
    cycle_of: Vec<usize>,
    cycles: Vec<Cycle>,
}

impl CycleDecomposition {
    /// Walk the union of `previous` and `candidate`, starting each cycle at
    /// the lowest input not yet visited.
    pub fn new(previous: &Matching, candidate: &Matching, backlog: &Backlog) -> Self {
        check_shapes(previous, candidate, backlog);
        let ports = previous.len();
        let candidate_inv = candidate.inverse();

        let mut cycle_of = vec![usize::MAX; ports];
        let mut cycles = Vec::new();

        for start in 0..ports {
            if cycle_of[start] != usize::MAX {
                continue;
            }
            let index = cycles.len();
            let mut cycle = Cycle { leader: start, length: 0, red: 0, green: 0, max_edge: 0 };
            let mut i = start;
            loop {
                cycle_of[i] = index;
                let output = previous.output_of(i);
                let next = candidate_inv[output];
                let red = backlog[(i, output)];
                let green = backlog[(next, output)];
                cycle.red += red;
                cycle.green += green;
                cycle.max_edge = cycle.max_edge.max(red).max(green);
                cycle.length += 1;
                i = next;
                if i == start {
                    break;
                }
                assert!(
                    cycle_of[i] == usize::MAX,
                    "invariant violated: port {} reached twice while walking cycle from {}",
                    i, start
                );
            }
            cycles.push(cycle);
        }

        Self { cycle_of, cycles }
    }

    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    /// Index into [`cycles`](Self::cycles) of the cycle containing `port`.
    pub fn cycle_of(&self, port: PortId) -> usize {
        self.cycle_of[port]
    }

    pub fn ports(&self) -> usize {
        self.cycle_of.len()
    }

    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }
}

/// Panics unless both matchings and the backlog agree on N.
pub(crate) fn check_shapes(previous: &Matching, candidate: &Matching, backlog: &Backlog) {
    assert_eq!(
        previous.len(), candidate.len(),
        "invariant violated: previous has {} ports, candidate has {}",
        previous.len(), candidate.len()
    );
    assert_eq!(
        previous.len(), backlog.ports(),
        "invariant violated: matchings have {} ports, backlog is {}x{}",
        previous.len(), backlog.ports(), backlog.ports()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(v: &[PortId]) -> Matching {
        Matching::try_from_vec(v.to_vec()).unwrap()
    }

    #[test]
    fn equal_matchings_give_fixed_points() {
        let p = m(&[2, 0, 1, 3]);
        let d = CycleDecomposition::new(&p, &p, &Backlog::new(4));
        assert_eq!(d.len(), 4);
        assert!(d.cycles().iter().all(|c| c.length == 1 && c.weight_diff() == 0));
    }

    #[test]
    fn swap_pairs_give_two_cycles() {
        let mut q = Backlog::new(4);
        q.set(0, 1, 5);
        q.set(1, 0, 2);
        q.set(2, 3, 1);
        q.set(3, 2, 4);
        let d = CycleDecomposition::new(&Matching::identity(4), &m(&[1, 0, 3, 2]), &q);
        assert_eq!(d.len(), 2);
        let first = &d.cycles()[0];
        assert_eq!((first.leader, first.length, first.red, first.green), (0, 2, 0, 7));
        assert_eq!(first.max_edge, 5);
        let second = &d.cycles()[1];
        assert_eq!((second.leader, second.length, second.red, second.green), (2, 2, 0, 5));
        assert_eq!(d.cycle_of(1), 0);
        assert_eq!(d.cycle_of(3), 1);
    }

    #[test]
    fn rotation_is_one_long_cycle() {
        let d = CycleDecomposition::new(&Matching::identity(5), &m(&[1, 2, 3, 4, 0]), &Backlog::new(5));
        assert_eq!(d.len(), 1);
        assert_eq!(d.cycles()[0].length, 5);
        assert!((0..5).all(|p| d.cycle_of(p) == 0));
    }

    #[test]
    fn lengths_cover_every_port() {
        let d = CycleDecomposition::new(&m(&[3, 1, 0, 2, 5, 4]), &m(&[0, 1, 2, 3, 4, 5]), &Backlog::new(6));
        let total: usize = d.cycles().iter().map(|c| c.length).sum();
        assert_eq!(total, d.ports());
    }

    #[test]
    #[should_panic(expected = "invariant violated")]
    fn mismatched_lengths_panic() {
        CycleDecomposition::new(&Matching::identity(3), &Matching::identity(4), &Backlog::new(3));
    }
}

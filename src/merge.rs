// Copyright (c) 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Exact cycle-weight merge.
//!
//! Every cycle of the decomposition keeps the side with the larger backlog,
//! ties going to `previous`. All other merge variants reuse [`assemble`] so
//! the permutation check lives in one place.

use crate::cycles::CycleDecomposition;
use crate::matching::Matching;
use crate::types::{Backlog, Side};

/// Merge `previous` and `candidate` by exact per-cycle weight comparison.
pub fn merge(previous: &Matching, candidate: &Matching, backlog: &Backlog) -> Matching {
    let decomposition = CycleDecomposition::new(previous, candidate, backlog);
    let decisions = exact_decisions(&decomposition);
    assemble(previous, candidate, &decomposition, &decisions)
}

/// One [`Side`] per cycle, by the exact rule.
pub fn exact_decisions(decomposition: &CycleDecomposition) -> Vec<Side> {
    decomposition.cycles().iter().map(|c| c.exact_side()).collect()
}

/// Build the merged schedule from per-cycle decisions.
///
/// Panics if `decisions` does not have one entry per cycle, or if the
/// assembled result is not a permutation.
pub fn assemble(
    previous: &Matching,
    candidate: &Matching,
    decomposition: &CycleDecomposition,
    decisions: &[Side],
) -> Matching {
    assert_eq!(
        decisions.len(), decomposition.len(),
        "invariant violated: {} decisions for {} cycles",
        decisions.len(), decomposition.len()
    );
    let outputs = (0..previous.len())
        .map(|input| match decisions[decomposition.cycle_of(input)] {
            Side::Previous => previous.output_of(input),
            Side::Candidate => candidate.output_of(input),
        })
        .collect();
    Matching::from_assembled(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PortId;

    fn m(v: &[PortId]) -> Matching {
        Matching::try_from_vec(v.to_vec()).unwrap()
    }

    #[test]
    fn two_swaps_adopt_candidate() {
        let mut q = Backlog::new(4);
        q.set(0, 1, 5);
        q.set(1, 0, 2);
        q.set(2, 3, 1);
        q.set(3, 2, 4);
        let result = merge(&Matching::identity(4), &m(&[1, 0, 3, 2]), &q);
        assert_eq!(result.as_slice(), &[1, 0, 3, 2]);
    }

    #[test]
    fn zero_backlog_keeps_previous() {
        let previous = m(&[3, 0, 1, 2]);
        let candidate = m(&[0, 1, 2, 3]);
        let q = Backlog::new(4);
        let once = merge(&previous, &candidate, &q);
        assert_eq!(once, previous);
        assert_eq!(merge(&once, &candidate, &q), previous);
    }

    #[test]
    fn equal_matchings_are_returned_unchanged() {
        let p = m(&[1, 2, 0]);
        let mut q = Backlog::new(3);
        q.set(0, 1, 9);
        assert_eq!(merge(&p, &p, &q), p);
    }

    #[test]
    fn mixed_decisions_per_cycle() {
        // Cycle {0,1}: candidate heavier. Cycle {2,3}: previous heavier.
        let mut q = Backlog::new(4);
        q.set(0, 1, 3);
        q.set(2, 2, 6);
        q.set(3, 2, 1);
        let result = merge(&Matching::identity(4), &m(&[1, 0, 3, 2]), &q);
        assert_eq!(result.as_slice(), &[1, 0, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "decisions for")]
    fn assemble_rejects_wrong_decision_count() {
        let p = Matching::identity(2);
        let d = CycleDecomposition::new(&p, &p, &Backlog::new(2));
        assemble(&p, &p, &d, &[Side::Previous]);
    }
}

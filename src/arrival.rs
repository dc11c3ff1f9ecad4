// Copyright (c) 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Arrival-derived candidate matching.
//!
//! Each slot, inputs that received a unit request its output. Contention for
//! an output is resolved greedily by VOQ backlog, then the partial result is
//! completed into a full permutation by pairing the leftover inputs and
//! outputs positionally.

use crate::matching::{Matching, PartialMatching};
use crate::types::{Backlog, PortId};

/// Resolve this slot's requests into a partial matching.
///
/// Inputs are visited in ascending order. A later claimant only displaces
/// the current owner of an output when its backlog for that output is
/// strictly larger, so ties go to the earlier input.
pub fn greedy_arrival_matching(arrivals: &[Option<PortId>], backlog: &Backlog) -> PartialMatching {
    let ports = arrivals.len();
    assert_eq!(backlog.ports(), ports, "backlog is {}x{}, arrival vector has {} ports", backlog.ports(), backlog.ports(), ports);

    let mut owner: Vec<Option<PortId>> = vec![None; ports];
    for (input, request) in arrivals.iter().enumerate() {
        let Some(output) = *request else { continue };
        assert!(output < ports, "input {} requested output {} outside [0, {})", input, output, ports);
        match owner[output] {
            None => owner[output] = Some(input),
            Some(held_by) => {
                if backlog[(input, output)] > backlog[(held_by, output)] {
                    owner[output] = Some(input);
                }
            }
        }
    }

    let mut outputs = vec![None; ports];
    for (output, claimant) in owner.iter().enumerate() {
        if let Some(input) = *claimant {
            outputs[input] = Some(output);
        }
    }
    PartialMatching::from_vec(outputs)
}

/// Pair the i-th unmatched input with the i-th unmatched output, both in
/// ascending order. Claimed pairs are left untouched.
pub fn complete(partial: &PartialMatching) -> Matching {
    let ports = partial.len();
    let mut output_taken = vec![false; ports];
    let mut free_inputs = Vec::new();
    for (input, output) in partial.as_slice().iter().enumerate() {
        match *output {
            Some(k) => output_taken[k] = true,
            None => free_inputs.push(input),
        }
    }
    let free_outputs: Vec<PortId> = (0..ports).filter(|&k| !output_taken[k]).collect();
    assert_eq!(free_inputs.len(), free_outputs.len(), "unmatched input and output counts differ");

    let mut outputs: Vec<PortId> = partial.as_slice().iter().map(|o| o.unwrap_or(0)).collect();
    for (&input, &output) in free_inputs.iter().zip(free_outputs.iter()) {
        outputs[input] = output;
    }
    Matching::from_assembled(outputs)
}

/// Greedy resolution followed by completion.
pub fn candidate_matching(arrivals: &[Option<PortId>], backlog: &Backlog) -> Matching {
    complete(&greedy_arrival_matching(arrivals, backlog))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncontended_requests_are_kept() {
        let q = Backlog::new(3);
        let partial = greedy_arrival_matching(&[Some(2), None, Some(0)], &q);
        assert_eq!(partial.as_slice(), &[Some(2), None, Some(0)]);
    }

    #[test]
    fn contention_prefers_larger_backlog() {
        let mut q = Backlog::new(3);
        q.set(0, 1, 1);
        q.set(2, 1, 4);
        let partial = greedy_arrival_matching(&[Some(1), None, Some(1)], &q);
        assert_eq!(partial.as_slice(), &[None, None, Some(1)]);
    }

    #[test]
    fn contention_tie_keeps_earlier_input() {
        let mut q = Backlog::new(3);
        q.set(0, 2, 3);
        q.set(1, 2, 3);
        let partial = greedy_arrival_matching(&[Some(2), Some(2), None], &q);
        assert_eq!(partial.as_slice(), &[Some(2), None, None]);
    }

    #[test]
    fn completion_pairs_positionally() {
        // Inputs 0 and 3 are free, outputs 1 and 2 are free.
        let partial = PartialMatching::from_vec(vec![None, Some(0), Some(3), None]);
        let m = complete(&partial);
        assert_eq!(m.as_slice(), &[1, 0, 3, 2]);
    }

    #[test]
    fn completion_of_empty_partial_is_identity() {
        let m = complete(&PartialMatching::unmatched(4));
        assert_eq!(m, Matching::identity(4));
    }

    #[test]
    fn candidate_with_no_arrivals_is_identity() {
        let q = Backlog::new(5);
        assert_eq!(candidate_matching(&[None; 5], &q), Matching::identity(5));
    }
}

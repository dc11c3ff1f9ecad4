// Copyright (c) 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Perfect and partial matchings between input and output ports.
//!
//! A [`Matching`] is always a permutation of `[0, N)`. Values built from
//! external data go through [`Matching::try_from_vec`]; values assembled by the
//! scheduler go through [`Matching::from_assembled`], which treats a
//! non-permutation as a logic defect and panics.

use serde::{Deserialize, Serialize};

use crate::types::PortId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from validating externally supplied matchings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchingError {
    #[error("output {output} of input {input} is outside [0, {ports})")]
    OutOfRange { input: PortId, output: PortId, ports: usize },

    #[error("output {output} is assigned to both input {first} and input {second}")]
    DuplicateOutput { output: PortId, first: PortId, second: PortId },
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// `outputs[i]` is the output served by input `i`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<PortId>", into = "Vec<PortId>")]
pub struct Matching {
    outputs: Vec<PortId>,
}

impl Matching {
    /// The identity schedule, input `i` to output `i`.
    pub fn identity(ports: usize) -> Self {
        Self { outputs: (0..ports).collect() }
    }

    /// Validate an externally supplied assignment.
    pub fn try_from_vec(outputs: Vec<PortId>) -> Result<Self, MatchingError> {
        check_permutation(&outputs)?;
        Ok(Self { outputs })
    }

    /// Wrap an assignment produced by the scheduler itself.
    ///
    /// Panics if `outputs` is not a permutation: a corrupted schedule would
    /// silently skew every delay statistic downstream.
    pub fn from_assembled(outputs: Vec<PortId>) -> Self {
        if let Err(e) = check_permutation(&outputs) {
            panic!("invariant violated: assembled schedule is not a permutation: {}", e);
        }
        Self { outputs }
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn output_of(&self, input: PortId) -> PortId {
        self.outputs[input]
    }

    pub fn as_slice(&self) -> &[PortId] {
        &self.outputs
    }

    /// `inverse[k]` is the input served by output `k`.
    pub fn inverse(&self) -> Vec<PortId> {
        let mut inverse = vec![0; self.outputs.len()];
        for (input, &output) in self.outputs.iter().enumerate() {
            inverse[output] = input;
        }
        inverse
    }
}

impl TryFrom<Vec<PortId>> for Matching {
    type Error = MatchingError;

    fn try_from(outputs: Vec<PortId>) -> Result<Self, Self::Error> {
        Self::try_from_vec(outputs)
    }
}

impl From<Matching> for Vec<PortId> {
    fn from(m: Matching) -> Self {
        m.outputs
    }
}

/// Whether `outputs` is a bijection on `[0, outputs.len())`.
pub fn is_permutation(outputs: &[PortId]) -> bool {
    check_permutation(outputs).is_ok()
}

fn check_permutation(outputs: &[PortId]) -> Result<(), MatchingError> {
    let ports = outputs.len();
    let mut owner: Vec<Option<PortId>> = vec![None; ports];
    for (input, &output) in outputs.iter().enumerate() {
        if output >= ports {
            return Err(MatchingError::OutOfRange { input, output, ports });
        }
        if let Some(first) = owner[output] {
            return Err(MatchingError::DuplicateOutput { output, first, second: input });
        }
        owner[output] = Some(input);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// PartialMatching
// ---------------------------------------------------------------------------

/// A matching in which some inputs (and so some outputs) are unassigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialMatching {
    outputs: Vec<Option<PortId>>,
}

impl PartialMatching {
    pub fn unmatched(ports: usize) -> Self {
        Self { outputs: vec![None; ports] }
    }

    /// Panics if two inputs claim the same output.
    pub fn from_vec(outputs: Vec<Option<PortId>>) -> Self {
        let ports = outputs.len();
        let mut taken = vec![false; ports];
        for (input, output) in outputs.iter().enumerate() {
            if let Some(k) = *output {
                assert!(k < ports, "input {} claims output {} outside [0, {})", input, k, ports);
                assert!(!taken[k], "output {} claimed twice in a partial matching", k);
                taken[k] = true;
            }
        }
        Self { outputs }
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn output_of(&self, input: PortId) -> Option<PortId> {
        self.outputs[input]
    }

    pub fn as_slice(&self) -> &[Option<PortId>] {
        &self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_permutation() {
        let m = Matching::identity(5);
        assert!(is_permutation(m.as_slice()));
        assert_eq!(m.inverse(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn inverse_of_rotation() {
        let m = Matching::try_from_vec(vec![1, 2, 0]).unwrap();
        assert_eq!(m.inverse(), vec![2, 0, 1]);
    }

    #[test]
    fn try_from_vec_rejects_duplicates() {
        let err = Matching::try_from_vec(vec![1, 1, 0]).unwrap_err();
        assert_eq!(err, MatchingError::DuplicateOutput { output: 1, first: 0, second: 1 });
    }

    #[test]
    fn try_from_vec_rejects_out_of_range() {
        let err = Matching::try_from_vec(vec![0, 3]).unwrap_err();
        assert!(matches!(err, MatchingError::OutOfRange { output: 3, .. }));
    }

    #[test]
    #[should_panic(expected = "invariant violated")]
    fn assembled_non_permutation_panics() {
        Matching::from_assembled(vec![0, 0]);
    }

    #[test]
    fn deserialize_validates_permutation() {
        let ok: Matching = serde_json::from_str("[2,0,1]").unwrap();
        assert_eq!(ok.as_slice(), &[2, 0, 1]);
        assert!(serde_json::from_str::<Matching>("[0,0,1]").is_err());
    }

    #[test]
    fn empty_matching_is_valid() {
        let m = Matching::try_from_vec(Vec::new()).unwrap();
        assert!(m.is_empty());
    }

    #[test]
    #[should_panic(expected = "claimed twice")]
    fn partial_matching_rejects_double_claim() {
        PartialMatching::from_vec(vec![Some(1), Some(1), None]);
    }
}

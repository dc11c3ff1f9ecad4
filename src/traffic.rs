// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Crossbar Scheduling Simulation Suite - Traffic Generation
//
// Seedable per-slot arrival generator: one optional unit per input per slot,
// destination drawn from a traffic matrix, injection either i.i.d. Bernoulli
// or on/off bursts with a geometric burst length.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::types::{ArrivalVector, PortId};

// ─── Traffic Matrix ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrafficModel {
    Uniform,
    /// 2/3 to output `i`, 1/3 to `i + 1`.
    Diagonal,
    /// Halving shares over offsets 0..=5.
    LogDiagonal,
    /// 1/2 to output `i`, the rest spread evenly over the other outputs.
    QuasiDiagonal,
}

impl TrafficModel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::Diagonal => "diagonal",
            Self::LogDiagonal => "log-diagonal",
            Self::QuasiDiagonal => "quasi-diagonal",
        }
    }

    /// Draw a destination for a unit arriving at `input`.
    pub fn destination<R: Rng>(&self, input: PortId, ports: usize, rng: &mut R) -> PortId {
        let n = ports as f64;
        match self {
            Self::Uniform => rng.gen_range(0..ports),
            Self::Diagonal => {
                let c = rng.gen_range(0..ports) as f64;
                if c < n * 2.0 / 3.0 { input } else { (input + 1) % ports }
            }
            Self::LogDiagonal => {
                let c = rng.gen_range(0..ports) as f64;
                let offset = LOG_DIAGONAL_CDF
                    .iter()
                    .position(|&share| c < share * n)
                    .unwrap_or(LOG_DIAGONAL_CDF.len());
                (input + offset) % ports
            }
            Self::QuasiDiagonal => {
                if ports == 1 {
                    return input;
                }
                let others = ports - 1;
                let c = rng.gen_range(0..2 * others);
                if c < others { input } else { (input + 1 + c - others) % ports }
            }
        }
    }
}

const LOG_DIAGONAL_CDF: [f64; 5] = [0.5, 0.75, 0.875, 0.9375, 0.96875];

impl std::str::FromStr for TrafficModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "uniform" => Ok(Self::Uniform),
            "diagonal" => Ok(Self::Diagonal),
            "log-diagonal" => Ok(Self::LogDiagonal),
            "quasi-diagonal" => Ok(Self::QuasiDiagonal),
            other => Err(format!("unknown traffic model: {}", other)),
        }
    }
}

// ─── Injection ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Injection {
    Bernoulli,
    Burst { mean_burst: f64 },
}

#[derive(Debug, Clone, Copy, Default)]
struct BurstState {
    on: bool,
    destination: PortId,
}

// ─── Generator ───────────────────────────────────────────────────────────────

pub struct TrafficGenerator {
    rng: ChaCha8Rng,
    ports: usize,
    load: f64,
    model: TrafficModel,
    injection: Injection,
    /// On-to-off and off-to-on transition probabilities.
    p_end: f64,
    p_start: f64,
    bursts: Vec<BurstState>,
    pub generated: u64,
}

impl TrafficGenerator {
    pub fn new(seed: u64, ports: usize, load: f64, model: TrafficModel, injection: Injection) -> Self {
        let (p_end, p_start) = match injection {
            Injection::Bernoulli => (0.0, 0.0),
            Injection::Burst { mean_burst } => {
                let on_off_ratio = load / (1.0 - load);
                (1.0 / (1.0 + mean_burst), on_off_ratio / (on_off_ratio + mean_burst))
            }
        };
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            ports,
            load,
            model,
            injection,
            p_end,
            p_start,
            bursts: vec![BurstState::default(); ports],
            generated: 0,
        }
    }

    pub fn ports(&self) -> usize {
        self.ports
    }

    /// Arrivals for the next slot.
    pub fn next_slot(&mut self) -> ArrivalVector {
        let mut arrivals = vec![None; self.ports];
        for (input, slot) in arrivals.iter_mut().enumerate() {
            *slot = match self.injection {
                Injection::Bernoulli => {
                    if self.rng.gen::<f64>() < self.load {
                        Some(self.model.destination(input, self.ports, &mut self.rng))
                    } else {
                        None
                    }
                }
                Injection::Burst { .. } => self.step_burst(input),
            };
        }
        self.generated += arrivals.iter().filter(|a| a.is_some()).count() as u64;
        arrivals
    }

    /// Advance one input's on/off chain. Transitions repeat until the state
    /// holds, so a burst may end and a new one start within the same slot.
    fn step_burst(&mut self, input: PortId) -> Option<PortId> {
        loop {
            let was_on = self.bursts[input].on;
            if was_on {
                if self.rng.gen::<f64>() < self.p_end {
                    self.bursts[input].on = false;
                }
            } else if self.rng.gen::<f64>() < self.p_start {
                self.bursts[input] = BurstState {
                    on: true,
                    destination: self.model.destination(input, self.ports, &mut self.rng),
                };
            }
            if self.bursts[input].on == was_on {
                break;
            }
        }
        let state = self.bursts[input];
        state.on.then_some(state.destination)
    }
}

// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Crossbar Scheduling Simulation Suite - Metrics

use serde::{Deserialize, Serialize};

// ─── Scheduler Counters ──────────────────────────────────────────────────────

/// Ouroboros-table merge accounting. Also filled by the exact merge, where
/// every cycle counts as computed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleCounters {
    pub slots: u64,
    /// Slots in which no cycle was decided by the table.
    pub slots_all_computed: u64,
    /// Slots merged exactly because of exact-merge mixing.
    pub exact_slots: u64,
    pub cycles: u64,
    pub table_decided: u64,
    pub computed: u64,
    /// Table-decided cycles on which the exact rule would pick the candidate.
    pub wrong: u64,
    /// Table-flagged cycles computed anyway because an edge exceeded the bound.
    pub bound_fallbacks: u64,
    /// Backlog of the chosen side, summed over computed cycles.
    pub computed_weight: u64,
    /// Backlog of the kept previous side, summed over table-decided cycles.
    pub table_weight: u64,
    /// Backlog forgone on wrong decisions (`green - red`).
    pub wrong_weight: u64,
    /// Backlog of the chosen side over all cycles.
    pub total_weight: u64,
    pub ports: u64,
    pub ports_computed: u64,
    pub ports_wrong: u64,
}

impl CycleCounters {
    pub fn wrong_rate(&self) -> f64 {
        if self.table_decided == 0 { 0.0 } else { self.wrong as f64 / self.table_decided as f64 }
    }

    pub fn computed_fraction(&self) -> f64 {
        if self.cycles == 0 { 0.0 } else { self.computed as f64 / self.cycles as f64 }
    }
}

/// Broadcast-round accounting for the exact merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastCounters {
    pub slots: u64,
    pub rounds: u64,
    pub slots_with_rounds: u64,
    pub cycles_with_rounds: u64,
}

impl BroadcastCounters {
    pub fn mean_rounds_per_slot(&self) -> f64 {
        if self.slots == 0 { 0.0 } else { self.rounds as f64 / self.slots as f64 }
    }
}

/// Message accounting for the distributed knowledge-discovery emulation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeCounters {
    pub slots: u64,
    pub cycles: u64,
    /// Rounds in which some port was still doubling.
    pub discovery_rounds: u64,
    /// Doubling requests actually sent. Settled ports stop sending.
    pub messages: u64,
    /// History records fetched by leaders during reconstruction.
    pub reconstruction_hops: u64,
}

/// Cycle count per length, index `length - 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthHistogram {
    counts: Vec<u64>,
}

impl LengthHistogram {
    pub fn new(ports: usize) -> Self {
        Self { counts: vec![0; ports] }
    }

    pub fn record(&mut self, length: usize) {
        assert!(
            length >= 1 && length <= self.counts.len(),
            "invariant violated: cycle length {} outside 1..={}",
            length, self.counts.len()
        );
        self.counts[length - 1] += 1;
    }

    pub fn count(&self, length: usize) -> u64 {
        self.counts.get(length.wrapping_sub(1)).copied().unwrap_or(0)
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    fn clear(&mut self) {
        self.counts.iter_mut().for_each(|c| *c = 0);
    }
}

/// Every counter a scheduler keeps, behind one value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerMetrics {
    pub cycles: CycleCounters,
    pub broadcast: BroadcastCounters,
    pub knowledge: KnowledgeCounters,
    pub lengths: LengthHistogram,
}

impl SchedulerMetrics {
    pub fn new(ports: usize) -> Self {
        Self { lengths: LengthHistogram::new(ports), ..Default::default() }
    }

    pub fn reset(&mut self) {
        self.cycles = CycleCounters::default();
        self.broadcast = BroadcastCounters::default();
        self.knowledge = KnowledgeCounters::default();
        self.lengths.clear();
    }
}

// ─── Delay Histogram ─────────────────────────────────────────────────────────

/// Exact histogram of per-unit queueing delays, in slots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DelayHistogram {
    counts: Vec<u64>,
    count: u64,
    sum: u64,
    max: u64,
}

impl DelayHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, delay: u64) {
        let bucket = delay as usize;
        if bucket >= self.counts.len() {
            self.counts.resize(bucket + 1, 0);
        }
        self.counts[bucket] += 1;
        self.count += 1;
        self.sum += delay;
        self.max = self.max.max(delay);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.sum as f64 / self.count as f64 }
    }

    /// Smallest delay `d` such that at least `q` of the samples are `<= d`.
    /// `q` is a fraction in `[0, 1]`. Returns 0 when empty.
    pub fn percentile(&self, q: f64) -> u64 {
        if self.count == 0 {
            return 0;
        }
        let target = ((q.clamp(0.0, 1.0) * self.count as f64).ceil() as u64).max(1);
        let mut seen = 0;
        for (delay, &n) in self.counts.iter().enumerate() {
            seen += n;
            if seen >= target {
                return delay as u64;
            }
        }
        self.max
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// ─── Switch Metrics ──────────────────────────────────────────────────────────

/// Cumulative driver-level statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwitchMetrics {
    pub slots: u64,
    pub arrivals: u64,
    pub departures: u64,
    pub delays: DelayHistogram,
    pub schedule_weight_sum: u64,
    pub effective_size_sum: u64,
}

impl SwitchMetrics {
    pub fn throughput(&self) -> f64 {
        if self.arrivals == 0 { 0.0 } else { self.departures as f64 / self.arrivals as f64 }
    }

    pub fn mean_schedule_weight(&self) -> f64 {
        if self.slots == 0 { 0.0 } else { self.schedule_weight_sum as f64 / self.slots as f64 }
    }

    pub fn mean_effective_size(&self) -> f64 {
        if self.slots == 0 { 0.0 } else { self.effective_size_sum as f64 / self.slots as f64 }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentiles_follow_distribution() {
        let mut h = DelayHistogram::new();
        for d in 0..100 {
            h.record(d);
        }
        assert_eq!(h.percentile(0.90), 89);
        assert_eq!(h.percentile(0.99), 98);
        assert_eq!(h.percentile(1.0), 99);
        assert_eq!(h.max(), 99);
        assert!((h.mean() - 49.5).abs() < 1e-9);
    }

    #[test]
    fn empty_histogram_is_zero() {
        let h = DelayHistogram::new();
        assert_eq!(h.percentile(0.95), 0);
        assert_eq!(h.mean(), 0.0);
    }

    #[test]
    fn length_histogram_bounds() {
        let mut h = LengthHistogram::new(4);
        h.record(1);
        h.record(4);
        h.record(4);
        assert_eq!(h.count(4), 2);
        assert_eq!(h.count(0), 0);
        assert_eq!(h.total(), 3);
    }

    #[test]
    #[should_panic(expected = "cycle length")]
    fn length_histogram_rejects_oversized_cycle() {
        LengthHistogram::new(2).record(3);
    }

    #[test]
    fn scheduler_metrics_reset_keeps_shape() {
        let mut m = SchedulerMetrics::new(3);
        m.cycles.cycles = 7;
        m.lengths.record(2);
        m.reset();
        assert_eq!(m, SchedulerMetrics::new(3));
    }

    #[test]
    fn throughput_without_arrivals_is_zero() {
        assert_eq!(SwitchMetrics::default().throughput(), 0.0);
    }
}

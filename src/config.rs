// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Crossbar Scheduling Simulation Suite - Configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::tables::TableError;
use crate::traffic::{Injection, TrafficModel};

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("switch must have at least one port")]
    NoPorts,

    #[error("load {0} outside [0, 1]")]
    Load(f64),

    #[error("bursty injection needs load below 1, got {0}")]
    BurstLoad(f64),

    #[error("mean burst length must be positive, got {0}")]
    BurstLength(f64),

    #[error("exact-merge frequency must be at least 1")]
    Frequency,

    #[error("{kind:?} scheduler does not use option {option}")]
    UnusedOption { kind: SchedulerKind, option: &'static str },

    #[error(transparent)]
    Table(#[from] TableError),
}

// ─── Scheduler ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerKind {
    /// Exact cycle-weight merge.
    Exact,
    /// Ouroboros-table merge, optionally bounded and mixed with exact slots.
    Ouroboros,
    /// Exact merge with broadcast-round accounting.
    Broadcast,
    /// Distributed knowledge-discovery emulation.
    Knowledge,
}

impl SchedulerKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Ouroboros => "ouroboros",
            Self::Broadcast => "broadcast",
            Self::Knowledge => "knowledge",
        }
    }
}

impl std::str::FromStr for SchedulerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "ouroboros" | "conservative" => Ok(Self::Ouroboros),
            "broadcast" => Ok(Self::Broadcast),
            "knowledge" | "distributed" => Ok(Self::Knowledge),
            other => Err(format!("unknown scheduler: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulerConfig {
    pub kind: SchedulerKind,
    /// Ouroboros flags file. Without it the power-of-two table is used.
    #[serde(default)]
    pub ouroboros_table: Option<PathBuf>,
    /// Broadcast-iteration file. Without it the doubling table is used.
    #[serde(default)]
    pub broadcast_table: Option<PathBuf>,
    /// Backlog above which a flagged cycle is computed anyway.
    #[serde(default)]
    pub bound: Option<u64>,
    /// Merge one slot in `frequency` exactly, at random.
    #[serde(default)]
    pub exact_frequency: Option<u32>,
    #[serde(default)]
    pub seed: u64,
}

impl SchedulerConfig {
    pub fn new(kind: SchedulerKind) -> Self {
        Self {
            kind,
            ouroboros_table: None,
            broadcast_table: None,
            bound: None,
            exact_frequency: None,
            seed: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.exact_frequency == Some(0) {
            return Err(ConfigError::Frequency);
        }
        if self.kind != SchedulerKind::Ouroboros {
            let unused = if self.ouroboros_table.is_some() {
                Some("ouroboros_table")
            } else if self.bound.is_some() {
                Some("bound")
            } else if self.exact_frequency.is_some() {
                Some("exact_frequency")
            } else {
                None
            };
            if let Some(option) = unused {
                return Err(ConfigError::UnusedOption { kind: self.kind, option });
            }
        }
        if self.kind != SchedulerKind::Broadcast && self.broadcast_table.is_some() {
            return Err(ConfigError::UnusedOption { kind: self.kind, option: "broadcast_table" });
        }
        Ok(())
    }
}

// ─── Simulation ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimConfig {
    pub ports: usize,
    pub load: f64,
    pub traffic: TrafficModel,
    pub injection: Injection,
    pub seed: u64,
    pub scheduler: SchedulerConfig,
    /// Keep per-unit arrival times for delay statistics. Throughput-only
    /// runs turn this off.
    #[serde(default = "default_track_delays")]
    pub track_delays: bool,
}

fn default_track_delays() -> bool {
    true
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ports: 16,
            load: 0.8,
            traffic: TrafficModel::Uniform,
            injection: Injection::Bernoulli,
            seed: 0,
            scheduler: SchedulerConfig::new(SchedulerKind::Exact),
            track_delays: true,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ports == 0 {
            return Err(ConfigError::NoPorts);
        }
        if !(0.0..=1.0).contains(&self.load) {
            return Err(ConfigError::Load(self.load));
        }
        if let Injection::Burst { mean_burst } = self.injection {
            if self.load >= 1.0 {
                return Err(ConfigError::BurstLoad(self.load));
            }
            if !(mean_burst > 0.0) {
                return Err(ConfigError::BurstLength(mean_burst));
            }
        }
        self.scheduler.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_load() {
        let cfg = SimConfig { load: 1.2, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::Load(_))));
    }

    #[test]
    fn bursts_need_load_below_one() {
        let cfg = SimConfig {
            load: 1.0,
            injection: Injection::Burst { mean_burst: 8.0 },
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::BurstLoad(_))));
    }

    #[test]
    fn options_must_match_kind() {
        let mut s = SchedulerConfig::new(SchedulerKind::Exact);
        s.bound = Some(10);
        assert!(matches!(s.validate(), Err(ConfigError::UnusedOption { option: "bound", .. })));
        s.kind = SchedulerKind::Ouroboros;
        assert!(s.validate().is_ok());
        s.exact_frequency = Some(0);
        assert!(matches!(s.validate(), Err(ConfigError::Frequency)));
    }

    #[test]
    fn deserializes_from_json() {
        let json = r#"{
            "ports": 8, "load": 0.5, "traffic": "log_diagonal",
            "injection": {"kind": "burst", "mean_burst": 16.0},
            "seed": 3,
            "scheduler": {"kind": "ouroboros", "bound": 32}
        }"#;
        let cfg: SimConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.traffic, TrafficModel::LogDiagonal);
        assert_eq!(cfg.scheduler.bound, Some(32));
        assert!(cfg.track_delays);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn scheduler_names_parse() {
        assert_eq!("conservative".parse::<SchedulerKind>(), Ok(SchedulerKind::Ouroboros));
        assert_eq!("knowledge".parse::<SchedulerKind>(), Ok(SchedulerKind::Knowledge));
    }
}

// Per-Slot JSONL Time Series Recorder
// Outputs one JSON line per slot for independent analysis

use serde::Serialize;
use crossbar_engine::SlotResult;
use std::io::Write;

#[derive(Debug, Serialize)]
pub struct SlotSnapshot {
    pub slot: u64,
    pub arrivals: u32,
    pub departures: u32,
    pub schedule_weight: u64,
    pub effective_size: u32,
    pub total_backlog: u64,
    pub cycles: u64,
}

impl SlotSnapshot {
    pub fn from_result(result: &SlotResult) -> Self {
        Self {
            slot: result.slot,
            arrivals: result.arrivals,
            departures: result.departures,
            schedule_weight: result.schedule_weight,
            effective_size: result.effective_size,
            total_backlog: result.total_backlog,
            cycles: result.cycles,
        }
    }
}

/// Time series recorder that accumulates snapshots and writes JSONL
pub struct TimeSeriesRecorder {
    snapshots: Vec<SlotSnapshot>,
}

impl TimeSeriesRecorder {
    pub fn new() -> Self {
        Self { snapshots: Vec::new() }
    }

    pub fn record(&mut self, result: &SlotResult) {
        self.snapshots.push(SlotSnapshot::from_result(result));
    }

    /// Write all snapshots to a JSONL file
    pub fn write_jsonl(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        for snapshot in &self.snapshots {
            let line = serde_json::to_string(snapshot)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }
}

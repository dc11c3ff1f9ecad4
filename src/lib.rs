// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Crossbar Scheduling Simulation Suite

pub mod types;
pub mod matching;
pub mod arrival;
pub mod cycles;
pub mod merge;
pub mod ouroboros;
pub mod broadcast;
pub mod knowledge;
pub mod scheduler;
pub mod tables;
pub mod metrics;
pub mod traffic;
pub mod config;
pub mod simulation;

pub use types::*;
pub use matching::{Matching, MatchingError, PartialMatching};
pub use config::{ConfigError, SchedulerConfig, SchedulerKind, SimConfig};
pub use scheduler::{build_scheduler, Scheduler};
pub use simulation::SwitchSimulation;
pub use traffic::{Injection, TrafficModel};

use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = log)]
    fn console_log(s: &str);
}

// ─── WASM Interface ──────────────────────────────────────────────────────────

#[wasm_bindgen]
impl SwitchSimulation {
    /// Takes a `SimConfig` object. Table paths are not readable from the
    /// browser, so wasm callers rely on the built-in tables.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<SwitchSimulation, JsValue> {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        let config: SimConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("invalid config: {}", e)))?;
        let sim = SwitchSimulation::from_config(config)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        console_log(&format!("switch simulation ready: {} ports, {} scheduler", sim.config.ports, sim.scheduler_name()));
        Ok(sim)
    }

    pub fn tick(&mut self) -> JsValue {
        let result = self.tick_core();
        serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
    }

    pub fn get_stats(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.stats()).unwrap_or(JsValue::NULL)
    }

    pub fn get_schedule(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.schedule.as_slice()).unwrap_or(JsValue::NULL)
    }

    pub fn get_backlog(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.backlog.to_rows()).unwrap_or(JsValue::NULL)
    }

    pub fn get_scheduler_metrics(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.scheduler.metrics()).unwrap_or(JsValue::NULL)
    }

    pub fn get_slot(&self) -> u64 {
        self.slot
    }

    /// Run N slots without returning results (fast batch mode for benchmarking)
    pub fn run_batch(&mut self, slots: u32) {
        for _ in 0..slots {
            self.tick_core();
        }
    }

    /// Reset simulation to initial state
    pub fn reset(&mut self) {
        self.reset_core();
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    fn js_config(ports: usize, kind: SchedulerKind) -> JsValue {
        let config = SimConfig {
            ports,
            load: 0.8,
            seed: 5,
            scheduler: SchedulerConfig::new(kind),
            ..Default::default()
        };
        serde_wasm_bindgen::to_value(&config).unwrap()
    }

    #[wasm_bindgen_test]
    fn tick_and_stats_cross_the_boundary() {
        let mut sim = SwitchSimulation::new(js_config(6, SchedulerKind::Knowledge)).unwrap();
        let slot: SlotResult = serde_wasm_bindgen::from_value(sim.tick()).unwrap();
        assert_eq!(slot.slot, 1);
        assert!(matching::is_permutation(&slot.schedule));

        sim.run_batch(49);
        assert_eq!(sim.get_slot(), 50);
        let stats: SimStats = serde_wasm_bindgen::from_value(sim.get_stats()).unwrap();
        assert_eq!(stats.slots, 50);
        assert_eq!(stats.total_arrivals, stats.total_departures + stats.total_backlog);

        sim.reset();
        assert_eq!(sim.get_slot(), 0);
    }

    #[wasm_bindgen_test]
    fn invalid_config_is_an_error() {
        assert!(SwitchSimulation::new(js_config(0, SchedulerKind::Exact)).is_err());
    }
}

#[cfg(test)]
mod tests {
    use crossbar_engine::*;

    fn sim(config: SimConfig) -> SwitchSimulation {
        SwitchSimulation::from_config(config).unwrap()
    }

    // ========== Driver Basics ==========

    #[test]
    fn test_initial_schedule_is_identity() {
        let s = sim(SimConfig { ports: 5, ..Default::default() });
        assert_eq!(s.current_schedule(), &Matching::identity(5));
        assert_eq!(s.slot(), 0);
    }

    #[test]
    fn test_every_slot_schedule_is_permutation() {
        let mut s = sim(SimConfig { ports: 12, load: 0.95, ..Default::default() });
        for _ in 0..300 {
            let r = s.tick_core();
            assert!(matching::is_permutation(&r.schedule), "slot {} schedule {:?}", r.slot, r.schedule);
        }
    }

    #[test]
    fn test_units_are_conserved() {
        for kind in [SchedulerKind::Exact, SchedulerKind::Ouroboros, SchedulerKind::Broadcast, SchedulerKind::Knowledge] {
            let mut s = sim(SimConfig {
                ports: 8,
                load: 0.8,
                scheduler: SchedulerConfig::new(kind),
                ..Default::default()
            });
            let stats = s.run(1000);
            assert_eq!(
                stats.total_arrivals,
                stats.total_departures + stats.total_backlog,
                "{:?} lost or invented units", kind
            );
        }
    }

    #[test]
    fn test_departures_never_exceed_ports() {
        let mut s = sim(SimConfig { ports: 6, load: 1.0, ..Default::default() });
        for _ in 0..200 {
            let r = s.tick_core();
            assert!(r.departures as usize <= 6);
            assert!(r.effective_size as usize <= 6);
            assert!(r.departures == r.effective_size, "every non-empty scheduled VOQ departs");
        }
    }

    // ========== Stability ==========

    #[test]
    fn test_exact_merge_is_stable_under_moderate_uniform_load() {
        let mut s = sim(SimConfig { ports: 16, load: 0.7, seed: 3, ..Default::default() });
        s.run(4000);
        let early = s.backlog().total();
        let stats = s.run(4000);
        assert!(stats.throughput > 0.97, "throughput {:.4}", stats.throughput);
        // Backlog should not keep growing once warmed up.
        assert!(stats.total_backlog < early + 200, "backlog grew from {} to {}", early, stats.total_backlog);
    }

    #[test]
    fn test_bursty_traffic_runs() {
        let mut s = sim(SimConfig {
            ports: 8,
            load: 0.6,
            injection: Injection::Burst { mean_burst: 8.0 },
            ..Default::default()
        });
        let stats = s.run(3000);
        assert!(stats.total_arrivals > 0);
        assert!(stats.p99_delay >= stats.p90_delay);
        assert!(stats.max_delay >= stats.p99_delay);
    }

    // ========== Variant Equivalence ==========

    #[test]
    fn test_exact_variants_produce_identical_runs() {
        let base = SimConfig { ports: 10, load: 0.9, seed: 21, traffic: TrafficModel::LogDiagonal, ..Default::default() };
        let mut exact = sim(base.clone());
        let mut bcast = sim(SimConfig { scheduler: SchedulerConfig::new(SchedulerKind::Broadcast), ..base.clone() });
        let mut know = sim(SimConfig { scheduler: SchedulerConfig::new(SchedulerKind::Knowledge), ..base });
        for _ in 0..500 {
            let a = exact.tick_core();
            let b = bcast.tick_core();
            let c = know.tick_core();
            assert_eq!(a.schedule, b.schedule, "slot {}", a.slot);
            assert_eq!(a.schedule, c.schedule, "slot {}", a.slot);
        }
        assert_eq!(exact.stats().mean_delay, know.stats().mean_delay);
        assert!(bcast.scheduler_metrics().broadcast.slots == 500);
        assert!(know.scheduler_metrics().knowledge.slots == 500);
    }

    #[test]
    fn test_empty_ouroboros_table_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ouroboros_6.txt");
        std::fs::write(&path, "0 0 0 0 0 0\n").unwrap();
        let mut cfg = SchedulerConfig::new(SchedulerKind::Ouroboros);
        cfg.ouroboros_table = Some(path);
        let base = SimConfig { ports: 6, load: 0.85, seed: 8, ..Default::default() };
        let mut exact = sim(base.clone());
        let mut ouro = sim(SimConfig { scheduler: cfg, ..base });
        for _ in 0..300 {
            assert_eq!(exact.tick_core().schedule, ouro.tick_core().schedule);
        }
        assert_eq!(ouro.scheduler_metrics().cycles.table_decided, 0);
    }

    #[test]
    fn test_ouroboros_counters_are_consistent() {
        let mut s = sim(SimConfig {
            ports: 16,
            load: 0.9,
            scheduler: SchedulerConfig::new(SchedulerKind::Ouroboros),
            ..Default::default()
        });
        s.run(1000);
        let c = &s.scheduler_metrics().cycles;
        assert_eq!(c.cycles, c.table_decided + c.computed);
        assert_eq!(c.ports, 16 * 1000);
        assert!(c.wrong <= c.table_decided);
        assert!(c.ports_computed + c.ports_wrong <= c.ports);
        assert_eq!(c.slots, 1000);
    }

    #[test]
    fn test_bounded_variant_falls_back() {
        let mut cfg = SchedulerConfig::new(SchedulerKind::Ouroboros);
        cfg.bound = Some(0);
        let mut s = sim(SimConfig { ports: 8, load: 0.95, scheduler: cfg, ..Default::default() });
        s.run(500);
        assert!(s.scheduler_metrics().cycles.bound_fallbacks > 0);
    }

    // ========== Reset ==========

    #[test]
    fn test_reset_clears_everything() {
        let mut s = sim(SimConfig {
            ports: 8,
            load: 0.9,
            scheduler: SchedulerConfig::new(SchedulerKind::Knowledge),
            ..Default::default()
        });
        s.run(100);
        s.reset_core();
        assert_eq!(s.backlog().total(), 0);
        assert_eq!(s.switch_metrics().arrivals, 0);
        assert_eq!(s.scheduler_metrics().knowledge.slots, 0);
        assert_eq!(s.current_schedule(), &Matching::identity(8));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = SwitchSimulation::from_config(SimConfig { ports: 0, ..Default::default() }).err().unwrap();
        assert!(matches!(err, ConfigError::NoPorts));
    }
}

use proptest::prelude::*;

use crossbar_engine::arrival::{complete, greedy_arrival_matching};
use crossbar_engine::broadcast::{broadcast_merge, BroadcastTable};
use crossbar_engine::cycles::CycleDecomposition;
use crossbar_engine::knowledge::knowledge_merge;
use crossbar_engine::matching::is_permutation;
use crossbar_engine::merge::merge;
use crossbar_engine::metrics::SchedulerMetrics;
use crossbar_engine::ouroboros::{ouroboros_merge, OuroborosTable};
use crossbar_engine::{Backlog, Matching, PartialMatching};

fn permutation(n: usize) -> impl Strategy<Value = Vec<usize>> {
    Just((0..n).collect::<Vec<usize>>()).prop_shuffle()
}

/// Two perfect matchings and a backlog on the same port count.
fn instance() -> impl Strategy<Value = (Matching, Matching, Backlog)> {
    (1usize..14)
        .prop_flat_map(|n| (permutation(n), permutation(n), prop::collection::vec(0u64..20, n * n)))
        .prop_map(|(p, c, cells)| {
            let n = p.len();
            let rows: Vec<Vec<u64>> = cells.chunks(n).map(|r| r.to_vec()).collect();
            (
                Matching::try_from_vec(p).unwrap(),
                Matching::try_from_vec(c).unwrap(),
                Backlog::from_rows(&rows),
            )
        })
}

fn weight(m: &Matching, q: &Backlog) -> u64 {
    m.as_slice().iter().enumerate().map(|(i, &k)| q[(i, k)]).sum()
}

proptest! {
    #[test]
    fn merge_is_a_permutation_of_both_sides((previous, candidate, q) in instance()) {
        let result = merge(&previous, &candidate, &q);
        prop_assert!(is_permutation(result.as_slice()));
        for i in 0..result.len() {
            let k = result.output_of(i);
            prop_assert!(k == previous.output_of(i) || k == candidate.output_of(i));
        }
    }

    #[test]
    fn merge_never_loses_weight((previous, candidate, q) in instance()) {
        let w = weight(&merge(&previous, &candidate, &q), &q);
        prop_assert!(w >= weight(&previous, &q));
        prop_assert!(w >= weight(&candidate, &q));
    }

    #[test]
    fn cycles_partition_the_ports((previous, candidate, q) in instance()) {
        let d = CycleDecomposition::new(&previous, &candidate, &q);
        let total: usize = d.cycles().iter().map(|c| c.length).sum();
        prop_assert_eq!(total, previous.len());
        for (index, cycle) in d.cycles().iter().enumerate() {
            let members = (0..previous.len()).filter(|&p| d.cycle_of(p) == index).count();
            prop_assert_eq!(members, cycle.length);
            prop_assert_eq!(d.cycle_of(cycle.leader), index);
            prop_assert!((0..previous.len()).filter(|&p| d.cycle_of(p) == index).all(|p| p >= cycle.leader));
        }
    }

    #[test]
    fn knowledge_protocol_agrees_with_exact((previous, candidate, q) in instance()) {
        let mut metrics = SchedulerMetrics::new(previous.len());
        let distributed = knowledge_merge(&previous, &candidate, &q, &mut metrics);
        prop_assert_eq!(distributed, merge(&previous, &candidate, &q));
        let d = CycleDecomposition::new(&previous, &candidate, &q);
        prop_assert_eq!(metrics.knowledge.cycles, d.len() as u64);
    }

    #[test]
    fn doubling_table_bounds_knowledge_hops((previous, candidate, q) in instance()) {
        let n = previous.len();
        let table = BroadcastTable::doubling(n);
        let mut bm = SchedulerMetrics::new(n);
        let mut km = SchedulerMetrics::new(n);
        let via_broadcast = broadcast_merge(&previous, &candidate, &q, &table, &mut bm);
        prop_assert_eq!(&via_broadcast, &merge(&previous, &candidate, &q));
        knowledge_merge(&previous, &candidate, &q, &mut km);
        prop_assert!(km.knowledge.reconstruction_hops <= bm.broadcast.rounds);
        let rounds = crossbar_engine::knowledge::discovery_rounds(n) as u64;
        prop_assert!(km.knowledge.messages <= n as u64 * rounds);
        prop_assert!(km.knowledge.discovery_rounds <= rounds);
    }

    #[test]
    fn ouroboros_shortfall_is_wrong_weight(
        (previous, candidate, q) in instance(),
        flags in prop::collection::vec(any::<bool>(), 14),
    ) {
        let n = previous.len();
        let table = OuroborosTable::from_flags(flags[..n].to_vec());
        let mut metrics = SchedulerMetrics::new(n);
        let approx = ouroboros_merge(&previous, &candidate, &q, &table, None, &mut metrics);
        prop_assert!(is_permutation(approx.as_slice()));
        let exact = weight(&merge(&previous, &candidate, &q), &q);
        prop_assert_eq!(exact - weight(&approx, &q), metrics.cycles.wrong_weight);
        prop_assert_eq!(weight(&approx, &q), metrics.cycles.total_weight);
    }

    #[test]
    fn completion_keeps_claims(
        (n, requests) in (1usize..14).prop_flat_map(|n| (Just(n), prop::collection::vec(prop::option::of(0..n), n))),
        cells in prop::collection::vec(0u64..5, 196),
    ) {
        let rows: Vec<Vec<u64>> = (0..n).map(|i| cells[i * 14..i * 14 + n].to_vec()).collect();
        let q = Backlog::from_rows(&rows);
        let partial: PartialMatching = greedy_arrival_matching(&requests, &q);
        let full = complete(&partial);
        prop_assert!(is_permutation(full.as_slice()));
        for i in 0..n {
            if let Some(k) = partial.output_of(i) {
                prop_assert_eq!(full.output_of(i), k);
                prop_assert_eq!(requests[i], Some(k));
            }
        }
        let claimed: Vec<usize> = partial.as_slice().iter().flatten().copied().collect();
        for i in (0..n).filter(|&i| partial.output_of(i).is_none()) {
            prop_assert!(!claimed.contains(&full.output_of(i)));
        }
    }

    #[test]
    fn equal_matchings_merge_to_themselves((previous, _candidate, q) in instance()) {
        let d = CycleDecomposition::new(&previous, &previous, &q);
        prop_assert_eq!(d.len(), previous.len());
        prop_assert_eq!(merge(&previous, &previous, &q), previous);
    }
}

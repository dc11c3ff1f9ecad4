// Copyright (c) 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Distributed knowledge-discovery merge.
//!
//! Emulates a protocol in which each input port only ever talks to one
//! partner per round, yet every cycle reaches the same decision as the exact
//! merge.
//!
//! # Discovery
//!
//! Port `i`'s successor on its cycle is `succ(i) = candidate⁻¹[previous[i]]`.
//! The port owns a red weight `backlog[i][previous[i]]` and a green weight
//! `backlog[succ(i)][previous[i]]`, so summing red (green) over a cycle
//! gives the backlog of its previous (candidate) side.
//!
//! Round 0 record: `{partner: succ(i), red, green, leader: i}`. In round
//! `r + 1` port `i` asks its round-`r` partner `p` for `p`'s round-`r` record
//! and combines: the partner becomes `p.partner`, the sums add up and the
//! leader is the smaller of the two. After round `r` a record summarises the
//! window of `2^r` consecutive ports starting at `i`. Running
//! `ceil(log2 N)` rounds makes every window at least as long as any cycle, so
//! every port learns the minimum id of its cycle: the leader.
//!
//! A port stops doubling as soon as its newest partner is a port it has
//! already seen at a smaller offset (itself at offset 0 included). The two
//! offsets then differ by a multiple of the cycle length, so the difference
//! of the two records is a whole number of cycle laps and already decides
//! the cycle. The condition depends only on the cycle length, so a whole
//! cycle settles in the same round and nobody asks a settled port for a
//! round it never ran. Only doubling steps actually taken count as messages.
//!
//! # Reconstruction
//!
//! Windows longer than the cycle wrap around and double-count, so the leader
//! rebuilds the exact sums from the retained history. If some round-`s`
//! record of the leader points back at itself, the cycle has length `2^s`
//! and that record is already exact. Otherwise the leader starts from its
//! own round-0 record and walks forward from its successor, taking the
//! largest stored window that does not contain the leader, until the walk
//! returns home. A window contains the leader exactly when its recorded
//! leader is the leader itself, so no extra information is needed. Each
//! window taken costs one message hop.

use crate::matching::Matching;
use crate::metrics::SchedulerMetrics;
use crate::types::{Backlog, PortId, Side, Weight};

/// What a port knows after some number of rounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KnowledgeRecord {
    pub partner: PortId,
    pub red: Weight,
    pub green: Weight,
    pub leader: PortId,
}

/// Per-port, per-round history in one flat buffer.
#[derive(Debug, Clone)]
pub struct KnowledgeArena {
    rounds: usize,
    records: Vec<KnowledgeRecord>,
    populated: Vec<usize>,
    settled: Vec<Option<Reconstruction>>,
    messages: u64,
    rounds_run: usize,
}

impl KnowledgeArena {
    /// Room for `rounds` records per port.
    pub fn new(ports: usize, rounds: usize) -> Self {
        Self {
            rounds,
            records: vec![KnowledgeRecord::default(); ports * rounds],
            populated: vec![0; ports],
            settled: vec![None; ports],
            messages: 0,
            rounds_run: 0,
        }
    }

    pub fn ports(&self) -> usize {
        self.populated.len()
    }

    /// Number of rounds recorded for `port`.
    pub fn known_rounds(&self, port: PortId) -> usize {
        self.populated[port]
    }

    pub fn get(&self, port: PortId, round: usize) -> Option<&KnowledgeRecord> {
        if round < self.populated[port] {
            Some(&self.records[port * self.rounds + round])
        } else {
            None
        }
    }

    /// Newest record of `port`. Its leader is the leader of the port's cycle
    /// once discovery has finished.
    pub fn latest(&self, port: PortId) -> Option<&KnowledgeRecord> {
        self.populated[port].checked_sub(1).and_then(|r| self.get(port, r))
    }

    /// Cycle laps a port settled on before running every round.
    pub fn settled(&self, port: PortId) -> Option<Reconstruction> {
        self.settled[port]
    }

    /// Doubling requests sent across all ports.
    pub fn messages(&self) -> u64 {
        self.messages
    }

    /// Rounds in which at least one port was still doubling.
    pub fn rounds_run(&self) -> usize {
        self.rounds_run
    }

    fn record(&self, port: PortId, round: usize) -> KnowledgeRecord {
        match self.get(port, round) {
            Some(k) => *k,
            None => panic!(
                "invariant violated: port {} has {} rounds of knowledge, round {} requested",
                port, self.populated[port], round
            ),
        }
    }

    fn push(&mut self, port: PortId, record: KnowledgeRecord) {
        let round = self.populated[port];
        assert!(round < self.rounds, "knowledge arena full for port {}", port);
        self.records[port * self.rounds + round] = record;
        self.populated[port] += 1;
    }
}

/// `ceil(log2 ports)`, the rounds after which every window covers its cycle.
pub fn discovery_rounds(ports: usize) -> usize {
    if ports <= 1 {
        0
    } else {
        (usize::BITS - (ports - 1).leading_zeros()) as usize
    }
}

/// Run the discovery phase. Each port holds rounds `0..=r` where `r` is the
/// round it settled in, at most `discovery_rounds(N)`.
pub fn discover(previous: &Matching, candidate: &Matching, backlog: &Backlog) -> KnowledgeArena {
    crate::cycles::check_shapes(previous, candidate, backlog);
    let ports = previous.len();
    let last_round = discovery_rounds(ports);
    let candidate_inv = candidate.inverse();
    let mut arena = KnowledgeArena::new(ports, last_round + 1);

    for i in 0..ports {
        let output = previous.output_of(i);
        let succ = candidate_inv[output];
        arena.push(i, KnowledgeRecord {
            partner: succ,
            red: backlog[(i, output)],
            green: backlog[(succ, output)],
            leader: i,
        });
    }

    for i in 0..ports {
        arena.settled[i] = settle(&arena, i);
    }

    for r in 0..last_round {
        let active: Vec<PortId> = (0..ports).filter(|&i| arena.settled[i].is_none()).collect();
        if active.is_empty() {
            break;
        }
        for &i in &active {
            let mine = arena.record(i, r);
            let theirs = arena.record(mine.partner, r);
            arena.push(i, KnowledgeRecord {
                partner: theirs.partner,
                red: mine.red + theirs.red,
                green: mine.green + theirs.green,
                leader: mine.leader.min(theirs.leader),
            });
            arena.messages += 1;
        }
        arena.rounds_run += 1;
        for &i in &active {
            arena.settled[i] = settle(&arena, i);
        }
    }
    arena
}

/// Whole laps of the cycle seen by `port`, if its newest partner repeats an
/// endpoint it already knows.
fn settle(arena: &KnowledgeArena, port: PortId) -> Option<Reconstruction> {
    let newest_round = arena.known_rounds(port) - 1;
    let newest = arena.record(port, newest_round);
    if newest.partner == port {
        return Some(Reconstruction { red: newest.red, green: newest.green, hops: 0 });
    }
    (0..newest_round)
        .map(|s| arena.record(port, s))
        .find(|k| k.partner == newest.partner)
        .map(|k| Reconstruction {
            red: newest.red - k.red,
            green: newest.green - k.green,
            hops: 0,
        })
}

/// Cycle sums as rebuilt by a leader, or a whole number of laps of them when
/// the cycle settled early. Either way `side` is the exact decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconstruction {
    pub red: Weight,
    pub green: Weight,
    pub hops: u64,
}

impl Reconstruction {
    pub fn side(&self) -> Side {
        if self.green > self.red { Side::Candidate } else { Side::Previous }
    }
}

/// Rebuild the sums of the cycle led by `leader`.
pub fn reconstruct(arena: &KnowledgeArena, leader: PortId) -> Reconstruction {
    let last_round = arena.known_rounds(leader) - 1;

    for s in 0..=last_round {
        let k = arena.record(leader, s);
        if k.partner == leader {
            return Reconstruction { red: k.red, green: k.green, hops: 0 };
        }
    }

    let own = arena.record(leader, 0);
    let mut sums = Reconstruction { red: own.red, green: own.green, hops: 0 };
    let mut cur = own.partner;
    for r in (0..=last_round).rev() {
        let k = arena.record(cur, r);
        if k.leader != leader {
            sums.red += k.red;
            sums.green += k.green;
            sums.hops += 1;
            cur = k.partner;
        }
    }
    assert_eq!(
        cur, leader,
        "invariant violated: reconstruction for leader {} stopped at port {}",
        leader, cur
    );
    sums
}

/// Merge through discovery, leader election and reconstruction.
pub fn knowledge_merge(
    previous: &Matching,
    candidate: &Matching,
    backlog: &Backlog,
    metrics: &mut SchedulerMetrics,
) -> Matching {
    let ports = previous.len();
    let arena = discover(previous, candidate, backlog);

    let leader_of: Vec<PortId> = (0..ports)
        .map(|i| match arena.latest(i) {
            Some(k) => k.leader,
            None => panic!("invariant violated: port {} has no knowledge after discovery", i),
        })
        .collect();
    let mut members = vec![0usize; ports];
    for &l in &leader_of {
        members[l] += 1;
    }

    let counters = &mut metrics.knowledge;
    counters.slots += 1;
    counters.discovery_rounds += arena.rounds_run() as u64;
    counters.messages += arena.messages();

    let mut decision = vec![Side::Previous; ports];
    for leader in (0..ports).filter(|&l| leader_of[l] == l) {
        let sums = match arena.settled(leader) {
            Some(laps) => laps,
            None => reconstruct(&arena, leader),
        };
        decision[leader] = sums.side();
        counters.cycles += 1;
        counters.reconstruction_hops += sums.hops;
        metrics.lengths.record(members[leader]);
    }

    let outputs = (0..ports)
        .map(|i| match decision[leader_of[i]] {
            Side::Previous => previous.output_of(i),
            Side::Candidate => candidate.output_of(i),
        })
        .collect();
    let result = Matching::from_assembled(outputs);
    debug_assert_eq!(
        result,
        crate::merge::merge(previous, candidate, backlog),
        "knowledge merge disagrees with exact merge"
    );
    result
}

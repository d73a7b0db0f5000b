//! End-to-end simulation scenarios.
//!
//! Each scenario runs a full four-core simulation over a fixed trace set and
//! asserts the exact counters implied by the cycle-accurate schedule:
//! snoop, per-core pass in ascending order, snoop, countdown. The reference
//! geometry is s=1, E=2, b=4 (two sets of 16-byte blocks), with 100-cycle
//! DRAM and an 8-cycle cache-to-cache block transfer.
//!
//! Coherence invariants are re-checked after every tick by the harness.

use mesi_core::cache::MesiState;
use mesi_core::stats::CoreStats;

use crate::common::{assert_coherent, r, run_checked, sim, w};

const CAP: u64 = 1_000_000;

/// Sums instructions, misses, and cycle counters for cross-core checks.
fn totals(cores: &[CoreStats]) -> (u64, u64) {
    let instructions = cores.iter().map(|c| c.total_instructions).sum();
    let misses = cores.iter().map(|c| c.cache_misses).sum();
    (instructions, misses)
}

/// Cold read miss with a single active core: one BusRd served by memory,
/// the line lands EXCLUSIVE, and the access costs memory latency plus one.
#[test]
fn cold_read_miss_single_core() {
    let mut s = sim(1, 2, 4, vec![vec![r(0x0)]]);
    run_checked(&mut s, CAP);

    let stats = &s.controller().cache(0).stats;
    assert_eq!(stats.total_instructions, 1);
    assert_eq!(stats.total_reads, 1);
    assert_eq!(stats.total_writes, 0);
    assert_eq!(stats.cache_misses, 1);
    assert_eq!(stats.total_cycles, 101);
    assert_eq!(stats.idle_cycles, 0);
    assert_eq!(stats.cache_evictions, 0);
    assert_eq!(stats.writebacks, 0);
    assert_eq!(stats.bus_invalidations, 0);
    assert_eq!(stats.data_traffic_bytes, 16);

    assert_eq!(s.controller().cache(0).line(0, 0).mesi, MesiState::Exclusive);
    assert_eq!(s.controller().bus_stats().transactions, 1);
    assert_eq!(s.controller().bus_stats().traffic_bytes, 16);
    assert_eq!(s.global_cycle(), 102);
}

/// Write hit on an EXCLUSIVE line: silent promotion to MODIFIED, no second
/// bus transaction.
#[test]
fn write_hit_promotes_exclusive_to_modified() {
    let mut s = sim(1, 2, 4, vec![vec![r(0x0), w(0x0)]]);
    run_checked(&mut s, CAP);

    let stats = &s.controller().cache(0).stats;
    assert_eq!(stats.total_instructions, 2);
    assert_eq!(stats.total_reads, 1);
    assert_eq!(stats.total_writes, 1);
    assert_eq!(stats.cache_misses, 1);
    assert_eq!(stats.total_cycles, 102);
    assert_eq!(stats.bus_invalidations, 0);

    assert_eq!(s.controller().cache(0).line(0, 0).mesi, MesiState::Modified);
    assert_eq!(s.controller().bus_stats().transactions, 1);
    assert_eq!(s.global_cycle(), 103);
}

/// Upgrade on SHARED: core 0 fetches, core 1 pulls the block cache-to-cache
/// while core 0's write waits, then the write completes as a BusUpgr that
/// invalidates core 1's fresh copy. Three transactions total, no block data
/// moved for the upgrade itself.
#[test]
fn busupgr_on_shared_line() {
    let mut s = sim(1, 2, 4, vec![vec![r(0x0), w(0x0)], vec![r(0x0)]]);
    run_checked(&mut s, CAP);

    let c0 = &s.controller().cache(0).stats;
    assert_eq!(c0.total_instructions, 2);
    assert_eq!(c0.total_reads, 1);
    assert_eq!(c0.total_writes, 1);
    assert_eq!(c0.cache_misses, 1);
    assert_eq!(c0.total_cycles, 102);
    // Core 0's write waits out core 1's 8-cycle transfer minus the shared
    // completion tick.
    assert_eq!(c0.idle_cycles, 7);
    assert_eq!(c0.bus_invalidations, 1);
    assert_eq!(c0.writebacks, 0);
    // Demand fill plus the cache-to-cache transfer it later sourced.
    assert_eq!(c0.data_traffic_bytes, 32);

    let c1 = &s.controller().cache(1).stats;
    assert_eq!(c1.total_instructions, 1);
    assert_eq!(c1.total_reads, 1);
    assert_eq!(c1.cache_misses, 1);
    assert_eq!(c1.total_cycles, 9);
    assert_eq!(c1.idle_cycles, 100);
    assert_eq!(c1.data_traffic_bytes, 16);

    assert_eq!(s.controller().cache(0).line(0, 0).mesi, MesiState::Modified);
    assert_eq!(
        s.controller().cache(1).line(0, 0).mesi,
        MesiState::Invalid,
        "the upgrade invalidated the other sharer"
    );

    let bus = s.controller().bus_stats();
    assert_eq!(bus.transactions, 3, "BusRd + BusRd + BusUpgr");
    assert_eq!(bus.traffic_bytes, 32, "the upgrade moved no data");
    assert_eq!(s.global_cycle(), 110);
}

/// BusRd against a MODIFIED owner: the responder supplies the block, both
/// copies end SHARED, and a chained intervention FLUSH writes the dirty
/// block back as a third bus transaction.
#[test]
fn busrd_intervention_with_writeback() {
    let mut s = sim(1, 2, 4, vec![vec![w(0x0)], vec![r(0x0)]]);
    run_checked(&mut s, CAP);

    let c0 = &s.controller().cache(0).stats;
    assert_eq!(c0.total_instructions, 1);
    assert_eq!(c0.total_writes, 1);
    assert_eq!(c0.cache_misses, 1);
    assert_eq!(c0.total_cycles, 101);
    assert_eq!(c0.idle_cycles, 0);
    assert_eq!(c0.writebacks, 1, "owner pays the intervention writeback");
    assert_eq!(c0.bus_invalidations, 1);
    // Demand fill + transfer sourced + writeback.
    assert_eq!(c0.data_traffic_bytes, 48);

    let c1 = &s.controller().cache(1).stats;
    assert_eq!(c1.total_instructions, 1);
    assert_eq!(c1.total_reads, 1);
    assert_eq!(c1.cache_misses, 1);
    assert_eq!(c1.total_cycles, 9);
    assert_eq!(c1.idle_cycles, 100);
    assert_eq!(c1.data_traffic_bytes, 16);

    assert_eq!(s.controller().cache(0).line(0, 0).mesi, MesiState::Shared);
    assert_eq!(s.controller().cache(1).line(0, 0).mesi, MesiState::Shared);

    let bus = s.controller().bus_stats();
    assert_eq!(bus.transactions, 3, "BusRdX + BusRd + intervention FLUSH");
    assert_eq!(bus.traffic_bytes, 48);
    assert_eq!(s.global_cycle(), 110);
}

/// BusRdX against a MODIFIED owner: the owner flushes, the initiator's
/// issue tick converts to idle, and the demand fetch reruns from memory.
#[test]
fn busrdx_intervention_converts_initiator_tick_to_idle() {
    let mut s = sim(1, 2, 4, vec![vec![w(0x0)], vec![w(0x0)]]);
    run_checked(&mut s, CAP);

    let c0 = &s.controller().cache(0).stats;
    assert_eq!(c0.total_instructions, 1);
    assert_eq!(c0.total_writes, 1);
    assert_eq!(c0.total_cycles, 101);
    assert_eq!(c0.idle_cycles, 0);
    assert_eq!(c0.writebacks, 1);
    assert_eq!(c0.bus_invalidations, 1);
    assert_eq!(c0.data_traffic_bytes, 32);

    let c1 = &s.controller().cache(1).stats;
    assert_eq!(c1.total_instructions, 1);
    assert_eq!(c1.total_writes, 1);
    assert_eq!(c1.total_cycles, 101);
    // 100 ticks behind core 0's fetch, 1 converted issue tick, 99 ticks
    // behind the intervention flush.
    assert_eq!(c1.idle_cycles, 200);
    assert_eq!(c1.bus_invalidations, 1);
    assert_eq!(c1.writebacks, 0);
    assert_eq!(c1.data_traffic_bytes, 16);

    assert_eq!(s.controller().cache(0).line(0, 0).mesi, MesiState::Invalid);
    assert_eq!(s.controller().cache(1).line(0, 0).mesi, MesiState::Modified);

    let bus = s.controller().bus_stats();
    assert_eq!(bus.transactions, 3, "BusRdX + BusRdX + intervention FLUSH");
    assert_eq!(bus.traffic_bytes, 48);
    assert_eq!(s.global_cycle(), 302);
}

/// Capacity eviction with writeback in a one-line cache: the second write
/// displaces a MODIFIED block, so its BusRdX is preceded by an eviction
/// FLUSH accounted as a third transaction.
#[test]
fn capacity_eviction_with_writeback() {
    let mut s = sim(0, 1, 4, vec![vec![w(0x00), w(0x40)]]);
    run_checked(&mut s, CAP);

    let stats = &s.controller().cache(0).stats;
    assert_eq!(stats.total_instructions, 2);
    assert_eq!(stats.total_writes, 2);
    assert_eq!(stats.cache_misses, 2);
    assert_eq!(stats.cache_evictions, 1);
    assert_eq!(stats.writebacks, 1);
    assert_eq!(stats.bus_invalidations, 2);
    // Issue + flush + fetch latency for the second write, on top of the
    // first write's fetch.
    assert_eq!(stats.total_cycles, 302);
    assert_eq!(stats.data_traffic_bytes, 48);

    let line = s.controller().cache(0).line(0, 0);
    assert_eq!(line.tag, 4);
    assert_eq!(line.mesi, MesiState::Modified);

    let bus = s.controller().bus_stats();
    assert_eq!(bus.transactions, 3, "BusRdX + eviction FLUSH + BusRdX");
    assert_eq!(bus.traffic_bytes, 48);
    assert_eq!(s.global_cycle(), 303);
}

/// Two cores miss distinct blocks in the same tick: one wins the bus, the
/// loser accrues idle cycles until the bus frees, then proceeds.
#[test]
fn contention_charges_idle_cycles() {
    let mut s = sim(1, 2, 4, vec![vec![r(0x0)], vec![r(0x40)]]);
    run_checked(&mut s, CAP);

    let c0 = &s.controller().cache(0).stats;
    assert_eq!(c0.total_instructions, 1);
    assert_eq!(c0.total_cycles, 101);
    assert_eq!(c0.idle_cycles, 0);

    let c1 = &s.controller().cache(1).stats;
    assert_eq!(c1.total_instructions, 1);
    assert_eq!(c1.total_cycles, 101);
    assert_eq!(c1.idle_cycles, 100, "one full DRAM fetch spent waiting");

    // Distinct blocks: both fills land EXCLUSIVE.
    assert_eq!(s.controller().cache(0).line(0, 0).mesi, MesiState::Exclusive);
    assert_eq!(s.controller().cache(1).line(0, 0).mesi, MesiState::Exclusive);
    assert_eq!(s.controller().cache(1).line(0, 0).tag, 2);

    let bus = s.controller().bus_stats();
    assert_eq!(bus.transactions, 2);
    assert_eq!(bus.traffic_bytes, 32);
    assert!(s.is_finished());
    assert_eq!(s.global_cycle(), 202);
}

/// Identical configuration and traces produce byte-identical reports.
#[test]
fn runs_are_deterministic() {
    let traces = vec![vec![r(0x0), w(0x0)], vec![r(0x0)]];

    let mut first = sim(1, 2, 4, traces.clone());
    first.run();
    let mut second = sim(1, 2, 4, traces);
    second.run();

    assert_eq!(
        first.report("app").render(),
        second.report("app").render()
    );
    assert_eq!(first.global_cycle(), second.global_cycle());
}

/// A contended mix of reads, writes, conflicts, and interventions across
/// all four cores stays coherent every tick and satisfies the global
/// accounting identities.
#[test]
fn mixed_workload_preserves_invariants() {
    let traces = vec![
        vec![w(0x00), r(0x40), w(0x40)],
        vec![r(0x00), w(0x00)],
        vec![r(0x00), r(0x40)],
        vec![w(0x40)],
    ];
    let lengths: Vec<usize> = traces.iter().map(Vec::len).collect();

    // One-line caches make every distinct block conflict.
    let mut s = sim(1, 1, 4, traces);
    run_checked(&mut s, CAP);
    assert_coherent(&s);

    let cores: Vec<CoreStats> = s
        .controller()
        .caches()
        .iter()
        .map(|c| c.stats.clone())
        .collect();

    // Every trace entry retired exactly once.
    for (core, stats) in cores.iter().enumerate() {
        assert_eq!(stats.total_instructions as usize, lengths[core]);
        assert_eq!(
            stats.total_instructions,
            stats.total_reads + stats.total_writes
        );
        assert_eq!(s.pc(core), lengths[core]);
    }

    // Misses cannot outnumber bus transactions, and the global clock bounds
    // every core's busy plus idle time.
    let (instructions, misses) = totals(&cores);
    assert_eq!(instructions, 8);
    assert!(misses <= s.controller().bus_stats().transactions);
    for stats in &cores {
        assert!(s.global_cycle() >= stats.total_cycles + stats.idle_cycles);
    }
}

/// Cores with empty traces retire immediately and contribute nothing.
#[test]
fn empty_traces_finish_immediately() {
    let mut s = sim(1, 2, 4, vec![]);
    run_checked(&mut s, CAP);

    assert!(s.is_finished());
    assert_eq!(s.global_cycle(), 1);
    for cache in s.controller().caches() {
        assert_eq!(cache.stats, CoreStats::default());
    }
    assert_eq!(s.controller().bus_stats().transactions, 0);
}

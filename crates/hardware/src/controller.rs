//! Coherence controller.
//!
//! The controller owns every core's L1 cache and drives the MESI protocol
//! over the shared bus. It has two entry points per tick:
//! 1. [`CacheController::process_access`] services one core's next memory
//!    reference: hits retire immediately, misses and shared-write upgrades
//!    contend for the bus, and blocked cores are charged a stall.
//! 2. [`CacheController::snoop`] advances the in-flight bus transaction:
//!    victim preparation, eviction writebacks, remote-cache downgrades and
//!    invalidations, cache-to-cache transfers, chained intervention
//!    writebacks, and memory-served fills.
//!
//! All caches are held by index in one owning vector; snoop logic addresses
//! remote caches through that vector rather than through references.

use log::debug;

use crate::bus::{Bus, BusRequest};
use crate::cache::{L1Cache, MesiState};
use crate::common::addr::Geometry;
use crate::config::Config;
use crate::stats::BusStats;

/// The coherence engine: per-core caches plus bus-level accounting.
pub struct CacheController {
    caches: Vec<L1Cache>,
    geometry: Geometry,
    num_cores: usize,
    block_bytes: u64,
    memory_cycles: u64,
    transfer_cycles: u64,
    bus_stats: BusStats,
}

impl CacheController {
    /// Creates a controller with one empty cache per core.
    pub fn new(config: &Config) -> Self {
        Self {
            caches: (0..config.system.num_cores)
                .map(|_| L1Cache::new(config))
                .collect(),
            geometry: config.geometry(),
            num_cores: config.system.num_cores,
            block_bytes: config.block_bytes(),
            memory_cycles: config.system.memory_cycles,
            transfer_cycles: config.transfer_cycles(),
            bus_stats: BusStats::default(),
        }
    }

    /// The cache belonging to `core`.
    pub fn cache(&self, core: usize) -> &L1Cache {
        &self.caches[core]
    }

    /// Mutable access to the cache belonging to `core`.
    pub fn cache_mut(&mut self, core: usize) -> &mut L1Cache {
        &mut self.caches[core]
    }

    /// All caches, in core order.
    pub fn caches(&self) -> &[L1Cache] {
        &self.caches
    }

    /// Aggregate bus statistics.
    pub fn bus_stats(&self) -> &BusStats {
        &self.bus_stats
    }

    /// Services one memory reference for `core_id`.
    ///
    /// Returns `true` when the access retired this tick (the caller advances
    /// the core's program counter), `false` when the core must retry: either
    /// it just issued a bus transaction whose completion it now waits on, or
    /// it stalled against a busy bus.
    pub fn process_access(&mut self, core_id: usize, addr: u32, is_write: bool, bus: &mut Bus) -> bool {
        let tag = self.geometry.tag(addr);
        let set_idx = self.geometry.set_index(addr);

        let hit = self.caches[core_id]
            .find(set_idx, tag)
            .filter(|&way| self.caches[core_id].line(set_idx, way).mesi != MesiState::Invalid);

        if let Some(way) = hit {
            if is_write {
                if self.caches[core_id].line(set_idx, way).mesi == MesiState::Shared {
                    if bus.available {
                        // The upgrade completes within this tick: the snoop
                        // pass invalidates the other sharers and releases the
                        // bus before the tick ends.
                        bus.acquire(core_id, addr, BusRequest::BusUpgr);
                        self.caches[core_id].stats.bus_invalidations += 1;
                        self.bus_stats.transactions += 1;
                        debug!("core {} BusUpgr {:#010x}", core_id, addr);
                    } else {
                        self.charge_stall(core_id, bus);
                        return false;
                    }
                }
                let cache = &mut self.caches[core_id];
                cache.set_mesi(set_idx, way, MesiState::Modified);
                cache.touch(set_idx, way);
                cache.stats.total_writes += 1;
            } else {
                let cache = &mut self.caches[core_id];
                cache.touch(set_idx, way);
                cache.stats.total_reads += 1;
            }
            let stats = &mut self.caches[core_id].stats;
            stats.total_instructions += 1;
            stats.total_cycles += 1;
            return true;
        }

        // Miss: contend for the bus. The block is not installed here; that
        // happens when the snoop logic completes the transaction.
        if !bus.available {
            self.charge_stall(core_id, bus);
            return false;
        }

        let request = if is_write {
            BusRequest::BusRdX
        } else {
            BusRequest::BusRd
        };
        bus.acquire(core_id, addr, request);
        bus.done = true;
        debug!("core {} {:?} {:#010x}", core_id, request, addr);

        let stats = &mut self.caches[core_id].stats;
        stats.total_cycles += 1;
        stats.cache_misses += 1;
        if is_write {
            stats.bus_invalidations += 1;
        }
        stats.data_traffic_bytes += self.block_bytes;
        self.bus_stats.transactions += 1;
        self.bus_stats.traffic_bytes += self.block_bytes;
        false
    }

    /// Charges one stall cycle: the in-flight initiator keeps accruing
    /// execution cycles, everyone else accrues idle cycles.
    fn charge_stall(&mut self, core_id: usize, bus: &Bus) {
        let stats = &mut self.caches[core_id].stats;
        if core_id == bus.src_core {
            stats.total_cycles += 1;
        } else {
            stats.idle_cycles += 1;
        }
    }

    /// Advances the in-flight bus transaction by one observation.
    ///
    /// Invoked before and after the per-core pass each tick; a no-op while
    /// the bus is free. The phase order is load-bearing: victim preparation,
    /// then an eviction writeback, then the snoop pass over remote caches,
    /// then same-tick upgrade completion, then the intervention writeback,
    /// then the memory-served fill.
    pub fn snoop(&mut self, bus: &mut Bus) {
        if bus.available {
            return;
        }

        let tag = self.geometry.tag(bus.addr);
        let set_idx = self.geometry.set_index(bus.addr);

        // Victim preparation: on the first snoop of a demand request the
        // source cache still holds the previous occupant of its victim slot.
        // Displace it here, before the fetch completes, so the fill below
        // always lands in an INVALID slot.
        if matches!(bus.request, BusRequest::BusRd | BusRequest::BusRdX) {
            let src = bus.src_core;
            let victim_way = self.caches[src].victim(set_idx);
            let victim = self.caches[src].line(set_idx, victim_way);
            if victim.mesi != MesiState::Invalid {
                // If exactly one other cache still holds the requested block
                // in SHARED, its copy is now the last one and becomes
                // EXCLUSIVE.
                let sharers: Vec<(usize, usize)> = (0..self.num_cores)
                    .filter(|&core| core != src)
                    .filter_map(|core| {
                        self.caches[core]
                            .find(set_idx, tag)
                            .filter(|&way| {
                                self.caches[core].line(set_idx, way).mesi == MesiState::Shared
                            })
                            .map(|way| (core, way))
                    })
                    .collect();
                if let [(core, way)] = sharers[..] {
                    self.caches[core].set_mesi(set_idx, way, MesiState::Exclusive);
                }

                if victim.mesi == MesiState::Modified {
                    bus.prev_request = bus.request;
                    bus.request = BusRequest::Flush;
                    bus.evict = true;
                    let stats = &mut self.caches[src].stats;
                    stats.writebacks += 1;
                    stats.data_traffic_bytes += self.block_bytes;
                    self.bus_stats.transactions += 1;
                    self.bus_stats.traffic_bytes += self.block_bytes;
                    debug!("core {} eviction writeback {:#010x}", src, bus.addr);
                }
                self.caches[src].set_mesi(set_idx, victim_way, MesiState::Invalid);
                self.caches[src].stats.cache_evictions += 1;
            }
        }

        // Eviction writeback phase: the dirty victim drains to memory before
        // the demand request proceeds.
        if bus.request == BusRequest::Flush && bus.evict {
            if bus.done {
                bus.cycles_remaining = self.memory_cycles;
                bus.responder = None;
                bus.done = false;
            }
            if bus.cycles_remaining == 0 {
                bus.request = bus.prev_request;
                bus.done = true;
            }
        }

        // Snoop pass: every non-source cache holding the block reacts to the
        // demand request.
        let mut cache_responded = false;
        for core in 0..self.num_cores {
            if core == bus.src_core {
                continue;
            }
            let Some(way) = self.caches[core].find(set_idx, tag) else {
                continue;
            };
            if self.caches[core].line(set_idx, way).mesi == MesiState::Invalid {
                continue;
            }

            match bus.request {
                BusRequest::BusRd => {
                    if bus.done {
                        // First observation: this cache supplies the block.
                        bus.cycles_remaining = self.transfer_cycles;
                        bus.responder = Some(core);
                        bus.done = false;
                        bus.prev_mesi = self.caches[core].line(set_idx, way).mesi;
                        self.caches[core].set_mesi(set_idx, way, MesiState::Shared);
                    }
                    if bus.responder == Some(core) && bus.cycles_remaining == 0 {
                        bus.available = true;
                        bus.done = true;
                        self.caches[core].touch(set_idx, way);
                        self.caches[core].stats.data_traffic_bytes += self.block_bytes;

                        let src = bus.src_core;
                        let slot = self.caches[src].victim(set_idx);
                        self.caches[src].install(set_idx, slot, tag, MesiState::Shared);
                        debug!("core {} filled {:#010x} from core {}", src, bus.addr, core);

                        if bus.prev_mesi == MesiState::Modified {
                            // Memory is stale; the responder flushes the
                            // block behind the completed transfer.
                            bus.prev_request = bus.request;
                            bus.src_core = core;
                            bus.request = BusRequest::Flush;
                            bus.available = false;
                            bus.evict = false;
                            let stats = &mut self.caches[core].stats;
                            stats.writebacks += 1;
                            stats.data_traffic_bytes += self.block_bytes;
                            self.bus_stats.transactions += 1;
                            self.bus_stats.traffic_bytes += self.block_bytes;
                            debug!("core {} intervention writeback {:#010x}", core, bus.addr);
                        }
                    }
                    cache_responded = true;
                }
                BusRequest::BusRdX => {
                    if self.caches[core].line(set_idx, way).mesi == MesiState::Modified {
                        bus.prev_core = bus.src_core;
                        bus.prev_request = bus.request;
                        bus.src_core = core;
                        bus.request = BusRequest::Flush;
                        bus.evict = false;

                        // The intervention consumes the initiator's tick:
                        // convert the execution cycle it was charged at issue
                        // into an idle cycle.
                        let initiator = &mut self.caches[bus.prev_core].stats;
                        assert!(
                            initiator.total_cycles > 0,
                            "intervention before the initiator was charged an execution cycle"
                        );
                        initiator.total_cycles -= 1;
                        initiator.idle_cycles += 1;

                        let owner = &mut self.caches[core].stats;
                        owner.writebacks += 1;
                        owner.data_traffic_bytes += self.block_bytes;
                        self.bus_stats.transactions += 1;
                        self.bus_stats.traffic_bytes += self.block_bytes;
                        debug!("core {} intervention writeback {:#010x}", core, bus.addr);
                    }
                    self.caches[core].set_mesi(set_idx, way, MesiState::Invalid);
                }
                BusRequest::BusUpgr => {
                    if self.caches[core].line(set_idx, way).mesi == MesiState::Shared {
                        self.caches[core].set_mesi(set_idx, way, MesiState::Invalid);
                    }
                }
                BusRequest::Flush => {}
            }
        }

        // An upgrade carries no data and completes in the tick it was issued.
        if bus.request == BusRequest::BusUpgr {
            bus.available = true;
        }

        // Intervention writeback draining to memory.
        if bus.request == BusRequest::Flush && !bus.evict {
            if bus.done {
                bus.cycles_remaining = self.memory_cycles;
                bus.responder = None;
                bus.done = false;
            }
            if bus.cycles_remaining == 0 {
                if bus.prev_request == BusRequest::BusRdX {
                    // The demand fetch still has to run; hand the bus back
                    // to the original initiator.
                    bus.src_core = bus.prev_core;
                    bus.request = bus.prev_request;
                    bus.done = true;
                } else {
                    bus.available = true;
                    bus.done = true;
                }
            }
        }

        // Demand fetch served by memory: BusRd with no cache responder, or
        // BusRdX (which always refetches after any intervention).
        if (bus.request == BusRequest::BusRd && !cache_responded)
            || bus.request == BusRequest::BusRdX
        {
            if bus.done {
                bus.cycles_remaining = self.memory_cycles;
                bus.responder = None;
                bus.done = false;
            }
            if bus.cycles_remaining == 0 {
                bus.available = true;
                bus.done = true;

                let src = bus.src_core;
                let slot = self.caches[src].victim(set_idx);
                let mesi = if bus.request == BusRequest::BusRdX {
                    MesiState::Modified
                } else {
                    MesiState::Exclusive
                };
                self.caches[src].install(set_idx, slot, tag, mesi);
                debug!("core {} filled {:#010x} from memory", src, bus.addr);
            }
        }
    }
}

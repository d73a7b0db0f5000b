//! Statistics collection and report rendering.
//!
//! This module tracks per-core and bus-level metrics for the simulator. It
//! provides:
//! 1. **Per-core counters:** Instructions, reads/writes, execution and idle
//!    cycles, misses, evictions, writebacks, invalidations, and data traffic.
//! 2. **Bus summary:** Total coherence transactions and bytes moved.
//! 3. **Reporting:** A human-readable report combining the configuration
//!    echo, every core's statistics block, and the bus summary.

use std::fmt::Write as _;
use std::io::{self, Write};

/// Per-core statistics accumulated by one L1 cache.
///
/// All counters are non-decreasing over a run, with one exception: servicing
/// a BusRdX that hits a remote MODIFIED copy converts the initiator's tick
/// from an execution cycle into an idle cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CoreStats {
    /// Memory references retired (reads + writes).
    pub total_instructions: u64,
    /// Read references retired.
    pub total_reads: u64,
    /// Write references retired.
    pub total_writes: u64,
    /// Cycles the core spent executing or waiting on its own bus transaction.
    pub total_cycles: u64,
    /// Cycles the core spent stalled on a bus owned by another core.
    pub idle_cycles: u64,
    /// Accesses that missed in the L1.
    pub cache_misses: u64,
    /// Valid lines displaced to make room for an incoming block.
    pub cache_evictions: u64,
    /// Dirty blocks written back to memory (eviction or intervention).
    pub writebacks: u64,
    /// Invalidation requests this core put on the bus (BusRdX and BusUpgr).
    pub bus_invalidations: u64,
    /// Bytes moved to or from this cache (fills, transfers, writebacks).
    pub data_traffic_bytes: u64,
}

impl CoreStats {
    /// Miss rate as a percentage of retired instructions; 0 when the core
    /// retired nothing.
    pub fn miss_rate(&self) -> f64 {
        if self.total_instructions == 0 {
            0.0
        } else {
            100.0 * self.cache_misses as f64 / self.total_instructions as f64
        }
    }
}

/// Aggregate bus-level statistics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BusStats {
    /// Distinct bus transactions (demand requests, upgrades, and flushes).
    pub transactions: u64,
    /// Total bytes moved across the bus.
    pub traffic_bytes: u64,
}

/// Final report for a completed run.
///
/// Rendering reproduces the simulator's canonical output layout: simulation
/// parameters, one statistics block per core, and the overall bus summary.
#[derive(Debug, Clone)]
pub struct Report {
    /// Trace file prefix the run was started with.
    pub trace_prefix: String,
    /// Set-index bits.
    pub set_bits: u32,
    /// Associativity.
    pub assoc: usize,
    /// Block-offset bits.
    pub block_bits: u32,
    /// Derived block size in bytes.
    pub block_bytes: u64,
    /// Derived set count.
    pub num_sets: usize,
    /// Derived per-core cache capacity in KB.
    pub cache_kb: u64,
    /// One statistics block per core, in core order.
    pub cores: Vec<CoreStats>,
    /// Overall bus summary.
    pub bus: BusStats,
}

impl Report {
    /// Renders the report to a string.
    pub fn render(&self) -> String {
        let mut out = String::new();

        // Infallible: writing to a String cannot fail.
        let _ = writeln!(out, "Simulation Parameters:");
        let _ = writeln!(out, "Trace Prefix: {}", self.trace_prefix);
        let _ = writeln!(out, "Set Index Bits: {}", self.set_bits);
        let _ = writeln!(out, "Associativity: {}", self.assoc);
        let _ = writeln!(out, "Block Bits: {}", self.block_bits);
        let _ = writeln!(out, "Block Size (Bytes): {}", self.block_bytes);
        let _ = writeln!(out, "Number of Sets: {}", self.num_sets);
        let _ = writeln!(out, "Cache Size (KB per core): {}", self.cache_kb);
        let _ = writeln!(out, "MESI Protocol: Enabled");
        let _ = writeln!(out, "Write Policy: Write-back, Write-allocate");
        let _ = writeln!(out, "Replacement Policy: LRU");
        let _ = writeln!(out, "Bus: Central snooping bus");
        let _ = writeln!(out);

        for (core, stats) in self.cores.iter().enumerate() {
            let _ = writeln!(out, "Core {} Statistics:", core);
            let _ = writeln!(out, "Total Instructions: {}", stats.total_instructions);
            let _ = writeln!(out, "Total Reads: {}", stats.total_reads);
            let _ = writeln!(out, "Total Writes: {}", stats.total_writes);
            let _ = writeln!(out, "Total Execution Cycles: {}", stats.total_cycles);
            let _ = writeln!(out, "Idle Cycles: {}", stats.idle_cycles);
            let _ = writeln!(out, "Cache Misses: {}", stats.cache_misses);
            let _ = writeln!(out, "Cache Miss Rate: {:.2}%", stats.miss_rate());
            let _ = writeln!(out, "Cache Evictions: {}", stats.cache_evictions);
            let _ = writeln!(out, "Writebacks: {}", stats.writebacks);
            let _ = writeln!(out, "Bus Invalidations: {}", stats.bus_invalidations);
            let _ = writeln!(out, "Data Traffic (Bytes): {}", stats.data_traffic_bytes);
            let _ = writeln!(out);
        }

        let _ = writeln!(out, "Overall Bus Summary:");
        let _ = writeln!(out, "Total Bus Transactions: {}", self.bus.transactions);
        let _ = writeln!(out, "Total Bus Traffic (Bytes): {}", self.bus.traffic_bytes);

        out
    }

    /// Writes the rendered report to `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.render().as_bytes())
    }
}

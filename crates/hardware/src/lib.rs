//! Shared-memory multiprocessor cache simulator library.
//!
//! This crate implements a cycle-driven simulator of a small multiprocessor
//! whose per-core L1 data caches are kept coherent by a central snooping bus
//! running the MESI protocol. It provides:
//! 1. **Caches:** Set-associative, write-back/write-allocate L1 caches with
//!    LRU replacement and per-line MESI state.
//! 2. **Bus:** A single-owner coherence channel serializing BusRd, BusRdX,
//!    BusUpgr, and Flush transactions, including multi-phase chaining for
//!    eviction and intervention writebacks.
//! 3. **Controller:** The coherence engine servicing per-core accesses,
//!    driving snoops and downstream MESI transitions, and accounting cycles
//!    and traffic.
//! 4. **Simulation:** Trace reading, the global tick loop, configuration, and
//!    statistics collection.

/// Common types (address geometry, errors).
pub mod common;
/// Simulator configuration (defaults, cache geometry, system parameters).
pub mod config;
/// Cache structures (MESI state, lines, sets, per-core L1).
pub mod cache;
/// Shared snooping bus state record and transaction types.
pub mod bus;
/// Coherence controller (per-core access servicing and snoop logic).
pub mod controller;
/// Trace reading and the cycle-driven simulation driver.
pub mod sim;
/// Statistics collection and report rendering.
pub mod stats;

/// Root configuration type; build with `Config::new` or deserialize from JSON.
pub use crate::config::Config;
/// Top-level driver; owns caches, bus, and per-core trace cursors.
pub use crate::sim::simulator::Simulator;
/// Final human-readable report assembled after a run.
pub use crate::stats::Report;

//! Shared snooping bus state.
//!
//! The bus is the single contended resource in the system: it carries at most
//! one coherence transaction at a time, and every other core stalls while it
//! is held. A transaction advances through up to three phases (an optional
//! eviction writeback, the demand transfer, and an optional intervention
//! writeback); the `prev_*` fields carry the saved demand request across a
//! chained FLUSH phase.

use crate::cache::MesiState;

/// Coherence transaction types carried by the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusRequest {
    /// Read a block for sharing (read miss).
    BusRd,
    /// Read a block with intent to modify (write miss).
    BusRdX,
    /// Upgrade a SHARED copy to MODIFIED (write hit on a shared line).
    BusUpgr,
    /// Write a dirty block back to memory (eviction or intervention).
    Flush,
}

/// The bus state record.
///
/// `done` latches the first observation of a phase: the snoop routine that
/// sees it set loads `cycles_remaining` exactly once and clears it. The
/// driver decrements `cycles_remaining` at the end of every tick, saturating
/// at zero.
#[derive(Clone, Debug)]
pub struct Bus {
    /// True iff no transaction is in flight.
    pub available: bool,
    /// Originator of the current transaction. During a cache-to-cache flush
    /// phase this becomes the responder, which is acting as the data source.
    pub src_core: usize,
    /// Full address of the block under transaction.
    pub addr: u32,
    /// Transaction type currently on the bus.
    pub request: BusRequest,
    /// Ticks left in the current sub-phase.
    pub cycles_remaining: u64,
    /// Cache selected to supply data; `None` means memory responds.
    pub responder: Option<usize>,
    /// Marks the first observation of a phase.
    pub done: bool,
    /// True when the current FLUSH is a victim-eviction writeback, false when
    /// it is an intervening cache-to-cache flush.
    pub evict: bool,
    /// Saved originator across a chained intervention flush.
    pub prev_core: usize,
    /// Saved demand request across a chained flush phase.
    pub prev_request: BusRequest,
    /// Responder's MESI state before it was downgraded for a transfer.
    pub prev_mesi: MesiState,
}

impl Default for Bus {
    fn default() -> Self {
        Self {
            available: true,
            src_core: 0,
            addr: 0,
            request: BusRequest::BusRd,
            cycles_remaining: 0,
            responder: None,
            done: true,
            evict: false,
            prev_core: 0,
            prev_request: BusRequest::BusRd,
            prev_mesi: MesiState::Invalid,
        }
    }
}

impl Bus {
    /// Claims the bus for a new transaction originated by `src_core`.
    pub fn acquire(&mut self, src_core: usize, addr: u32, request: BusRequest) {
        self.src_core = src_core;
        self.addr = addr;
        self.request = request;
        self.available = false;
    }

    /// End-of-tick countdown, saturating at zero.
    pub fn countdown(&mut self) {
        self.cycles_remaining = self.cycles_remaining.saturating_sub(1);
    }
}

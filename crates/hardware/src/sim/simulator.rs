//! The cycle-driven simulation driver.
//!
//! The simulator owns the controller, the bus, and every core's trace cursor,
//! and advances them in lockstep: each tick runs a pre-snoop, the per-core
//! access pass in ascending core order, a post-snoop, and the bus countdown.
//! The double snoop is load-bearing: the pre-snoop lets an initiator observe
//! completion in the tick it would otherwise stall, and the post-snoop lets
//! every other cache react to a transaction issued earlier in the same tick.

use crate::bus::Bus;
use crate::config::Config;
use crate::controller::CacheController;
use crate::sim::trace::{Op, TraceEntry};
use crate::stats::Report;

/// Top-level simulator: coherence engine, bus, and per-core trace state.
pub struct Simulator {
    controller: CacheController,
    bus: Bus,
    traces: Vec<Vec<TraceEntry>>,
    pc: Vec<usize>,
    core_done: Vec<bool>,
    active_cores: usize,
    global_cycle: u64,
    config: Config,
}

impl Simulator {
    /// Creates a simulator over one trace per core.
    ///
    /// Missing trailing traces are treated as empty; surplus traces beyond
    /// the configured core count are dropped.
    pub fn new(config: Config, mut traces: Vec<Vec<TraceEntry>>) -> Self {
        let num_cores = config.system.num_cores;
        traces.resize(num_cores, Vec::new());
        Self {
            controller: CacheController::new(&config),
            bus: Bus::default(),
            traces,
            pc: vec![0; num_cores],
            core_done: vec![false; num_cores],
            active_cores: num_cores,
            global_cycle: 0,
            config,
        }
    }

    /// Advances the simulation by one tick.
    pub fn tick(&mut self) {
        self.controller.snoop(&mut self.bus);

        for core in 0..self.config.system.num_cores {
            if self.core_done[core] {
                continue;
            }
            if self.pc[core] >= self.traces[core].len() {
                self.core_done[core] = true;
                self.active_cores -= 1;
                continue;
            }
            let entry = self.traces[core][self.pc[core]];
            let is_write = entry.op == Op::Write;
            if self.controller.process_access(core, entry.addr, is_write, &mut self.bus) {
                self.pc[core] += 1;
            }
        }

        self.controller.snoop(&mut self.bus);
        self.bus.countdown();
        self.global_cycle += 1;
    }

    /// Runs until every core has drained its trace.
    pub fn run(&mut self) {
        while self.active_cores > 0 {
            self.tick();
        }
    }

    /// True once every core has drained its trace.
    pub fn is_finished(&self) -> bool {
        self.active_cores == 0
    }

    /// Ticks elapsed since the start of the run.
    pub fn global_cycle(&self) -> u64 {
        self.global_cycle
    }

    /// The coherence engine, for state and statistics inspection.
    pub fn controller(&self) -> &CacheController {
        &self.controller
    }

    /// The bus state record.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// The active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Next trace index for `core`; equals the trace length once drained.
    pub fn pc(&self, core: usize) -> usize {
        self.pc[core]
    }

    /// Assembles the final report.
    pub fn report(&self, trace_prefix: &str) -> Report {
        Report {
            trace_prefix: trace_prefix.to_string(),
            set_bits: self.config.cache.set_bits,
            assoc: self.config.cache.assoc,
            block_bits: self.config.cache.block_bits,
            block_bytes: self.config.block_bytes(),
            num_sets: self.config.num_sets(),
            cache_kb: self.config.cache_bytes_per_core() / 1024,
            cores: self
                .controller
                .caches()
                .iter()
                .map(|cache| cache.stats.clone())
                .collect(),
            bus: self.controller.bus_stats().clone(),
        }
    }
}

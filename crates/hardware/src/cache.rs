//! Per-core L1 cache structures.
//!
//! Each core owns a private, set-associative, write-back/write-allocate L1
//! with LRU replacement and per-line MESI state. Lines carry only a tag and
//! metadata; block data bytes are not modeled. LRU timestamps come from a
//! cache-local monotonic clock and are comparable only within the same cache.

use crate::config::Config;
use crate::stats::CoreStats;

/// MESI coherence state of a cache line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MesiState {
    /// Line holds no valid block.
    #[default]
    Invalid,
    /// Sole clean copy; memory is up to date.
    Exclusive,
    /// Clean copy that may also live in other caches.
    Shared,
    /// Sole dirty copy; memory is stale.
    Modified,
}

/// One cache line: tag, MESI state, and LRU timestamp.
#[derive(Clone, Copy, Debug, Default)]
pub struct CacheLine {
    /// Tag bits of the cached block address.
    pub tag: u32,
    /// Coherence state.
    pub mesi: MesiState,
    /// Last-touch timestamp from the owning cache's LRU clock.
    pub lru: u64,
}

/// A fixed-size associative set of `E` lines.
#[derive(Clone, Debug)]
pub struct CacheSet {
    lines: Vec<CacheLine>,
}

impl CacheSet {
    fn new(assoc: usize) -> Self {
        Self {
            lines: vec![CacheLine::default(); assoc],
        }
    }

    /// Returns the way of the first line whose tag matches, regardless of
    /// MESI state. Callers classify a hit by additionally checking that the
    /// line is not INVALID.
    pub fn find(&self, tag: u32) -> Option<usize> {
        self.lines.iter().position(|line| line.tag == tag)
    }

    /// Selects the replacement victim: the first INVALID line if any exists,
    /// otherwise the line with the smallest LRU timestamp (ties broken by
    /// lowest way). Invalid-preference keeps cold fills from registering as
    /// evictions.
    pub fn victim(&self) -> usize {
        let mut min_lru = u64::MAX;
        let mut victim = 0;
        for (way, line) in self.lines.iter().enumerate() {
            if line.mesi == MesiState::Invalid {
                return way;
            }
            if line.lru < min_lru {
                min_lru = line.lru;
                victim = way;
            }
        }
        victim
    }

    /// Line at `way`.
    pub fn line(&self, way: usize) -> CacheLine {
        self.lines[way]
    }

    /// Number of ways in the set.
    pub fn assoc(&self) -> usize {
        self.lines.len()
    }
}

/// One core's private L1 cache: `2^s` sets plus the LRU clock and the
/// statistics accumulator for that core.
#[derive(Clone, Debug)]
pub struct L1Cache {
    sets: Vec<CacheSet>,
    lru_clock: u64,
    /// Counters accumulated on behalf of the owning core.
    pub stats: CoreStats,
}

impl L1Cache {
    /// Creates an empty cache sized by the configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            sets: vec![CacheSet::new(config.cache.assoc); config.num_sets()],
            lru_clock: 0,
            stats: CoreStats::default(),
        }
    }

    /// Number of sets.
    pub fn num_sets(&self) -> usize {
        self.sets.len()
    }

    /// The set at `set_idx`.
    pub fn set(&self, set_idx: usize) -> &CacheSet {
        &self.sets[set_idx]
    }

    /// Way of the first tag match in `set_idx`, regardless of MESI state.
    pub fn find(&self, set_idx: usize, tag: u32) -> Option<usize> {
        self.sets[set_idx].find(tag)
    }

    /// Replacement victim for `set_idx`.
    pub fn victim(&self, set_idx: usize) -> usize {
        self.sets[set_idx].victim()
    }

    /// Line at `(set_idx, way)`.
    pub fn line(&self, set_idx: usize, way: usize) -> CacheLine {
        self.sets[set_idx].lines[way]
    }

    /// Sets the MESI state of a line without touching its LRU timestamp.
    pub fn set_mesi(&mut self, set_idx: usize, way: usize, mesi: MesiState) {
        self.sets[set_idx].lines[way].mesi = mesi;
    }

    /// Stamps a line with the next LRU clock value. Called on every local
    /// hit and whenever the bus installs a block into this cache.
    pub fn touch(&mut self, set_idx: usize, way: usize) {
        self.lru_clock += 1;
        self.sets[set_idx].lines[way].lru = self.lru_clock;
    }

    /// Overwrites a line with a freshly fetched block and touches it.
    pub fn install(&mut self, set_idx: usize, way: usize, tag: u32, mesi: MesiState) {
        let line = &mut self.sets[set_idx].lines[way];
        line.tag = tag;
        line.mesi = mesi;
        self.touch(set_idx, way);
    }
}

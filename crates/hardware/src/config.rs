//! Configuration system for the multiprocessor cache simulator.
//!
//! This module defines the configuration structures used to parameterize a
//! simulation. It provides:
//! 1. **Defaults:** Baseline hardware constants (core count, DRAM latency,
//!    bus word width and per-word transfer time).
//! 2. **Structures:** Cache geometry (`s`, `E`, `b`) and system parameters.
//! 3. **Derived quantities:** Block size, set count, cache-to-cache transfer
//!    latency, and per-core cache capacity.
//!
//! Configuration is supplied programmatically (the CLI builds it from flags)
//! or deserialized from JSON; use `Config::default()` for a baseline.

use serde::Deserialize;

use crate::common::addr::Geometry;
use crate::common::error::SimError;

/// Default configuration constants for the simulator.
mod defaults {
    /// Number of processor cores sharing the bus.
    pub const NUM_CORES: usize = 4;

    /// DRAM access latency in cycles, paid by memory-served fetches and by
    /// writebacks of dirty blocks.
    pub const MEMORY_CYCLES: u64 = 100;

    /// Width of one bus transfer word in bytes.
    pub const BUS_WORD_BYTES: u64 = 4;

    /// Cycles to move one bus word between caches.
    pub const WORD_TRANSFER_CYCLES: u64 = 2;

    /// Default number of set-index bits (2^s sets).
    pub const SET_BITS: u32 = 4;

    /// Default associativity (cache lines per set).
    pub const ASSOC: usize = 2;

    /// Default number of block-offset bits (2^b-byte blocks).
    pub const BLOCK_BITS: u32 = 5;
}

/// Root configuration structure for a simulation run.
///
/// # Examples
///
/// Building a configuration from explicit geometry:
///
/// ```
/// use mesi_core::config::Config;
///
/// let config = Config::new(1, 2, 4);
/// assert_eq!(config.block_bytes(), 16);
/// assert_eq!(config.num_sets(), 2);
/// assert_eq!(config.transfer_cycles(), 8);
/// ```
///
/// Deserializing from JSON, with system parameters left at their defaults:
///
/// ```
/// use mesi_core::config::Config;
///
/// let json = r#"{ "cache": { "set_bits": 5, "assoc": 4, "block_bits": 6 } }"#;
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert_eq!(config.cache.assoc, 4);
/// assert_eq!(config.system.num_cores, 4);
/// assert_eq!(config.system.memory_cycles, 100);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Per-core L1 cache geometry.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Core count and memory timing.
    #[serde(default)]
    pub system: SystemConfig,
}

impl Config {
    /// Creates a configuration from explicit cache geometry, with system
    /// parameters at their defaults.
    pub fn new(set_bits: u32, assoc: usize, block_bits: u32) -> Self {
        Self {
            cache: CacheConfig {
                set_bits,
                assoc,
                block_bits,
            },
            system: SystemConfig::default(),
        }
    }

    /// Checks the configuration for values the simulator cannot operate on.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] when the associativity is zero, when the
    /// core count is zero, or when `set_bits + block_bits` leaves no tag bits
    /// in a 32-bit address.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.cache.assoc == 0 {
            return Err(SimError::Config("associativity must be at least 1".into()));
        }
        if self.system.num_cores == 0 {
            return Err(SimError::Config("core count must be at least 1".into()));
        }
        if self.cache.set_bits + self.cache.block_bits >= 32 {
            return Err(SimError::Config(format!(
                "set bits ({}) + block bits ({}) must leave tag bits in a 32-bit address",
                self.cache.set_bits, self.cache.block_bits
            )));
        }
        Ok(())
    }

    /// Address geometry implied by the cache configuration.
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.cache.set_bits, self.cache.block_bits)
    }

    /// Block size in bytes (`2^b`).
    pub fn block_bytes(&self) -> u64 {
        1 << self.cache.block_bits
    }

    /// Number of sets per cache (`2^s`).
    pub fn num_sets(&self) -> usize {
        1 << self.cache.set_bits
    }

    /// Cycles for a cache-to-cache block transfer over the bus: the block
    /// moves one 4-byte word every 2 cycles.
    pub fn transfer_cycles(&self) -> u64 {
        defaults::WORD_TRANSFER_CYCLES * self.block_bytes() / defaults::BUS_WORD_BYTES
    }

    /// Total capacity of one core's cache in bytes (`2^s * E * 2^b`).
    pub fn cache_bytes_per_core(&self) -> u64 {
        self.num_sets() as u64 * self.cache.assoc as u64 * self.block_bytes()
    }
}

/// Per-core L1 cache geometry.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Number of set-index bits (number of sets = 2^s).
    #[serde(default = "CacheConfig::default_set_bits")]
    pub set_bits: u32,

    /// Associativity (number of cache lines per set).
    #[serde(default = "CacheConfig::default_assoc")]
    pub assoc: usize,

    /// Number of block-offset bits (block size = 2^b bytes).
    #[serde(default = "CacheConfig::default_block_bits")]
    pub block_bits: u32,
}

impl CacheConfig {
    /// Returns the default number of set-index bits.
    fn default_set_bits() -> u32 {
        defaults::SET_BITS
    }

    /// Returns the default associativity.
    fn default_assoc() -> usize {
        defaults::ASSOC
    }

    /// Returns the default number of block-offset bits.
    fn default_block_bits() -> u32 {
        defaults::BLOCK_BITS
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            set_bits: defaults::SET_BITS,
            assoc: defaults::ASSOC,
            block_bits: defaults::BLOCK_BITS,
        }
    }
}

/// System-level parameters: core count and memory timing.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    /// Number of cores, each with a private L1 and its own trace.
    #[serde(default = "SystemConfig::default_num_cores")]
    pub num_cores: usize,

    /// DRAM access latency in cycles.
    #[serde(default = "SystemConfig::default_memory_cycles")]
    pub memory_cycles: u64,
}

impl SystemConfig {
    /// Returns the default core count.
    fn default_num_cores() -> usize {
        defaults::NUM_CORES
    }

    /// Returns the default DRAM latency in cycles.
    fn default_memory_cycles() -> u64 {
        defaults::MEMORY_CYCLES
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            num_cores: defaults::NUM_CORES,
            memory_cycles: defaults::MEMORY_CYCLES,
        }
    }
}

//! # Unit Tests
//!
//! Fine-grained tests for the individual simulator components, plus the
//! end-to-end scenario suite that pins down the cycle-accurate counters.

/// End-to-end multi-core scenarios with exact counter expectations.
pub mod scenarios;
/// Trace file parsing and per-core loading.
pub mod trace;

//! Simulator error definitions.
//!
//! The error surface is deliberately small: configuration problems detected
//! before a run starts, and I/O failures while emitting the report. Trace
//! file problems are not errors (an unreadable file is an empty trace, and
//! malformed lines are skipped), and simulation state transitions are total
//! functions, so nothing recoverable can go wrong mid-run.

use std::fmt;
use std::io;

/// Errors surfaced by the simulator library.
#[derive(Debug)]
pub enum SimError {
    /// The configuration is unusable (e.g. zero associativity, or a geometry
    /// that leaves no tag bits in a 32-bit address).
    Config(String),

    /// An I/O failure while writing the report.
    Io(io::Error),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Config(msg) => write!(f, "invalid configuration: {}", msg),
            SimError::Io(err) => write!(f, "i/o error: {}", err),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io(err) => Some(err),
            SimError::Config(_) => None,
        }
    }
}

impl From<io::Error> for SimError {
    fn from(err: io::Error) -> Self {
        SimError::Io(err)
    }
}

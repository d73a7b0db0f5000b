//! Common types shared across the simulator.

/// Address geometry: tag / set-index decomposition.
pub mod addr;
/// Simulator error type.
pub mod error;

pub use addr::Geometry;
pub use error::SimError;

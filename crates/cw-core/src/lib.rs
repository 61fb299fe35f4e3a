//! cw-core: shared types, IDs, errors, configuration, and the timer marker
//! model.
//!
//! This crate is the foundational dependency for all other cw-* crates,
//! providing typed asset identifiers, a unified error type, the marker
//! vocabulary used by the cue-trim pipeline, and application configuration.

pub mod config;
pub mod error;
pub mod ids;
pub mod markers;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::{AssetId, CartId, Category};
pub use markers::{MarkerName, TimerMarkerSet};

//! # cw-inventory
//!
//! Everything that speaks the automation server's vocabulary:
//!
//! - **[`MediaAssetRecord`]** -- the full asset record as the server sends it.
//! - **[`codec`]** -- the `<timer millis="N">Name</timer>` marker micro-format.
//! - **[`envelope`]** -- building request envelopes and parsing replies.
//! - **[`InventoryApi`]** -- the fetch/update seam used by the pipeline, with
//!   [`HttpInventoryClient`] as the reqwest-backed implementation.

pub mod client;
pub mod codec;
pub mod envelope;
pub mod record;

pub use client::{HttpInventoryClient, InventoryApi, UpdateResult};
pub use record::{DowHours, MediaAssetRecord, RawMetadataForm};

//! # cw-pipeline
//!
//! Orchestration of the cue-trim batch.
//!
//! This crate provides:
//!
//! - **[`CueTrimPlanner`]** -- decides whether an asset needs trimming and
//!   computes the shifted marker set.
//! - **[`MetadataUpdater`]** -- writes the shifted markers back into the full
//!   asset record and pushes it to the inventory server.
//! - **[`CueTrimJob`]** / **[`JobStage`]** -- per-asset state as it moves
//!   through the stages.
//! - **[`Confirmer`]** and **[`ProgressSender`]** -- the hooks used for
//!   dry-run gating and progress reporting.
//! - **[`CueTrimPipeline`]** -- runs a batch sequentially under a
//!   [`BatchPolicy`] and returns a [`BatchReport`].

pub mod context;
pub mod job;
pub mod pipeline;
pub mod planner;
pub mod policy;
pub mod updater;

// Re-export key types at the crate root.
pub use context::{AlwaysConfirm, Confirmer, DeclineAll, ProgressEvent, ProgressSender};
pub use job::{CueTrimJob, JobStage, SkipReason, Step};
pub use pipeline::{BatchAbort, BatchReport, CueTrimPipeline};
pub use planner::{CueTrimPlanner, TrimDecision};
pub use policy::BatchPolicy;
pub use updater::MetadataUpdater;

//! # cw-av
//!
//! Audio file handling and external tool management for the cue-trim
//! pipeline.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache the path to
//!   ffmpeg.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support for running external processes.
//! - **Workspace management** ([`TrimWorkspace`]) -- per-asset scratch
//!   directory, working copy of the source, and delivery into the import
//!   directory.
//! - **Transcoding** ([`Transcoder`], [`FfmpegTranscoder`]) -- stream-copy
//!   trim from a start offset.
//! - **Ingestion** ([`IngestWatcher`]) -- bounded, backed-off polling until
//!   the automation server has picked up a delivered file.
//! - **[`AudioTranscodeRunner`]** -- the copy, transcode, move and wait
//!   sequence, step by step or in one call.

pub mod command;
pub mod ingest;
pub mod runner;
pub mod tools;
pub mod transcode;
pub mod workspace;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use ingest::{FileConsumedProbe, IngestProbe, IngestWatcher};
pub use runner::AudioTranscodeRunner;
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
pub use transcode::{FfmpegTranscoder, Transcoder};
pub use workspace::TrimWorkspace;

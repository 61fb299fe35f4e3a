//! Per-asset job state.

use std::fmt;
use std::path::PathBuf;

use cw_core::{AssetId, TimerMarkerSet};

/// A unit of work inside a job. Used both to say where a job failed and which
/// side effect a confirmer declined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Fetch,
    Plan,
    Copy,
    Transcode,
    Import,
    Ingest,
    MetadataPush,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Fetch => "fetch",
            Step::Plan => "plan",
            Step::Copy => "copy",
            Step::Transcode => "transcode",
            Step::Import => "import",
            Step::Ingest => "ingest",
            Step::MetadataPush => "metadata push",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// `Start` is 0 or absent.
    NoCuePoint,
    /// A dry-run confirmer declined this side effect.
    Declined(Step),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoCuePoint => f.write_str("no cue point"),
            SkipReason::Declined(step) => write!(f, "{step} declined"),
        }
    }
}

/// Where a job is in its lifecycle.
///
/// `Fetched -> Planned -> (Skipped | Transcoding -> Reimported ->
/// MetadataPushed -> Completed)`, with `Failed` reachable from anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStage {
    Pending,
    Fetched,
    Planned,
    Skipped(SkipReason),
    Transcoding,
    Reimported,
    MetadataPushed,
    Completed,
    Failed { at: Step, reason: String },
}

impl JobStage {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStage::Skipped(_) | JobStage::Completed | JobStage::Failed { .. }
        )
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStage::Pending => f.write_str("pending"),
            JobStage::Fetched => f.write_str("fetched"),
            JobStage::Planned => f.write_str("planned"),
            JobStage::Skipped(reason) => write!(f, "skipped ({reason})"),
            JobStage::Transcoding => f.write_str("transcoding"),
            JobStage::Reimported => f.write_str("reimported"),
            JobStage::MetadataPushed => f.write_str("metadata pushed"),
            JobStage::Completed => f.write_str("completed"),
            JobStage::Failed { at, reason } => write!(f, "failed at {at}: {reason}"),
        }
    }
}

/// One asset's trip through the pipeline. Lives only for the batch.
#[derive(Debug, Clone)]
pub struct CueTrimJob {
    pub asset_id: AssetId,
    pub original_markers: Option<TimerMarkerSet>,
    pub cue_offset_ms: i64,
    pub adjusted_markers: Option<TimerMarkerSet>,
    pub source_path: Option<PathBuf>,
    pub temp_path: Option<PathBuf>,
    pub import_path: Option<PathBuf>,
    pub stage: JobStage,
}

impl CueTrimJob {
    pub fn new(asset_id: AssetId) -> Self {
        Self {
            asset_id,
            original_markers: None,
            cue_offset_ms: 0,
            adjusted_markers: None,
            source_path: None,
            temp_path: None,
            import_path: None,
            stage: JobStage::Pending,
        }
    }

    /// Move to `stage` and log the transition.
    pub fn advance(&mut self, stage: JobStage) {
        match &stage {
            JobStage::Failed { .. } => tracing::error!("{}: {}", self.asset_id, stage),
            JobStage::Skipped(SkipReason::Declined(_)) => {
                tracing::warn!("{}: {}", self.asset_id, stage)
            }
            _ => tracing::info!("{}: {}", self.asset_id, stage),
        }
        self.stage = stage;
    }

    pub fn is_completed(&self) -> bool {
        self.stage == JobStage::Completed
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.stage, JobStage::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.stage, JobStage::Failed { .. })
    }
}

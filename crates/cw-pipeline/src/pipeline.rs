//! Sequential batch driver: fetch, plan, trim, reimport, push, per asset.

use std::fmt;
use std::sync::Arc;

use cw_av::AudioTranscodeRunner;
use cw_core::config::{AudioConfig, PipelineConfig};
use cw_core::{AssetId, Error};
use cw_inventory::{InventoryApi, UpdateResult};

use crate::context::{Confirmer, ProgressEvent, ProgressSender};
use crate::job::{CueTrimJob, JobStage, SkipReason, Step};
use crate::planner::{CueTrimPlanner, TrimDecision};
use crate::policy::BatchPolicy;
use crate::updater::MetadataUpdater;

/// Why a batch stopped before its last asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchAbort {
    pub asset: AssetId,
    pub reason: String,
}

/// Result of running a batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Every job that was started, in batch order.
    pub outcomes: Vec<CueTrimJob>,
    /// Set when a failed metadata push stopped the batch.
    pub aborted: Option<BatchAbort>,
    /// Assets never started because the batch aborted.
    pub not_processed: Vec<AssetId>,
}

impl BatchReport {
    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|j| j.is_completed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|j| j.is_skipped()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|j| j.is_failed()).count()
    }

    /// The job for `asset`, if it was started.
    pub fn outcome(&self, asset: &AssetId) -> Option<&CueTrimJob> {
        self.outcomes.iter().find(|j| &j.asset_id == asset)
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} completed, {} skipped, {} failed",
            self.completed(),
            self.skipped(),
            self.failed()
        )?;
        if let Some(abort) = &self.aborted {
            write!(
                f,
                "; aborted at {} ({}), {} not processed",
                abort.asset,
                abort.reason,
                self.not_processed.len()
            )?;
        }
        Ok(())
    }
}

/// Whether the batch keeps going after a job.
enum Flow {
    Continue,
    Abort(BatchAbort),
}

pub struct CueTrimPipeline {
    inventory: Arc<dyn InventoryApi>,
    planner: CueTrimPlanner,
    runner: AudioTranscodeRunner,
    updater: MetadataUpdater,
    audio: AudioConfig,
    policy: BatchPolicy,
    /// Present only in dry-run mode.
    confirmer: Option<Arc<dyn Confirmer>>,
    progress: Arc<ProgressSender>,
}

impl CueTrimPipeline {
    pub fn new(
        inventory: Arc<dyn InventoryApi>,
        runner: AudioTranscodeRunner,
        audio: AudioConfig,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            updater: MetadataUpdater::new(inventory.clone()),
            inventory,
            planner: CueTrimPlanner::new(config.negative_markers),
            runner,
            audio,
            policy: BatchPolicy::from_config(config),
            confirmer: None,
            progress: Arc::new(ProgressSender::noop()),
        }
    }

    /// Builder: replace the batch policy. Dry-run mode is unaffected.
    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builder: run in dry-run mode, asking `confirmer` before every side
    /// effect.
    pub fn with_dry_run(mut self, confirmer: Arc<dyn Confirmer>) -> Self {
        self.confirmer = Some(confirmer);
        self
    }

    /// Builder: attach a progress sender.
    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Arc::new(progress);
        self
    }

    pub fn policy(&self) -> &BatchPolicy {
        &self.policy
    }

    pub fn is_dry_run(&self) -> bool {
        self.confirmer.is_some()
    }

    /// Process `assets` in order.
    pub async fn run(&self, assets: &[AssetId]) -> BatchReport {
        let mut report = BatchReport::default();
        tracing::info!(
            "Starting cue-trim batch of {} asset(s){}",
            assets.len(),
            if self.is_dry_run() { " (dry run)" } else { "" }
        );

        for (index, asset) in assets.iter().enumerate() {
            let mut job = CueTrimJob::new(asset.clone());
            let flow = self.process(&mut job, index, assets.len()).await;
            report.outcomes.push(job);

            if let Flow::Abort(abort) = flow {
                report.not_processed = assets[index + 1..].to_vec();
                tracing::error!(
                    "Batch aborted at {}: {}; {} asset(s) not processed",
                    abort.asset,
                    abort.reason,
                    report.not_processed.len()
                );
                report.aborted = Some(abort);
                break;
            }
        }

        tracing::info!("Batch finished: {}", report);
        report
    }

    fn advance(&self, job: &mut CueTrimJob, stage: JobStage, index: usize, total: usize) {
        job.advance(stage);
        self.progress.send(&ProgressEvent {
            index,
            total,
            asset: &job.asset_id,
            stage: &job.stage,
        });
    }

    fn fail(&self, job: &mut CueTrimJob, at: Step, err: &Error, index: usize, total: usize) {
        let stage = JobStage::Failed {
            at,
            reason: err.to_string(),
        };
        self.advance(job, stage, index, total);
    }

    /// Passes outside dry-run; otherwise defers to the confirmer.
    async fn gate(&self, asset: &AssetId, step: Step, detail: &str) -> bool {
        match &self.confirmer {
            Some(confirmer) => confirmer.confirm(asset, step, detail).await,
            None => true,
        }
    }

    async fn process(&self, job: &mut CueTrimJob, index: usize, total: usize) -> Flow {
        let asset = job.asset_id.clone();

        let record = match self.inventory.fetch(&asset).await {
            Ok(record) => record,
            Err(e) => {
                self.fail(job, Step::Fetch, &e, index, total);
                return Flow::Continue;
            }
        };
        let markers = record.markers();
        job.original_markers = Some(markers.clone());
        self.advance(job, JobStage::Fetched, index, total);

        let (cue_offset_ms, adjusted) = match self.planner.plan(&markers) {
            Ok(TrimDecision::Trim {
                cue_offset_ms,
                adjusted,
            }) => (cue_offset_ms, adjusted),
            Ok(TrimDecision::NoTrimNeeded) => {
                self.advance(job, JobStage::Planned, index, total);
                self.advance(job, JobStage::Skipped(SkipReason::NoCuePoint), index, total);
                return Flow::Continue;
            }
            Err(e) => {
                self.fail(job, Step::Plan, &e, index, total);
                return Flow::Continue;
            }
        };
        job.cue_offset_ms = cue_offset_ms;
        job.adjusted_markers = Some(adjusted.clone());
        self.advance(job, JobStage::Planned, index, total);
        tracing::debug!("{}: {} -> {}", asset, markers, adjusted);

        let source = asset.source_path(&self.audio.root);
        job.source_path = Some(source.clone());

        let detail = format!("trim {} ms from {}", cue_offset_ms, source.display());
        if !self.gate(&asset, Step::Transcode, &detail).await {
            self.advance(job, JobStage::Skipped(SkipReason::Declined(Step::Transcode)), index, total);
            return Flow::Continue;
        }

        let workspace = match self.runner.prepare(&asset, &source, &self.audio.temp_dir) {
            Ok(ws) => ws,
            Err(e) => {
                self.fail(job, Step::Copy, &e, index, total);
                return Flow::Continue;
            }
        };
        job.temp_path = Some(workspace.temp_dir().to_path_buf());
        self.advance(job, JobStage::Transcoding, index, total);

        if let Err(e) = self.runner.transcode(&asset, &workspace, cue_offset_ms).await {
            self.fail(job, Step::Transcode, &e, index, total);
            return Flow::Continue;
        }

        let detail = format!(
            "move {} into {}",
            asset.import_file_name(),
            self.audio.import_dir.display()
        );
        if !self.gate(&asset, Step::Import, &detail).await {
            tracing::info!("{}: trimmed output discarded", asset);
            self.advance(job, JobStage::Skipped(SkipReason::Declined(Step::Import)), index, total);
            return Flow::Continue;
        }

        let delivered = match self.runner.deliver(workspace, &self.audio.import_dir) {
            Ok(path) => path,
            Err(e) => {
                self.fail(job, Step::Import, &e, index, total);
                return Flow::Continue;
            }
        };
        job.import_path = Some(delivered.clone());

        if let Err(e) = self.runner.await_ingest(&delivered).await {
            self.fail(job, Step::Ingest, &e, index, total);
            return Flow::Continue;
        }
        self.advance(job, JobStage::Reimported, index, total);

        let detail = format!("update markers to {}", adjusted);
        if !self.gate(&asset, Step::MetadataPush, &detail).await {
            tracing::warn!(
                "{}: audio was already reimported; server markers are now stale",
                asset
            );
            self.advance(
                job,
                JobStage::Skipped(SkipReason::Declined(Step::MetadataPush)),
                index,
                total,
            );
            return Flow::Continue;
        }

        let (err, reason) = match self.updater.push(&asset, &record, &adjusted).await {
            Ok(UpdateResult::Success) => {
                self.advance(job, JobStage::MetadataPushed, index, total);
                self.advance(job, JobStage::Completed, index, total);
                return Flow::Continue;
            }
            Ok(UpdateResult::Rejected(reason)) => {
                let err = Error::MetadataRejected {
                    asset: asset.clone(),
                    reason: reason.clone(),
                };
                (err, reason)
            }
            Err(e) => {
                let reason = e.to_string();
                (e, reason)
            }
        };

        self.fail(job, Step::MetadataPush, &err, index, total);
        if err.is_batch_fatal() && self.policy.aborts_on_rejection() {
            return Flow::Abort(BatchAbort { asset, reason });
        }
        Flow::Continue
    }
}

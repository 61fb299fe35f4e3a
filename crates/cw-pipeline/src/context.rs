//! Hooks the pipeline calls out to while it runs: progress reporting and
//! dry-run confirmation.

use async_trait::async_trait;
use cw_core::AssetId;

use crate::job::{JobStage, Step};

/// A stage transition, as seen by a [`ProgressSender`].
#[derive(Debug, Clone, Copy)]
pub struct ProgressEvent<'a> {
    /// Zero-based position of the asset in the batch.
    pub index: usize,
    /// Number of assets in the batch.
    pub total: usize,
    pub asset: &'a AssetId,
    pub stage: &'a JobStage,
}

impl ProgressEvent<'_> {
    /// Share of the batch finished, counting this asset once it is terminal.
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            return 100.0;
        }
        let done = self.index + usize::from(self.stage.is_terminal());
        (done as f32 / self.total as f32) * 100.0
    }
}

/// Sender for reporting progress from within the pipeline.
pub struct ProgressSender {
    callback: Box<dyn Fn(&ProgressEvent<'_>) + Send + Sync>,
}

impl ProgressSender {
    pub fn new(callback: impl Fn(&ProgressEvent<'_>) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }

    /// A sender that discards all reports.
    pub fn noop() -> Self {
        Self {
            callback: Box::new(|_| {}),
        }
    }

    pub fn send(&self, event: &ProgressEvent<'_>) {
        (self.callback)(event);
    }
}

impl std::fmt::Debug for ProgressSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSender").finish_non_exhaustive()
    }
}

/// Asked before each side effect when the pipeline runs in dry-run mode.
#[async_trait]
pub trait Confirmer: Send + Sync {
    /// Whether `step` may go ahead for `asset`. `detail` describes what would
    /// happen.
    async fn confirm(&self, asset: &AssetId, step: Step, detail: &str) -> bool;
}

/// Approves everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

#[async_trait]
impl Confirmer for AlwaysConfirm {
    async fn confirm(&self, _asset: &AssetId, _step: Step, _detail: &str) -> bool {
        true
    }
}

/// Declines everything: a dry run that only reports what it would do.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclineAll;

#[async_trait]
impl Confirmer for DeclineAll {
    async fn confirm(&self, asset: &AssetId, step: Step, detail: &str) -> bool {
        tracing::info!("{}: would {}: {}", asset, step, detail);
        false
    }
}

//! Batch-level behaviour switches.

use cw_core::config::{PipelineConfig, RejectionPolicy};

/// How a batch reacts to failures.
///
/// Dry-run mode is not a policy switch: it comes with its confirmer through
/// `CueTrimPipeline::with_dry_run`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchPolicy {
    pub on_rejection: RejectionPolicy,
}

impl BatchPolicy {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            on_rejection: config.on_rejection,
        }
    }

    /// Builder: set the rejection policy.
    pub fn with_rejection(mut self, on_rejection: RejectionPolicy) -> Self {
        self.on_rejection = on_rejection;
        self
    }

    /// Whether a failed metadata push stops the rest of the batch.
    pub fn aborts_on_rejection(&self) -> bool {
        self.on_rejection == RejectionPolicy::Abort
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_aborts() {
        assert!(BatchPolicy::default().aborts_on_rejection());
    }

    #[test]
    fn from_config_and_builders() {
        let config = PipelineConfig {
            on_rejection: RejectionPolicy::Continue,
            ..Default::default()
        };
        let policy = BatchPolicy::from_config(&config);
        assert!(!policy.aborts_on_rejection());
        assert!(policy.with_rejection(RejectionPolicy::Abort).aborts_on_rejection());
    }
}

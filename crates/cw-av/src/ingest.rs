//! Waiting for the automation server to ingest a delivered file.
//!
//! The server polls its import directory and removes files once it has
//! registered them. [`IngestWatcher`] polls an [`IngestProbe`] with
//! exponential backoff until the probe reports completion or the timeout
//! runs out.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cw_core::config::IngestConfig;
use cw_core::Error;

/// Completion signal for one delivered file.
#[async_trait]
pub trait IngestProbe: Send + Sync {
    /// Whether the server has finished ingesting `delivered`.
    async fn is_ingested(&self, delivered: &Path) -> cw_core::Result<bool>;
}

/// Ingestion is complete once the file has left the import directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileConsumedProbe;

#[async_trait]
impl IngestProbe for FileConsumedProbe {
    async fn is_ingested(&self, delivered: &Path) -> cw_core::Result<bool> {
        Ok(!tokio::fs::try_exists(delivered).await?)
    }
}

/// Bounded poller over an [`IngestProbe`].
#[derive(Clone)]
pub struct IngestWatcher {
    probe: Arc<dyn IngestProbe>,
    timeout: Duration,
    initial_interval: Duration,
    max_interval: Duration,
}

impl IngestWatcher {
    pub fn new(
        probe: Arc<dyn IngestProbe>,
        timeout: Duration,
        initial_interval: Duration,
        max_interval: Duration,
    ) -> Self {
        Self {
            probe,
            timeout,
            initial_interval: initial_interval.max(Duration::from_millis(1)),
            max_interval: max_interval.max(initial_interval),
        }
    }

    /// Watcher using [`FileConsumedProbe`] and the configured timings.
    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(
            Arc::new(FileConsumedProbe),
            config.timeout(),
            config.poll_initial(),
            config.poll_max(),
        )
    }

    /// Poll until `delivered` is ingested, returning how long it took.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImportTimeout`] when the timeout elapses first, or the
    /// probe's own error if it fails.
    pub async fn wait(&self, delivered: &Path) -> cw_core::Result<Duration> {
        let started = Instant::now();
        let mut interval = self.initial_interval;
        let mut polls: u32 = 0;

        loop {
            polls += 1;
            if self.probe.is_ingested(delivered).await? {
                let waited = started.elapsed();
                tracing::debug!("{:?} ingested after {:?} ({} polls)", delivered, waited, polls);
                return Ok(waited);
            }

            let waited = started.elapsed();
            if waited >= self.timeout {
                return Err(Error::ImportTimeout {
                    path: delivered.to_path_buf(),
                    waited,
                });
            }

            tracing::trace!("{:?} not ingested yet; next poll in {:?}", delivered, interval);
            tokio::time::sleep(interval.min(self.timeout - waited)).await;
            interval = (interval * 2).min(self.max_interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(probe: Arc<dyn IngestProbe>, timeout_ms: u64) -> IngestWatcher {
        IngestWatcher::new(
            probe,
            Duration::from_millis(timeout_ms),
            Duration::from_millis(5),
            Duration::from_millis(20),
        )
    }

    struct AfterPolls {
        needed: u32,
        seen: AtomicU32,
    }

    #[async_trait]
    impl IngestProbe for AfterPolls {
        async fn is_ingested(&self, _delivered: &Path) -> cw_core::Result<bool> {
            Ok(self.seen.fetch_add(1, Ordering::SeqCst) + 1 >= self.needed)
        }
    }

    #[tokio::test]
    async fn returns_once_probe_confirms() {
        let probe = Arc::new(AfterPolls {
            needed: 3,
            seen: AtomicU32::new(0),
        });
        let watcher = fast(probe.clone(), 2_000);
        watcher.wait(Path::new("/import/MUS0012.wav")).await.unwrap();
        assert_eq!(probe.seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn times_out_when_never_ingested() {
        let probe = Arc::new(AfterPolls {
            needed: u32::MAX,
            seen: AtomicU32::new(0),
        });
        let watcher = fast(probe, 60);
        let started = Instant::now();
        let err = watcher.wait(Path::new("/import/MUS0012.wav")).await.unwrap_err();
        assert!(matches!(err, Error::ImportTimeout { .. }));
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn file_consumed_probe_sees_removal() {
        let dir = tempfile::tempdir().unwrap();
        let delivered = dir.path().join("MUS0012.wav");
        std::fs::write(&delivered, b"trimmed").unwrap();

        let consumer = {
            let delivered = delivered.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                tokio::fs::remove_file(&delivered).await.unwrap();
            })
        };

        let watcher = fast(Arc::new(FileConsumedProbe), 2_000);
        watcher.wait(&delivered).await.unwrap();
        consumer.await.unwrap();
    }

    #[tokio::test]
    async fn file_left_in_place_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let delivered = dir.path().join("MUS0012.wav");
        std::fs::write(&delivered, b"trimmed").unwrap();

        let watcher = fast(Arc::new(FileConsumedProbe), 40);
        assert!(matches!(
            watcher.wait(&delivered).await,
            Err(Error::ImportTimeout { .. })
        ));
    }
}

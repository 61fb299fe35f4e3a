//! The copy, transcode, move and wait sequence for one asset.
//!
//! [`AudioTranscodeRunner::run`] performs the whole sequence. The individual
//! steps are public so the pipeline can gate each side effect separately.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cw_core::{AssetId, Error};

use crate::ingest::IngestWatcher;
use crate::transcode::Transcoder;
use crate::workspace::TrimWorkspace;

pub struct AudioTranscodeRunner {
    transcoder: Arc<dyn Transcoder>,
    watcher: IngestWatcher,
}

impl AudioTranscodeRunner {
    pub fn new(transcoder: Arc<dyn Transcoder>, watcher: IngestWatcher) -> Self {
        Self {
            transcoder,
            watcher,
        }
    }

    /// Copy the source audio into a fresh workspace under `temp_dir`.
    pub fn prepare(
        &self,
        asset: &AssetId,
        source: &Path,
        temp_dir: &Path,
    ) -> cw_core::Result<TrimWorkspace> {
        TrimWorkspace::stage(asset, source, temp_dir)
    }

    /// Trim `cue_offset_ms` off the working copy into the workspace output.
    ///
    /// # Errors
    ///
    /// Any transcoder failure, or a missing output after a clean exit, is
    /// reported as [`Error::Transcode`].
    pub async fn transcode(
        &self,
        asset: &AssetId,
        workspace: &TrimWorkspace,
        cue_offset_ms: i64,
    ) -> cw_core::Result<()> {
        let output = workspace.output();
        self.transcoder
            .trim_start(workspace.input(), &output, cue_offset_ms)
            .await
            .map_err(|e| Error::transcode(asset, e.to_string()))?;

        if !output.exists() {
            return Err(Error::transcode(
                asset,
                format!("transcoder exited cleanly but wrote no {:?}", output),
            ));
        }

        Ok(())
    }

    /// Move the trimmed output into `import_dir`.
    pub fn deliver(&self, workspace: TrimWorkspace, import_dir: &Path) -> cw_core::Result<PathBuf> {
        workspace.deliver(import_dir)
    }

    /// Wait for the server to ingest a delivered file.
    ///
    /// On [`Error::ImportTimeout`] the file is withdrawn from the import
    /// directory, so a late pickup cannot pair trimmed audio with the old
    /// markers. A file that is already gone by then counts as ingested.
    pub async fn await_ingest(&self, delivered: &Path) -> cw_core::Result<()> {
        let err = match self.watcher.wait(delivered).await {
            Ok(_) => return Ok(()),
            Err(err @ Error::ImportTimeout { .. }) => err,
            Err(e) => return Err(e),
        };

        match tokio::fs::remove_file(delivered).await {
            Ok(()) => {
                tracing::warn!("Withdrew {:?} from the import directory: {}", delivered, err);
                Err(err)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("{:?} was picked up as the wait ran out", delivered);
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    "{:?} could not be withdrawn and is still in the import directory: {}",
                    delivered,
                    e
                );
                Err(err)
            }
        }
    }

    /// Run every step and return the path the file was delivered to.
    pub async fn run(
        &self,
        asset: &AssetId,
        source: &Path,
        cue_offset_ms: i64,
        temp_dir: &Path,
        import_dir: &Path,
    ) -> cw_core::Result<PathBuf> {
        let workspace = self.prepare(asset, source, temp_dir)?;
        self.transcode(asset, &workspace, cue_offset_ms).await?;
        let delivered = self.deliver(workspace, import_dir)?;
        self.await_ingest(&delivered).await?;
        Ok(delivered)
    }
}

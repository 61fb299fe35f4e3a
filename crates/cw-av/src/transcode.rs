//! Stream-copy trimming through an external transcoder.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Something that can drop the first `start_ms` milliseconds of an audio file
/// without re-encoding it.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Write `input` minus its first `start_ms` milliseconds to `output`.
    ///
    /// Must fail if the underlying process exits abnormally.
    async fn trim_start(&self, input: &Path, output: &Path, start_ms: i64) -> cw_core::Result<()>;
}

/// [`Transcoder`] backed by `ffmpeg -ss <secs> -i <in> -c copy <out>`.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: PathBuf,
    timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn new(program: PathBuf, timeout: Duration) -> Self {
        Self { program, timeout }
    }

    /// Use the ffmpeg found by the registry.
    pub fn from_registry(tools: &ToolRegistry) -> cw_core::Result<Self> {
        let ffmpeg = tools.require("ffmpeg")?;
        Ok(Self::new(ffmpeg.path.clone(), ffmpeg.timeout))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

/// Render a millisecond offset as the seconds value ffmpeg's `-ss` expects.
pub fn format_seconds(millis: i64) -> String {
    let sign = if millis < 0 { "-" } else { "" };
    let millis = millis.unsigned_abs();
    format!("{sign}{}.{:03}", millis / 1000, millis % 1000)
}

/// Arguments for a stream-copy trim. The seek comes before `-i` so ffmpeg
/// seeks the input rather than decoding and discarding.
pub fn trim_args(input: &Path, output: &Path, start_ms: i64) -> Vec<String> {
    vec![
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-ss".into(),
        format_seconds(start_ms),
        "-i".into(),
        input.to_string_lossy().to_string(),
        "-c".into(),
        "copy".into(),
        output.to_string_lossy().to_string(),
    ]
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn trim_start(&self, input: &Path, output: &Path, start_ms: i64) -> cw_core::Result<()> {
        let mut cmd = ToolCommand::new(self.program.clone());
        cmd.args(trim_args(input, output, start_ms));
        cmd.timeout(self.timeout);

        tracing::debug!("exec: {}", cmd.display());
        cmd.execute().await?;

        Ok(())
    }
}

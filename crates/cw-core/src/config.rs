//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from TOML and carries the
//! inventory connection, audio directory layout, ingestion polling, tool and
//! pipeline policy sections. Every section defaults sensibly so an empty file
//! parses; [`Config::validate`] reports what still needs filling in.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub inventory: InventoryConfig,
    pub audio: AudioConfig,
    pub ingest: IngestConfig,
    pub tools: ToolsConfig,
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.inventory.base_url.is_empty() {
            warnings.push("inventory.base_url is empty".into());
        }
        if self.inventory.client_id.is_empty() {
            warnings.push("inventory.client_id is empty".into());
        }
        if !self.inventory.api_path.starts_with('/') {
            warnings.push(format!(
                "inventory.api_path {:?} should start with '/'",
                self.inventory.api_path
            ));
        }

        if self.audio.temp_dir == self.audio.import_dir {
            warnings.push(
                "audio.temp_dir and audio.import_dir are the same directory; \
                 the server would ingest half-written files"
                    .into(),
            );
        }

        if self.ingest.poll_initial_ms == 0 {
            warnings.push("ingest.poll_initial_ms is 0; polling would spin".into());
        }
        if self.ingest.poll_max_ms < self.ingest.poll_initial_ms {
            warnings.push("ingest.poll_max_ms is smaller than ingest.poll_initial_ms".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Connection to the automation server's XML control API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Scheme, host and port, e.g. `http://automation:9000`.
    pub base_url: String,
    /// Fixed path every envelope is POSTed to.
    pub api_path: String,
    /// Client id sent in every request envelope.
    pub client_id: String,
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_path: "/api".into(),
            client_id: String::new(),
            timeout_secs: default_request_timeout(),
        }
    }
}

impl InventoryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Shared audio directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Root laid out as `<root>/<category>/SP<cartId>.wav`.
    pub root: PathBuf,
    /// Scratch space for copies and transcoder output.
    pub temp_dir: PathBuf,
    /// Directory the server watches for `<category><cartId>.wav` files.
    pub import_dir: PathBuf,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/mnt/audio"),
            temp_dir: std::env::temp_dir().join("cartwright"),
            import_dir: PathBuf::from("/mnt/import"),
        }
    }
}

/// Bounded polling for downstream ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub timeout_secs: u64,
    pub poll_initial_ms: u64,
    pub poll_max_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            poll_initial_ms: 500,
            poll_max_ms: 10_000,
        }
    }
}

impl IngestConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_initial(&self) -> Duration {
        Duration::from_millis(self.poll_initial_ms)
    }

    pub fn poll_max(&self) -> Duration {
        Duration::from_millis(self.poll_max_ms)
    }
}

/// Paths to external CLI tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    /// Maximum time a single transcoder run may take.
    pub transcode_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            transcode_timeout_secs: 600,
        }
    }
}

impl ToolsConfig {
    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.transcode_timeout_secs)
    }
}

/// Batch-level behaviour of the cue-trim pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub on_rejection: RejectionPolicy,
    pub negative_markers: NegativeMarkerPolicy,
}

/// What to do with the rest of a batch when the server rejects a metadata
/// update or the update exchange itself fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectionPolicy {
    /// Stop processing; remaining assets are reported as not processed.
    #[default]
    Abort,
    /// Record the rejection against the asset and keep going.
    Continue,
}

/// How the planner treats markers that end up before the new zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegativeMarkerPolicy {
    /// Emit negative offsets unchanged.
    #[default]
    Passthrough,
    /// Fail the plan with [`crate::Error::NegativeMarker`].
    Reject,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = Config::default();
        assert_eq!(cfg.inventory.api_path, "/api");
        assert_eq!(cfg.inventory.timeout_secs, 30);
        assert_eq!(cfg.ingest.timeout(), Duration::from_secs(300));
        assert_eq!(cfg.tools.transcode_timeout(), Duration::from_secs(600));
        assert_eq!(cfg.pipeline.on_rejection, RejectionPolicy::Abort);
        assert_eq!(
            cfg.pipeline.negative_markers,
            NegativeMarkerPolicy::Passthrough
        );
    }

    #[test]
    fn default_config_warns_about_connection() {
        let warnings = Config::default().validate();
        assert!(warnings.iter().any(|w| w.contains("base_url")));
        assert!(warnings.iter().any(|w| w.contains("client_id")));
    }

    #[test]
    fn complete_config_has_no_warnings() {
        let mut cfg = Config::default();
        cfg.inventory.base_url = "http://automation:9000".into();
        cfg.inventory.client_id = "cartwright".into();
        let warnings = cfg.validate();
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
    }

    #[test]
    fn same_temp_and_import_dir_warns() {
        let mut cfg = Config::default();
        cfg.audio.temp_dir = PathBuf::from("/mnt/import");
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("temp_dir")));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
            [inventory]
            base_url = "http://automation:9000"
            client_id = "ops"

            [pipeline]
            on_rejection = "continue"
            negative_markers = "reject"
        "#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.inventory.base_url, "http://automation:9000");
        assert_eq!(cfg.inventory.api_path, "/api");
        assert_eq!(cfg.pipeline.on_rejection, RejectionPolicy::Continue);
        assert_eq!(cfg.pipeline.negative_markers, NegativeMarkerPolicy::Reject);
    }

    #[test]
    fn parse_empty_toml_uses_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.ingest.poll_initial_ms, 500);
        assert_eq!(cfg.audio.root, PathBuf::from("/mnt/audio"));
    }
}

//! Unified error type for cartwright.
//!
//! All crates funnel their failures into [`Error`]. When a metadata push
//! fails, the pipeline uses [`Error::is_batch_fatal`] to decide whether the
//! failure stops the whole batch or only the current asset.

use std::path::PathBuf;
use std::time::Duration;

use crate::ids::AssetId;
use crate::markers::MarkerName;

/// Unified error type covering all failure modes in cartwright.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The inventory server returned a non-success status for a fetch, or
    /// could not be reached.
    #[error("Fetch failed for {asset}: {message}")]
    Fetch {
        /// Asset that was being fetched.
        asset: AssetId,
        /// Human-readable error description.
        message: String,
    },

    /// The external transcoder failed (non-zero exit, spawn failure, timeout).
    #[error("Transcode failed for {asset}: {message}")]
    Transcode {
        /// Asset whose audio was being trimmed.
        asset: AssetId,
        /// Human-readable error description.
        message: String,
    },

    /// Copying or moving an audio file failed.
    #[error("Copy failed for {}: {message}", path.display())]
    Copy {
        /// Path that could not be copied or moved.
        path: PathBuf,
        /// Human-readable error description.
        message: String,
    },

    /// The downstream server did not confirm ingestion in time.
    #[error("Import of {} not confirmed after {waited:?}", path.display())]
    ImportTimeout {
        /// File placed in the import directory.
        path: PathBuf,
        /// How long the watcher waited.
        waited: Duration,
    },

    /// The inventory server refused a metadata update.
    #[error("Metadata update rejected for {asset}: {reason}")]
    MetadataRejected {
        /// Asset whose update was refused.
        asset: AssetId,
        /// Rejection reason reported by the server.
        reason: String,
    },

    /// A recomputed marker offset fell below zero.
    #[error("Marker {marker} would become negative ({value} ms)")]
    NegativeMarker {
        /// The marker that went negative.
        marker: MarkerName,
        /// The computed offset.
        value: i64,
    },

    /// Input data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration is missing or malformed.
    #[error("Config error: {0}")]
    Config(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An external tool returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// An HTTP exchange with the inventory server failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// An XML envelope could not be parsed.
    #[error("XML error: {0}")]
    Xml(String),
}

impl Error {
    /// Whether this failure should stop the remaining batch under the
    /// abort-on-rejection policy.
    ///
    /// A refused update and a failed exchange with the server both mean the
    /// next asset's update would fail the same way.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(
            self,
            Error::MetadataRejected { .. } | Error::Http(_) | Error::Xml(_)
        )
    }

    /// Convenience constructor for [`Error::Fetch`].
    pub fn fetch(asset: &AssetId, message: impl Into<String>) -> Self {
        Error::Fetch {
            asset: asset.clone(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Transcode`].
    pub fn transcode(asset: &AssetId, message: impl Into<String>) -> Self {
        Error::Transcode {
            asset: asset.clone(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Copy`].
    pub fn copy(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Copy {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn asset() -> AssetId {
        "MUS/12".parse().unwrap()
    }

    #[test]
    fn fetch_display() {
        let err = Error::fetch(&asset(), "status Failure");
        assert_eq!(err.to_string(), "Fetch failed for MUS/0012: status Failure");
        assert!(!err.is_batch_fatal());
    }

    #[test]
    fn transcode_display() {
        let err = Error::transcode(&asset(), "exited with status 1");
        assert_eq!(
            err.to_string(),
            "Transcode failed for MUS/0012: exited with status 1"
        );
    }

    #[test]
    fn copy_display() {
        let err = Error::copy("/mnt/audio/MUS/SP0012.wav", "permission denied");
        assert_eq!(
            err.to_string(),
            "Copy failed for /mnt/audio/MUS/SP0012.wav: permission denied"
        );
    }

    #[test]
    fn import_timeout_display() {
        let err = Error::ImportTimeout {
            path: PathBuf::from("/import/MUS0012.wav"),
            waited: Duration::from_secs(5),
        };
        assert_eq!(
            err.to_string(),
            "Import of /import/MUS0012.wav not confirmed after 5s"
        );
        assert!(!err.is_batch_fatal());
    }

    #[test]
    fn rejection_is_batch_fatal() {
        let err = Error::MetadataRejected {
            asset: asset(),
            reason: "cart locked".into(),
        };
        assert!(err.is_batch_fatal());
        assert_eq!(
            err.to_string(),
            "Metadata update rejected for MUS/0012: cart locked"
        );
    }

    #[test]
    fn server_exchange_failures_are_batch_fatal() {
        assert!(Error::Http("server answered 500 Internal Server Error".into()).is_batch_fatal());
        assert!(Error::Xml("reply has no <status>".into()).is_batch_fatal());
        assert!(!Error::Validation("bad cart".into()).is_batch_fatal());
        assert!(!Error::tool("ffmpeg", "exit code 1").is_batch_fatal());
    }

    #[test]
    fn negative_marker_display() {
        let err = Error::NegativeMarker {
            marker: MarkerName::Eom,
            value: -250,
        };
        assert_eq!(err.to_string(), "Marker EOM would become negative (-250 ms)");
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn tool_display() {
        let err = Error::tool("ffmpeg", "exit code 1");
        assert_eq!(err.to_string(), "Tool error [ffmpeg]: exit code 1");
    }
}

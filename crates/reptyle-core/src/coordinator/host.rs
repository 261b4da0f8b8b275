//! Host download subsystem seam.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier the host assigns to a started download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadId(pub u64);

impl fmt::Display for DownloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the host does when the target filename already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictAction {
    /// Append a disambiguating ` (n)` suffix.
    #[default]
    Uniquify,
    Overwrite,
}

/// Arguments for [`DownloadHost::start_download`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    pub url: String,
    pub filename: String,
    pub conflict_action: ConflictAction,
    /// Ask the user where to save. Always false from the coordinator.
    pub save_as: bool,
}

/// A download the host has just started and needs a name for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadItem {
    pub id: DownloadId,
    #[serde(default)]
    pub url: String,
    /// Name the host would use by default (usually from the server).
    #[serde(default)]
    pub filename: String,
}

/// Rename instruction returned to the host for a download-start event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilenameSuggestion {
    pub filename: String,
    pub conflict_action: ConflictAction,
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid filename {0:?}")]
    InvalidFilename(String),
    #[error("download rejected: {0}")]
    Rejected(String),
    #[error("download io: {0}")]
    Io(#[from] std::io::Error),
}

/// Privileged download API.
///
/// `start_download` returns once the host has accepted (or refused) the
/// download; the transfer itself may continue in the background.
pub trait DownloadHost {
    fn start_download(&self, options: DownloadOptions) -> Result<DownloadId, HostError>;
}

impl<H: DownloadHost + ?Sized> DownloadHost for std::sync::Arc<H> {
    fn start_download(&self, options: DownloadOptions) -> Result<DownloadId, HostError> {
        (**self).start_download(options)
    }
}

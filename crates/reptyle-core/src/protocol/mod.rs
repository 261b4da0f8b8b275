//! Messages exchanged between the page agent and the download coordinator.
//!
//! Requests are JSON objects tagged by `action` with the payload under `data`,
//! matching what the browser-side script sends:
//!
//! ```json
//! {"action":"downloadVideo","data":{"network":"N","title":"T","actors":"A","date":"D","url":"https://..."}}
//! ```

mod framing;
mod session;

pub use framing::{read_frame, write_frame, FrameError, MAX_INCOMING_FRAME, MAX_OUTGOING_FRAME};
pub use session::{serve, SessionStats};

use crate::coordinator::{ConflictAction, DownloadId, DownloadItem, FilenameSuggestion};
use crate::metadata::ScrapedMetadata;
use serde::{Deserialize, Serialize};

/// Metadata as it travels on the wire: actors already joined with spaces.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetadataPayload {
    #[serde(default)]
    pub network: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub actors: String,
    #[serde(default)]
    pub date: String,
}

impl MetadataPayload {
    /// Wire form of scraped metadata. The network is padded with one space on
    /// each side, as the page script does; the filename builder trims it.
    pub fn from_scraped(meta: &ScrapedMetadata) -> Self {
        Self {
            network: format!(" {} ", meta.network),
            title: meta.title.clone(),
            actors: meta.actors_joined(),
            date: meta.date.clone(),
        }
    }

    pub fn filename(&self) -> String {
        crate::filename::build_filename(&self.network, &self.title, &self.actors, &self.date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadVideoPayload {
    #[serde(flatten)]
    pub metadata: MetadataPayload,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "camelCase")]
pub enum Request {
    /// Stash a filename for whatever download starts next.
    PrepareNativeDownload(MetadataPayload),
    /// Start a download of a known URL under the built filename.
    DownloadVideo(DownloadVideoPayload),
    /// Forwarded host download-start event; must be answered before the next message.
    DetermineFilename(DownloadItem),
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Request::PrepareNativeDownload(_) => "prepareNativeDownload",
            Request::DownloadVideo(_) => "downloadVideo",
            Request::DetermineFilename(_) => "determineFilename",
        }
    }
}

/// Error payload returned with `success: false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

/// Reply to any [`Request`]. Only the fields relevant to the request are set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_ready: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_id: Option<DownloadId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_action: Option<ConflictAction>,
}

impl Response {
    pub fn name_ready(filename: String) -> Self {
        Self {
            success: true,
            name_ready: Some(filename),
            ..Self::default()
        }
    }

    pub fn download_started(id: DownloadId) -> Self {
        Self {
            success: true,
            download_id: Some(id),
            ..Self::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(ErrorPayload {
                message: message.into(),
            }),
            ..Self::default()
        }
    }

    /// Reply to a download-start event. `None` keeps the host's default name.
    pub fn suggestion(suggestion: Option<FilenameSuggestion>) -> Self {
        match suggestion {
            Some(s) => Self {
                success: true,
                filename: Some(s.filename),
                conflict_action: Some(s.conflict_action),
                ..Self::default()
            },
            None => Self {
                success: true,
                ..Self::default()
            },
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }
}

//! Download coordinator: the privileged side of the rename handshake.
//!
//! Two ways a file gets its name:
//! - **direct**: the page agent found a URL, the coordinator starts the download
//!   itself with the built filename;
//! - **native intercept**: the page has to click a button and let the site start
//!   the download. The coordinator stashes the filename in a [`PendingSlot`] and
//!   applies it to the next download-start event the host reports.
//!
//! The host demands an answer to a download-start event within the same event
//! turn, so [`DownloadCoordinator::on_determining_filename`] is synchronous and
//! only reads state prepared ahead of time. Across the native-messaging pipe
//! that turn cannot span a round trip: the browser-side shim answers the event
//! from the `nameReady` of the last prepare reply, and the forwarded
//! `determineFilename` request only consumes the slot here.

mod curl_host;
mod host;
mod pending;

pub use curl_host::{resolve_target, CurlDownloadHost};
pub use host::{
    ConflictAction, DownloadHost, DownloadId, DownloadItem, DownloadOptions, FilenameSuggestion,
    HostError,
};
pub use pending::{PendingSlot, SlotState};

use crate::protocol::{MetadataPayload, Request, Response};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

pub struct DownloadCoordinator<H> {
    host: H,
    slot: Arc<PendingSlot>,
}

impl<H: DownloadHost> DownloadCoordinator<H> {
    pub fn new(host: H, slot: Arc<PendingSlot>) -> Self {
        Self { host, slot }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn slot(&self) -> &Arc<PendingSlot> {
        &self.slot
    }

    /// Builds the filename and stashes it for the next download-start event.
    /// Any previously stashed name is discarded. Returns the stored name.
    pub fn prepare_native_download(&self, meta: &MetadataPayload) -> String {
        let filename = meta.filename();
        self.slot.set(filename.clone());
        tracing::info!(%filename, "filename stored for next download");
        filename
    }

    /// Starts a download of `url` under the built filename. Leaves the slot alone.
    pub fn download_video(&self, meta: &MetadataPayload, url: &str) -> Result<DownloadId, HostError> {
        let filename = meta.filename();
        tracing::info!(%filename, url, "starting direct download");
        let options = DownloadOptions {
            url: url.to_string(),
            filename,
            conflict_action: ConflictAction::Uniquify,
            save_as: false,
        };
        match self.host.start_download(options) {
            Ok(id) => {
                tracing::info!(download_id = %id, "download started");
                Ok(id)
            }
            Err(e) => {
                tracing::error!("download api error: {}", e);
                Err(e)
            }
        }
    }

    /// Answers a host download-start event. Fires for every download, including
    /// ones this coordinator did not ask for; `None` keeps the host's default name.
    pub fn on_determining_filename(&self, item: &DownloadItem) -> Option<FilenameSuggestion> {
        tracing::debug!(download_id = %item.id, incoming = %item.filename, "download intercept triggered");
        match self.slot.take() {
            Some(filename) => {
                tracing::info!(download_id = %item.id, %filename, "renaming intercepted download");
                Some(FilenameSuggestion {
                    filename,
                    conflict_action: ConflictAction::Uniquify,
                })
            }
            None => {
                tracing::debug!("no pending filename; host default name applies");
                None
            }
        }
    }

    /// Dispatches one request and converts every failure into a structured response.
    pub fn handle(&self, request: Request) -> Response {
        tracing::debug!(action = request.action(), "received request");
        match request {
            Request::PrepareNativeDownload(meta) => {
                Response::name_ready(self.prepare_native_download(&meta))
            }
            Request::DownloadVideo(payload) => {
                match self.download_video(&payload.metadata, &payload.url) {
                    Ok(id) => Response::download_started(id),
                    Err(e) => Response::failure(e.to_string()),
                }
            }
            Request::DetermineFilename(item) => {
                Response::suggestion(self.on_determining_filename(&item))
            }
        }
    }

    /// Parses and dispatches a raw JSON request. Malformed input and panics
    /// inside the handler both come back as `success: false`.
    pub fn handle_json(&self, raw: &[u8]) -> Response {
        let request: Request = match serde_json::from_slice(raw) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("malformed request: {}", e);
                return Response::failure(format!("malformed request: {e}"));
            }
        };
        match catch_unwind(AssertUnwindSafe(|| self.handle(request))) {
            Ok(response) => response,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!("critical error inside request handler: {}", message);
                Response::failure(message)
            }
        }
    }
}

//! Native-messaging session: one request frame in, one response frame out.

use super::framing::{read_frame, write_frame, FrameError, MAX_OUTGOING_FRAME};
use super::Response;
use crate::coordinator::{DownloadCoordinator, DownloadHost};
use std::io::{Read, Write};

/// Counters reported when a session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub requests: u64,
    pub failures: u64,
}

/// Serves requests until the browser closes the pipe.
///
/// Responses are written in request order, one per frame. The browser cannot
/// block its download-start listener on this round trip, so the browser-side
/// shim suggests the `nameReady` value from the last prepare reply itself and
/// forwards the event as `determineFilename` only to consume the pending slot.
///
/// A reply too large for the browser is replaced by a failure, and the pending
/// slot is rolled back so no unacknowledged name is left behind.
pub fn serve<R, W, H>(
    reader: &mut R,
    writer: &mut W,
    coordinator: &DownloadCoordinator<H>,
) -> Result<SessionStats, FrameError>
where
    R: Read,
    W: Write,
    H: DownloadHost,
{
    let mut stats = SessionStats::default();
    while let Some(frame) = read_frame(reader)? {
        stats.requests += 1;
        let before = coordinator.slot().peek();
        let response = coordinator.handle_json(&frame);
        let mut success = response.success;
        let mut body = serde_json::to_vec(&response).map_err(std::io::Error::from)?;
        if body.len() > MAX_OUTGOING_FRAME {
            tracing::error!(len = body.len(), max = MAX_OUTGOING_FRAME, "response too large; reporting failure");
            coordinator.slot().restore(before);
            let failure = Response::failure(format!(
                "response of {} bytes exceeds the {} byte message limit",
                body.len(),
                MAX_OUTGOING_FRAME
            ));
            body = serde_json::to_vec(&failure).map_err(std::io::Error::from)?;
            success = false;
        }
        if !success {
            stats.failures += 1;
        }
        write_frame(writer, &body)?;
    }
    tracing::info!(requests = stats.requests, failures = stats.failures, "native messaging session closed");
    Ok(stats)
}

//! `reptyle serve` – native-messaging host loop on stdin/stdout.
//!
//! The browser starts this process and exchanges length-prefixed JSON frames
//! with it. Logs go to the log file or stderr, never stdout.

use anyhow::{Context, Result};
use reptyle_core::config::ReptyleConfig;
use reptyle_core::coordinator::{CurlDownloadHost, DownloadCoordinator, PendingSlot};
use reptyle_core::protocol::serve;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::resolve_download_dir;

pub async fn run_serve(cfg: &ReptyleConfig, download_dir: Option<PathBuf>) -> Result<()> {
    let download_dir = resolve_download_dir(cfg, download_dir)?;
    tracing::info!(dir = %download_dir.display(), "native messaging host starting");

    let coordinator = DownloadCoordinator::new(
        CurlDownloadHost::new(download_dir),
        Arc::new(PendingSlot::new()),
    );

    // Frames are answered strictly in order on one blocking thread.
    let stats = tokio::task::spawn_blocking(move || {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        let result = serve(&mut stdin.lock(), &mut stdout.lock(), &coordinator);
        coordinator.host().wait_all();
        result
    })
    .await
    .context("native messaging thread")?
    .context("native messaging session")?;

    tracing::info!(requests = stats.requests, failures = stats.failures, "native messaging host exiting");
    Ok(())
}

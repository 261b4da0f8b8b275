//! `reptyle scrape <page.html> --url <url>` – run the page agent on a saved page.

use anyhow::{Context, Result};
use reptyle_core::config::ReptyleConfig;
use reptyle_core::coordinator::{
    CurlDownloadHost, DownloadCoordinator, DownloadHost, DownloadId, DownloadOptions, HostError,
    PendingSlot,
};
use reptyle_core::exclusions::JsonFileStore;
use reptyle_core::page::{AgentSettings, InProcessClient, PageAgent, RunOutcome, StaticPage};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::cli::resolve_download_dir;

/// Host that accepts every download and only logs it.
#[derive(Default)]
struct DryRunHost {
    next_id: AtomicU64,
}

impl DownloadHost for DryRunHost {
    fn start_download(&self, options: DownloadOptions) -> Result<DownloadId, HostError> {
        let id = DownloadId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        println!("would download {} -> {}", options.url, options.filename);
        Ok(id)
    }
}

pub async fn run_scrape(
    cfg: &ReptyleConfig,
    path: &Path,
    url: &str,
    dry_run: bool,
    download_dir: Option<PathBuf>,
) -> Result<()> {
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("read page: {}", path.display()))?;
    let page = StaticPage::parse(&html, url)?;
    let settings = AgentSettings::from(cfg);
    let abort = abort_on_ctrl_c();

    if dry_run {
        let outcome = scrape_with(page, Arc::new(DryRunHost::default()), settings, abort).await?;
        report(&outcome);
        return Ok(());
    }

    let host = Arc::new(CurlDownloadHost::new(resolve_download_dir(cfg, download_dir)?));
    let outcome = scrape_with(page, Arc::clone(&host), settings, abort).await?;
    report(&outcome);
    if let RunOutcome::Downloaded { download_id } = outcome {
        let host = Arc::clone(&host);
        let saved = tokio::task::spawn_blocking(move || host.wait(download_id))
            .await
            .context("download thread")??;
        println!("Saved {}", saved.display());
    }
    Ok(())
}

/// Token set by the first Ctrl-C; pending page polls then give up.
fn abort_on_ctrl_c() -> Arc<AtomicBool> {
    let abort = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&abort);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted; cancelling page agent");
            flag.store(true, Ordering::Relaxed);
        }
    });
    abort
}

async fn scrape_with<H: DownloadHost>(
    page: StaticPage,
    host: Arc<H>,
    settings: AgentSettings,
    abort: Arc<AtomicBool>,
) -> Result<RunOutcome> {
    let coordinator = Arc::new(DownloadCoordinator::new(host, Arc::new(PendingSlot::new())));
    let store = JsonFileStore::open_default().context("locate storage file")?;
    let mut agent = PageAgent::new(
        page,
        InProcessClient::new(coordinator),
        Box::new(store),
        settings,
    )?
    .with_abort(abort);
    Ok(agent.run().await)
}

fn report(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Skipped(reason) => println!("Skipped: {reason:?}"),
        RunOutcome::Downloaded { download_id } => println!("Download {download_id} started."),
        RunOutcome::NativeInterceptTriggered { filename } => {
            println!("No direct URL; the next browser download would be renamed to: {filename}")
        }
        RunOutcome::DownloadFailed { error } => println!("Download failed: {error}"),
        RunOutcome::SourceMissing => println!("No download link or video element found."),
    }
}

//! Automated extraction orchestrator and click handling.

use super::dom::{Element, PageDom};
use super::extract::{extract_actors, extract_date, extract_network, extract_title};
use super::resolve::{resolve_video_source, VideoSource};
use super::selectors::{QualityOrder, SiteSelectors};
use crate::config::{ReptyleConfig, Timings};
use crate::coordinator::{DownloadCoordinator, DownloadHost, DownloadId};
use crate::exclusions::{ExclusionList, KvStore, StoreError, ToggleOutcome};
use crate::metadata::{clean_actor_name, ScrapedMetadata};
use crate::poll::{poll_until, PollPolicy};
use crate::protocol::{DownloadVideoPayload, MetadataPayload, Request, Response};
use anyhow::Result;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Page-side view of the download coordinator.
pub trait CoordinatorClient {
    fn send(&self, request: Request) -> impl Future<Output = Result<Response>>;
}

/// Client that calls a coordinator living in the same process.
pub struct InProcessClient<H> {
    coordinator: Arc<DownloadCoordinator<H>>,
}

impl<H> InProcessClient<H> {
    pub fn new(coordinator: Arc<DownloadCoordinator<H>>) -> Self {
        Self { coordinator }
    }
}

impl<H: DownloadHost> CoordinatorClient for InProcessClient<H> {
    async fn send(&self, request: Request) -> Result<Response> {
        Ok(self.coordinator.handle(request))
    }
}

/// Guards against re-entrant automation runs in one page context.
#[derive(Debug, Clone, Default)]
pub struct ProcessingLock {
    held: Arc<AtomicBool>,
}

/// Releases the [`ProcessingLock`] when dropped, on every exit path.
#[derive(Debug)]
pub struct ProcessingGuard {
    held: Arc<AtomicBool>,
}

impl ProcessingLock {
    pub fn try_acquire(&self) -> Option<ProcessingGuard> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ProcessingGuard {
                held: Arc::clone(&self.held),
            })
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
    }
}

/// Knobs for one page agent, usually taken from [`ReptyleConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    pub poll: PollPolicy,
    pub title_poll: PollPolicy,
    pub timings: Timings,
    pub quality_order: QualityOrder,
    pub selectors: SiteSelectors,
}

impl Default for AgentSettings {
    fn default() -> Self {
        AgentSettings::from(&ReptyleConfig::default())
    }
}

impl From<&ReptyleConfig> for AgentSettings {
    fn from(cfg: &ReptyleConfig) -> Self {
        Self {
            poll: cfg.poll,
            title_poll: cfg.title_poll,
            timings: cfg.timings,
            quality_order: cfg.quality_order,
            selectors: cfg.selectors.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyProcessing,
    NotMovieDetail,
    /// The abort token was set while the run was in progress.
    Cancelled,
}

/// How one automation run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Skipped(SkipReason),
    /// Coordinator started a direct download; the page went back.
    Downloaded { download_id: DownloadId },
    /// Filename stashed and the site's own download triggered; the page went back.
    NativeInterceptTriggered { filename: String },
    DownloadFailed { error: String },
    /// Neither a quality option nor a video element was found.
    SourceMissing,
}

/// Result of a click the agent intercepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    ExclusionToggled { actor: String, outcome: ToggleOutcome },
    /// User declined the toggle; the actor link was followed.
    FollowedLink { href: String },
    Automation(RunOutcome),
    Ignored,
}

/// `true` for `/movies/<digits>` with an optional trailing slash.
pub fn is_movie_detail_url(href: &str) -> bool {
    let parsed = url::Url::parse(href).or_else(|_| {
        url::Url::parse("http://localhost/").and_then(|base| base.join(href))
    });
    let Ok(parsed) = parsed else {
        tracing::debug!(href, "could not parse url");
        return false;
    };
    let is_match = parsed
        .path()
        .strip_prefix("/movies/")
        .map(|rest| rest.strip_suffix('/').unwrap_or(rest))
        .is_some_and(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()));
    tracing::debug!(path = parsed.path(), is_match, "movie detail check");
    is_match
}

pub struct PageAgent<D, C> {
    dom: D,
    client: C,
    store: Box<dyn KvStore>,
    exclusions: ExclusionList,
    settings: AgentSettings,
    lock: ProcessingLock,
    abort: Option<Arc<AtomicBool>>,
}

impl<D: PageDom, C: CoordinatorClient> PageAgent<D, C> {
    /// Creates the agent and loads (or seeds) the exclusion list from `store`.
    pub fn new(
        dom: D,
        client: C,
        store: Box<dyn KvStore>,
        settings: AgentSettings,
    ) -> Result<Self, StoreError> {
        let exclusions = ExclusionList::load(store.as_ref())?;
        Ok(Self {
            dom,
            client,
            store,
            exclusions,
            settings,
            lock: ProcessingLock::default(),
            abort: None,
        })
    }

    /// Token that, once set, makes every pending poll give up.
    pub fn with_abort(mut self, abort: Arc<AtomicBool>) -> Self {
        self.abort = Some(abort);
        self
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn exclusions(&self) -> &ExclusionList {
        &self.exclusions
    }

    pub fn lock(&self) -> &ProcessingLock {
        &self.lock
    }

    /// Scrapes network, title, date and actors from the current page.
    pub async fn extract_metadata(&mut self) -> ScrapedMetadata {
        let abort = self.abort.as_deref();
        let s = &self.settings;

        tracing::debug!("waiting for page structure");
        poll_until(&s.poll, &s.selectors.page_ready, abort, || {
            self.dom.query(&s.selectors.page_ready)
        })
        .await;

        let title = extract_title(&self.dom, &s.title_poll, &s.selectors, abort).await;
        let network = extract_network(&self.dom, &s.selectors);
        let date = extract_date(&mut self.dom, &s.poll, &s.selectors, abort).await;
        let actors = extract_actors(&self.dom, &s.selectors, &self.exclusions);

        ScrapedMetadata {
            network,
            title,
            actors,
            date,
        }
    }

    /// One automated extraction and download attempt.
    ///
    /// Skips when a run is already in progress or the page is not a movie
    /// detail page. The processing lock is held until this returns.
    pub async fn run(&mut self) -> RunOutcome {
        if self.lock.is_held() {
            tracing::debug!("already processing a download; skipping trigger");
            return RunOutcome::Skipped(SkipReason::AlreadyProcessing);
        }
        if !is_movie_detail_url(&self.dom.location()) {
            tracing::debug!("not on a movie page; automation sleeping");
            return RunOutcome::Skipped(SkipReason::NotMovieDetail);
        }
        let Some(_guard) = self.lock.try_acquire() else {
            return RunOutcome::Skipped(SkipReason::AlreadyProcessing);
        };
        tracing::info!(location = %self.dom.location(), "starting extraction");

        let meta = self.extract_metadata().await;
        tracing::info!(?meta, "scraped metadata");
        let payload = MetadataPayload::from_scraped(&meta);

        let abort = self.abort.clone();
        let source = resolve_video_source(&mut self.dom, &self.settings, abort.as_deref()).await;
        if abort.is_some_and(|a| a.load(Ordering::Relaxed)) {
            tracing::info!("run cancelled before dispatch");
            return RunOutcome::Skipped(SkipReason::Cancelled);
        }
        match source {
            VideoSource::NativeIntercept(option) => self.run_native(payload, &option).await,
            VideoSource::Direct(url) => self.run_direct(payload, url).await,
            VideoSource::Missing => {
                tracing::error!("download link not found and native intercept not triggered");
                RunOutcome::SourceMissing
            }
        }
    }

    async fn run_native(&mut self, payload: MetadataPayload, option: &Element) -> RunOutcome {
        tracing::debug!("preparing coordinator for native intercept");
        let response = match self.client.send(Request::PrepareNativeDownload(payload)).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("native prep message failed: {:#}", e);
                return RunOutcome::DownloadFailed {
                    error: format!("{e:#}"),
                };
            }
        };
        tracing::debug!(?response, "native prep response");
        if !response.success {
            return RunOutcome::DownloadFailed {
                error: response.error_message().unwrap_or("prepare rejected").to_string(),
            };
        }

        self.dom.click(option);
        tracing::debug!("waiting for the site to start the download");
        tokio::time::sleep(Duration::from_millis(self.settings.timings.native_settle_ms)).await;
        self.dom.history_back();
        RunOutcome::NativeInterceptTriggered {
            filename: response.name_ready.unwrap_or_default(),
        }
    }

    async fn run_direct(&mut self, metadata: MetadataPayload, url: String) -> RunOutcome {
        tracing::debug!(%url, "sending direct download request");
        let request = Request::DownloadVideo(DownloadVideoPayload { metadata, url });
        let response = match self.client.send(request).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("download message failed: {:#}", e);
                return RunOutcome::DownloadFailed {
                    error: format!("{e:#}"),
                };
            }
        };
        match (response.success, response.download_id) {
            (true, Some(download_id)) => {
                tracing::info!(%download_id, "download started; navigating back");
                self.dom.history_back();
                RunOutcome::Downloaded { download_id }
            }
            _ => {
                let error = response
                    .error_message()
                    .unwrap_or("download failed to start")
                    .to_string();
                tracing::error!(%error, "download failed to start");
                RunOutcome::DownloadFailed { error }
            }
        }
    }

    /// Routes a click on `target`: actor links toggle exclusion, movie links
    /// start automation once the page has routed, anything else is ignored.
    pub async fn handle_click(&mut self, target: &Element) -> Result<ClickOutcome> {
        if let Some(link) = self.dom.closest(target, &self.settings.selectors.actor_link_any) {
            return Ok(self.toggle_actor(&link)?);
        }
        if self.dom.closest(target, &self.settings.selectors.movie_link).is_some() {
            tracing::debug!("movie link clicked; waiting for route change");
            tokio::time::sleep(Duration::from_millis(self.settings.timings.navigation_settle_ms)).await;
            return Ok(ClickOutcome::Automation(self.run().await));
        }
        Ok(ClickOutcome::Ignored)
    }

    fn toggle_actor(&mut self, link: &Element) -> Result<ClickOutcome, StoreError> {
        let actor = clean_actor_name(&link.text);
        if actor.is_empty() {
            return Ok(ClickOutcome::Ignored);
        }
        let dom = &mut self.dom;
        let outcome = self
            .exclusions
            .toggle_with_confirm(self.store.as_ref(), &actor, |prompt| dom.confirm(prompt))?;
        if outcome == ToggleOutcome::Declined {
            if let Some(href) = link.href.clone() {
                dom.navigate(&href);
                return Ok(ClickOutcome::FollowedLink { href });
            }
        }
        Ok(ClickOutcome::ExclusionToggled { actor, outcome })
    }
}

//! Finding the video to download.

use super::agent::AgentSettings;
use super::dom::{Element, PageDom};
use crate::poll::poll_until;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

/// Where the video comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    /// A URL the coordinator can download itself.
    Direct(String),
    /// The chosen quality option exposes no URL; clicking it makes the site
    /// start the download, which must be renamed by interception.
    NativeIntercept(Element),
    Missing,
}

/// URL carried by a quality option: its own `href`, then `data-url`, then the
/// `href` of the nearest enclosing anchor.
pub fn url_from_option<D: PageDom>(dom: &D, option: &Element) -> Option<String> {
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
    option
        .href
        .as_deref()
        .and_then(non_empty)
        .or_else(|| option.attr("data-url").and_then(non_empty))
        .or_else(|| {
            dom.closest(option, "a")
                .and_then(|a| a.href)
                .and_then(|h| non_empty(&h))
        })
}

/// Opens the download menu and picks the best quality option.
///
/// Which option is "best" is positional (see [`super::QualityOrder`]). With no
/// options at all, the page's `<video>` source is used.
pub async fn resolve_video_source<D: PageDom>(
    dom: &mut D,
    settings: &AgentSettings,
    abort: Option<&AtomicBool>,
) -> VideoSource {
    let selectors = &settings.selectors;
    let menu = poll_until(&settings.poll, &selectors.download_menu_button, abort, || {
        dom.query(&selectors.download_menu_button)
    })
    .await
    .found();
    match menu {
        Some(button) => {
            tracing::debug!("clicking 'Download Full Movie' button");
            dom.click(&button);
            poll_until(&settings.poll, &selectors.quality_options, abort, || {
                dom.query(&selectors.quality_options)
            })
            .await;
            tokio::time::sleep(Duration::from_millis(settings.timings.menu_settle_ms)).await;
        }
        None => tracing::warn!("'Download Full Movie' button not found"),
    }

    let options = dom.query_all(&selectors.quality_options);
    tracing::debug!(count = options.len(), "quality options");
    if let Some(best) = settings.quality_order.pick(options) {
        tracing::debug!(option = %best.describe(), text = %best.text.replace('\n', " "), "selected highest quality option");
        return match url_from_option(&*dom, &best) {
            Some(url) => {
                tracing::debug!(%url, "direct url on quality option");
                VideoSource::Direct(url)
            }
            None => {
                tracing::debug!("no direct url on quality option; native intercept needed");
                VideoSource::NativeIntercept(best)
            }
        };
    }

    tracing::warn!("no quality options; trying video element fallback");
    // `<video>` precedes its `<source>` children in document order and often
    // has no `src` itself, so take the first match that carries one.
    match dom
        .query_all(&selectors.fallback_video)
        .into_iter()
        .filter_map(|v| v.src)
        .find(|s| !s.is_empty())
    {
        Some(url) => {
            tracing::debug!(%url, "fallback video url");
            VideoSource::Direct(url)
        }
        None => {
            tracing::debug!("fallback video element not found");
            VideoSource::Missing
        }
    }
}

//! Metadata extraction from the rendered movie page.
//!
//! Missing elements degrade to placeholders; nothing here fails.

use super::dom::PageDom;
use super::selectors::SiteSelectors;
use crate::exclusions::ExclusionList;
use crate::metadata::{select_actors, UNKNOWN_DATE, UNKNOWN_NETWORK};
use crate::poll::{poll_until, PollPolicy, Polled};
use std::sync::atomic::AtomicBool;

pub fn is_placeholder_title(title: &str, selectors: &SiteSelectors) -> bool {
    let trimmed = title.trim();
    trimmed.is_empty()
        || title.contains(&selectors.placeholder_title_marker)
        || trimmed == selectors.placeholder_site_name
}

/// Movie title from a document title: text before the first `" - "`, then
/// before the first `" | "`.
pub fn clean_title(raw: &str) -> String {
    let head = raw.split(" - ").next().unwrap_or(raw);
    head.split(" | ").next().unwrap_or(head).trim().to_string()
}

/// Waits for the document title to leave its loading placeholder, then cleans it.
/// After `policy` runs out the current title is used as is.
pub async fn extract_title<D: PageDom>(
    dom: &D,
    policy: &PollPolicy,
    selectors: &SiteSelectors,
    abort: Option<&AtomicBool>,
) -> String {
    let polled = poll_until(policy, "document title", abort, || {
        let title = dom.title();
        (!is_placeholder_title(&title, selectors)).then_some(title)
    })
    .await;
    let raw = match polled {
        Polled::Found { value, .. } => value,
        Polled::NotFound { .. } | Polled::Cancelled { .. } => dom.title(),
    };
    let title = clean_title(&raw);
    tracing::debug!(raw = %raw, cleaned = %title, "video title");
    title
}

pub fn extract_network<D: PageDom>(dom: &D, selectors: &SiteSelectors) -> String {
    let network = dom
        .query(&selectors.network_logo)
        .and_then(|img| img.attr("alt").map(|alt| alt.trim().to_string()))
        .unwrap_or_else(|| UNKNOWN_NETWORK.to_string());
    tracing::debug!(%network, "network title");
    network
}

/// Opens the "More" panel and reads the date element.
pub async fn extract_date<D: PageDom>(
    dom: &mut D,
    policy: &PollPolicy,
    selectors: &SiteSelectors,
    abort: Option<&AtomicBool>,
) -> String {
    let more = poll_until(policy, &selectors.more_button, abort, || {
        dom.query(&selectors.more_button)
    })
    .await
    .found();
    match more {
        Some(button) => {
            tracing::debug!("clicking 'More' button");
            dom.click(&button);
            let found = poll_until(policy, &selectors.date, abort, || dom.query(&selectors.date))
                .await
                .is_found();
            tracing::debug!(found, "date element detection");
        }
        None => tracing::warn!("'More' button not found"),
    }

    let date = dom
        .query(&selectors.date)
        .map(|el| el.text.trim().to_string())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string());
    tracing::debug!(%date, "upload date");
    date
}

pub fn extract_actors<D: PageDom>(
    dom: &D,
    selectors: &SiteSelectors,
    exclusions: &ExclusionList,
) -> Vec<String> {
    let links = dom.query_all(&selectors.actor_links);
    tracing::debug!(count = links.len(), "actor links");
    let actors = select_actors(links.iter().map(|el| el.text.as_str()), exclusions);
    tracing::debug!(actors = %actors.join(" "), "final actor list");
    actors
}

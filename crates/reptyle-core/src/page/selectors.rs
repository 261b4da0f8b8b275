//! Site markup contract.
//!
//! These selectors describe a third-party page we do not control; they are
//! configuration so a markup change does not need a rebuild.

use serde::{Deserialize, Serialize};

/// Which quality option is the best one.
///
/// The site lists options from lowest to highest quality with no machine
/// readable label, so "last wins" is positional and breaks if the site reorders
/// the menu. `FirstIsHighest` exists for that day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QualityOrder {
    #[default]
    LastIsHighest,
    FirstIsHighest,
}

impl QualityOrder {
    pub fn pick<T>(self, mut options: Vec<T>) -> Option<T> {
        match self {
            QualityOrder::LastIsHighest => options.pop(),
            QualityOrder::FirstIsHighest => {
                if options.is_empty() {
                    None
                } else {
                    Some(options.swap_remove(0))
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSelectors {
    /// Present once the movie page has rendered.
    pub page_ready: String,
    /// Series logo image; its `alt` is the network name.
    pub network_logo: String,
    /// Reveals the date panel.
    pub more_button: String,
    pub date: String,
    /// Actor links inside the player panel (filename source).
    pub actor_links: String,
    /// Any actor link on any page (exclusion toggle).
    pub actor_link_any: String,
    /// Any movie link (starts automation).
    pub movie_link: String,
    /// Opens the quality menu.
    pub download_menu_button: String,
    pub quality_options: String,
    /// Last resort when there is no quality menu.
    pub fallback_video: String,
    /// Title substring shown while the page is loading.
    pub placeholder_title_marker: String,
    /// Bare site name shown as title while loading.
    pub placeholder_site_name: String,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            page_ready: ".series-logo".into(),
            network_logo: r#".series-logo a[href*="/series/"] img"#.into(),
            more_button: r#"button[data-tooltip="More"]"#.into(),
            date: r#"div[style*="font-style: italic"]"#.into(),
            actor_links: r#".movie-bg-player-model-container a[href*="/models/"]"#.into(),
            actor_link_any: r#"a[href*="/models/"]"#.into(),
            movie_link: r#"a[href*="/movies/"]"#.into(),
            download_menu_button: r#"button[data-tooltip="Download Full Movie"]"#.into(),
            quality_options: ".modal-download-button".into(),
            fallback_video: "video source, video".into(),
            placeholder_title_marker: "Reptyle Members Area".into(),
            placeholder_site_name: "Reptyle".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_is_highest_picks_last() {
        assert_eq!(QualityOrder::LastIsHighest.pick(vec![1, 2, 3]), Some(3));
        assert_eq!(QualityOrder::LastIsHighest.pick(Vec::<u8>::new()), None);
    }

    #[test]
    fn first_is_highest_picks_first() {
        assert_eq!(QualityOrder::FirstIsHighest.pick(vec![1, 2, 3]), Some(1));
        assert_eq!(QualityOrder::FirstIsHighest.pick(Vec::<u8>::new()), None);
    }

    #[test]
    fn default_selectors_parse() {
        let s = SiteSelectors::default();
        for sel in [
            &s.page_ready,
            &s.network_logo,
            &s.more_button,
            &s.date,
            &s.actor_links,
            &s.actor_link_any,
            &s.movie_link,
            &s.download_menu_button,
            &s.quality_options,
            &s.fallback_video,
        ] {
            assert!(scraper::Selector::parse(sel).is_ok(), "selector {sel}");
        }
    }
}

use crate::page::{QualityOrder, SiteSelectors};
use crate::poll::PollPolicy;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Fixed delays in the page agent, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Wait after the quality options appear, for the menu animation.
    pub menu_settle_ms: u64,
    /// Wait after clicking a quality option that has no URL, so the site's own
    /// script can start the download before we navigate away.
    pub native_settle_ms: u64,
    /// Wait after a movie thumbnail click for the single-page app to route.
    pub navigation_settle_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            menu_settle_ms: 500,
            native_settle_ms: 4000,
            navigation_settle_ms: 2000,
        }
    }
}

/// Global configuration loaded from `~/.config/reptyle/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReptyleConfig {
    /// Where directly resolved videos are saved (None = current directory).
    pub download_dir: Option<PathBuf>,
    /// Which quality option counts as the best one.
    pub quality_order: QualityOrder,
    /// Polling for page elements.
    pub poll: PollPolicy,
    /// Polling for the document title to leave its loading placeholder.
    pub title_poll: PollPolicy,
    pub timings: Timings,
    /// Site markup contract; override here when the site changes.
    pub selectors: SiteSelectors,
}

impl Default for ReptyleConfig {
    fn default() -> Self {
        Self {
            download_dir: None,
            quality_order: QualityOrder::default(),
            poll: PollPolicy::default(),
            title_poll: PollPolicy {
                interval_ms: 1000,
                max_attempts: 15,
            },
            timings: Timings::default(),
            selectors: SiteSelectors::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("reptyle")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ReptyleConfig> {
    let path = config_path()?;
    load_or_init_at(&path)
}

pub fn load_or_init_at(path: &std::path::Path) -> Result<ReptyleConfig> {
    if !path.exists() {
        let default_cfg = ReptyleConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: ReptyleConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = ReptyleConfig::default();
        assert_eq!(cfg.poll.interval_ms, 1000);
        assert_eq!(cfg.poll.max_attempts, 30);
        assert_eq!(cfg.title_poll.max_attempts, 15);
        assert_eq!(cfg.timings.native_settle_ms, 4000);
        assert_eq!(cfg.quality_order, QualityOrder::LastIsHighest);
        assert!(cfg.download_dir.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = ReptyleConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: ReptyleConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_partial_overrides() {
        let toml = r#"
            download_dir = "/srv/videos"
            quality_order = "first-is-highest"

            [poll]
            interval_ms = 250
            max_attempts = 8

            [selectors]
            quality_options = ".dl-option"
        "#;
        let cfg: ReptyleConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.download_dir.as_deref(), Some(std::path::Path::new("/srv/videos")));
        assert_eq!(cfg.quality_order, QualityOrder::FirstIsHighest);
        assert_eq!(cfg.poll.interval_ms, 250);
        assert_eq!(cfg.selectors.quality_options, ".dl-option");
        assert_eq!(cfg.selectors.date, SiteSelectors::default().date);
        assert_eq!(cfg.timings, Timings::default());
    }

    #[test]
    fn load_or_init_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reptyle").join("config.toml");
        let cfg = load_or_init_at(&path).unwrap();
        assert!(path.exists());
        assert_eq!(load_or_init_at(&path).unwrap(), cfg);
    }
}

//! Scraped movie metadata and actor list shaping.

use crate::exclusions::ExclusionList;
use crate::filename::build_filename;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Placeholder used when the series logo never appears.
pub const UNKNOWN_NETWORK: &str = "Unknown Network";
/// Placeholder used when the date element never appears.
pub const UNKNOWN_DATE: &str = "Unknown Date";

/// Metadata scraped from one movie page visit. Recomputed on every visit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScrapedMetadata {
    pub network: String,
    pub title: String,
    /// Deduplicated, exclusion-filtered, in page order.
    pub actors: Vec<String>,
    pub date: String,
}

impl ScrapedMetadata {
    /// Actor names joined with a single space, as they appear in filenames.
    pub fn actors_joined(&self) -> String {
        self.actors.join(" ")
    }

    pub fn filename(&self) -> String {
        build_filename(&self.network, &self.title, &self.actors_joined(), &self.date)
    }
}

/// Cleans one actor link text: commas removed, whitespace trimmed.
pub fn clean_actor_name(raw: &str) -> String {
    raw.replace(',', "").trim().to_string()
}

/// Turns raw actor link texts into the filename actor list.
///
/// Names are cleaned, empty names dropped, exact duplicates removed (first
/// occurrence wins) and names on the exclusion list (case-insensitive) dropped.
pub fn select_actors<'a, I>(raw_names: I, exclusions: &ExclusionList) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for raw in raw_names {
        let name = clean_actor_name(raw);
        if name.is_empty() || !seen.insert(name.clone()) {
            continue;
        }
        if exclusions.contains(&name) {
            tracing::debug!(actor = %name, "excluding actor from filename");
            continue;
        }
        out.push(name);
    }
    out
}

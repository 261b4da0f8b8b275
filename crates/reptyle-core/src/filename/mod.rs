//! Filename construction for renamed downloads.
//!
//! Builds `[network] - date - title - actors.mp4` from scraped metadata. Each
//! component is sanitized on its own before composition, so the result is a
//! pure function of its inputs and never contains characters that Windows or
//! macOS refuse in file names.

mod sanitize;

pub use sanitize::{normalize_date, sanitize_component, FORBIDDEN_CHARS};

/// Extension appended to every generated filename.
pub const VIDEO_EXTENSION: &str = "mp4";

/// Builds the download filename from its four components.
///
/// Empty components are accepted and yield a degenerate but well-formed name.
///
/// # Examples
///
/// - `build_filename("ExampleNet", "Sample Title", "Jane Doe", "08/21/2024")`
///   → `"[ExampleNet] - 08-21-2024 - Sample Title - Jane Doe.mp4"`
pub fn build_filename(network: &str, title: &str, actors: &str, date: &str) -> String {
    format!(
        "[{}] - {} - {} - {}.{}",
        sanitize_component(network),
        normalize_date(date),
        sanitize_component(title),
        sanitize_component(actors),
        VIDEO_EXTENSION
    )
}

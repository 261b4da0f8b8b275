//! Per-component sanitization.

/// Characters that are stripped from every filename component.
pub const FORBIDDEN_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Removes forbidden filesystem characters and trims surrounding whitespace.
///
/// Idempotent: sanitizing an already sanitized string returns it unchanged.
pub fn sanitize_component(raw: &str) -> String {
    raw.chars()
        .filter(|c| !FORBIDDEN_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Sanitizes a date component, turning `MM/DD/YYYY` into `MM-DD-YYYY`.
///
/// Slashes are mapped to dashes before the forbidden set is stripped, otherwise
/// the separators would vanish along with every other `/`.
pub fn normalize_date(raw: &str) -> String {
    sanitize_component(&raw.replace('/', "-"))
}

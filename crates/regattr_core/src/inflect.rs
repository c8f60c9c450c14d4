//! Attribute-name inflection for label fallbacks.

use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"^_+").expect("valid regex"));
static ID_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"_id$").expect("valid regex"));
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[_\s]+").expect("valid regex"));

/// Turns an attribute name into a human-readable phrase.
///
/// `"internationalized_field"` becomes `"Internationalized field"`, and a
/// trailing `_id` is dropped (`"author_id"` becomes `"Author"`).
pub fn humanize(name: &str) -> String {
    let trimmed = LEADING_UNDERSCORES.replace(name.trim(), "");
    let without_id = ID_SUFFIX.replace(&trimmed, "");
    let spaced = SEPARATORS.replace_all(&without_id, " ");
    capitalize(spaced.trim().to_lowercase().as_str())
}

/// Humanizes a name and capitalizes every word (`"file_names"` -> `"File Names"`).
pub fn titleize(name: &str) -> String {
    humanize(name)
        .split(' ')
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

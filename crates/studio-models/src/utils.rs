//! Helpers shared across crates.

/// Longest output name derived from a caption.
pub const OUTPUT_NAME_MAX_LEN: usize = 40;

const SEPARATOR: char = '_';

/// Derive a filesystem-safe output name from a caption.
///
/// Lowercases ASCII letters, collapses every run of other characters into a
/// single `_`, trims separators from both ends and caps the length at
/// [`OUTPUT_NAME_MAX_LEN`].
pub fn output_name_slug(caption: &str) -> String {
    let mut slug = String::with_capacity(caption.len());
    let mut pending_separator = false;

    for ch in caption.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push(SEPARATOR);
            }
            pending_separator = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    // Only ASCII is pushed, so byte truncation is char-safe.
    slug.truncate(OUTPUT_NAME_MAX_LEN);
    slug.trim_end_matches(SEPARATOR).to_string()
}

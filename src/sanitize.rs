//! Prompt-to-filename key derivation.
//!
//! Every artifact path (image, audio, video) is derived from the same key, so
//! this is the only place the mapping is defined.

/// Maximum length of a sanitized key, in characters.
pub const MAX_KEY_LEN: usize = 50;

/// Separator that replaces each run of non-alphanumeric characters.
pub const KEY_SEPARATOR: char = '_';

/// Derive the filesystem-safe key for a prompt.
///
/// Each maximal run of characters that are not ASCII letters or digits becomes
/// a single `_`, the result is lowercased and truncated to [`MAX_KEY_LEN`].
/// The output only ever contains `[a-z0-9_]`.
pub fn sanitize(text: &str) -> String {
    let mut key = String::with_capacity(text.len().min(MAX_KEY_LEN));
    let mut in_separator_run = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            key.push(c.to_ascii_lowercase());
            in_separator_run = false;
        } else if !in_separator_run {
            key.push(KEY_SEPARATOR);
            in_separator_run = true;
        }
    }

    // Output is pure ASCII, so byte length equals char count.
    key.truncate(MAX_KEY_LEN);
    key
}

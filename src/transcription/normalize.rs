//! Removal of inline timing annotations from provider transcripts.

use regex::Regex;
use std::sync::LazyLock;

// A bracketed span up to the next `]`, plus any whitespace after it.
static TIMING_ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]\s*").expect("Invalid regex"));

/// Strip every `[...]` annotation (and the whitespace following it), then trim.
///
/// Idempotent: any `[` that survives has no `]` after it.
pub fn clean(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    TIMING_ANNOTATION.replace_all(text, "").trim().to_string()
}

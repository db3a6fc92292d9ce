//! Response normalizer: turns raw oracle text into a [`StructuredCommand`].
//!
//! Two steps, kept separate so the repair loop can quote the cleaned text
//! back to the oracle:
//! 1. [`strip_framing`] removes Markdown code fences and trims whitespace.
//! 2. [`parse`] decodes the cleaned text.

use std::sync::LazyLock;
use culturedrone_core::command::{MalformedReply, StructuredCommand};
use regex_lite::Regex;

/// An opening or closing fence marker plus the whitespace after it.
static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:[jJ][sS][oO][nN])?\s*").expect("fence pattern is a valid regex")
});

/// Remove code-fence markup and incidental whitespace. Not a parse.
pub fn strip_framing(raw: &str) -> String {
    FENCE.replace_all(raw, "").trim().to_string()
}

/// Decode cleaned text as a structured command.
pub fn parse(cleaned: &str) -> Result<StructuredCommand, MalformedReply> {
    StructuredCommand::from_json(cleaned)
}

//! Response formatting.
//!
//! Replies that already contain code markup are rendered as-is; anything
//! else is wrapped in a generic fenced block.

const FENCE: &str = "```";
const INLINE_CODE_TAG: &str = "<code>";

/// Wrap `text` in a fenced block unless it already carries code markup.
pub fn format_response(text: &str) -> String {
    if text.contains(FENCE) || text.contains(INLINE_CODE_TAG) {
        return text.to_string();
    }
    format!("{FENCE}\n{}\n{FENCE}", text.trim())
}

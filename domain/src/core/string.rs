//! Log-preview helper.

/// One-line preview of `text` for log messages.
///
/// Runs of whitespace (including newlines from tool output or SQL) collapse
/// to a single space. At most `max_chars` characters are kept, with a
/// trailing `...` counted in the budget when the text is cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }

    let kept: String = collapsed
        .chars()
        .take(max_chars.saturating_sub(3))
        .collect();
    format!("{}...", kept.trim_end())
}

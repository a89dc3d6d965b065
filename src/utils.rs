//! Small string helpers shared across the pipeline.

/// Trim article text to a character budget before sending it to the
/// summarizer, so a long article cannot blow the model's context window.
/// The budget is in characters (roughly 4 per token); the cut lands on a
/// character boundary.
pub fn trim_for_prompt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Truncate a string for logging, appending how much was elided.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let cut = s
            .char_indices()
            .nth(max)
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_for_prompt_short_text_untouched() {
        assert_eq!(trim_for_prompt("short", 100), "short");
    }

    #[test]
    fn test_trim_for_prompt_cuts_at_budget() {
        assert_eq!(trim_for_prompt("abcdefgh", 3), "abc");
    }

    #[test]
    fn test_trim_for_prompt_respects_char_boundaries() {
        let text = "日本語のテキスト";
        assert_eq!(trim_for_prompt(text, 3), "日本語");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }
}

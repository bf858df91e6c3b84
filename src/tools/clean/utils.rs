/// Private helper functions for text and URL cleaning
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;
use url::Url;

static WHITESPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static BLANK_LINES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("valid regex"));

/// Normalize Unicode to NFC (Canonical Composition).
pub fn normalize_unicode(text: &str) -> String {
    text.nfc().collect::<String>()
}

/// Remove zero-width characters that are invisible but break matching.
pub fn remove_zero_width_chars(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(
                *c,
                '\u{200B}' | // Zero width space
                '\u{200C}' | // Zero width non-joiner
                '\u{200D}' | // Zero width joiner
                '\u{2060}' | // Word joiner
                '\u{FEFF}'   // Zero width no-break space (BOM)
            )
        })
        .collect()
}

/// Remove control characters except newlines and tabs.
pub fn remove_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// `\r\n` and lone `\r` become `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Collapse whitespace runs (including NBSP) to one space and trim.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text, " ").trim().to_string()
}

/// Runs of two or more newlines become one.
pub fn collapse_blank_lines(text: &str) -> String {
    BLANK_LINES_REGEX.replace_all(text, "\n").to_string()
}

pub fn check_url(candidate: &str) -> bool {
    if candidate.is_empty() || candidate.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }
    match Url::parse(candidate) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_unicode() {
        let precomposed = "\u{00E9}";
        let decomposed = "\u{0065}\u{0301}";
        assert_eq!(normalize_unicode(precomposed), normalize_unicode(decomposed));
    }

    #[test]
    fn test_remove_zero_width_chars() {
        assert_eq!(remove_zero_width_chars("998\u{200B}877"), "998877");
        assert_eq!(remove_zero_width_chars("\u{FEFF}text"), "text");
    }

    #[test]
    fn test_remove_control_chars() {
        assert_eq!(remove_control_chars("hello\x00world"), "helloworld");
        assert_eq!(remove_control_chars("keep\nnewline"), "keep\nnewline");
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\nb\nc"), "a\nb\nc");
    }

    #[test]
    fn test_normalize_whitespace_handles_nbsp() {
        assert_eq!(normalize_whitespace("May\u{00A0}9,  2025 "), "May 9, 2025");
    }

    #[test]
    fn test_check_url() {
        assert!(check_url("http://example.com"));
        assert!(check_url("https://scontent.example.net/v/t39/p_s600x600_1.jpg?x=1"));
        assert!(!check_url("https://exa mple.com"));
        assert!(!check_url("ftp://example.com/file"));
        assert!(!check_url("https://"));
        assert!(!check_url(""));
        assert!(!check_url("data:image/png;base64,AAAA"));
    }
}

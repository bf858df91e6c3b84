mod utils;

use utils::*;

/// Clean single-line text.
///
/// Performs the following operations in order:
/// 1. Normalize Unicode to NFC (canonical composition)
/// 2. Remove zero-width characters
/// 3. Remove control characters
/// 4. Normalize whitespace (collapse runs, trim)
///
/// # Examples
/// ```
/// use adsnap::tools::clean::clean_text;
///
/// let dirty = "Library\u{200B} ID:\n  998877 ";
/// assert_eq!(clean_text(dirty), "Library ID: 998877");
/// ```
pub fn clean_text(text: &str) -> String {
    let result = normalize_unicode(text);
    let result = remove_zero_width_chars(&result);
    let result = remove_control_chars(&result);
    normalize_whitespace(&result)
}

/// Clean body copy while keeping its line structure.
///
/// Same as [`clean_text`] except newlines survive: CRLF becomes LF, spaces
/// are collapsed within each line, and runs of blank lines collapse to a
/// single newline.
///
/// # Examples
/// ```
/// use adsnap::tools::clean::clean_multiline;
///
/// let body = "New drop\n\n\n  Shop the   collection  \r\n";
/// assert_eq!(clean_multiline(body), "New drop\nShop the collection");
/// ```
pub fn clean_multiline(text: &str) -> String {
    let result = normalize_unicode(text);
    let result = remove_zero_width_chars(&result);
    let result = normalize_line_endings(&result);
    let result = remove_control_chars(&result);
    let lines: Vec<String> = result.split('\n').map(normalize_whitespace).collect();
    collapse_blank_lines(&lines.join("\n")).trim().to_string()
}

/// Strict URL check: absolute `http`/`https` with a host, no raw whitespace.
///
/// # Examples
/// ```
/// use adsnap::tools::clean::is_valid_url;
///
/// assert!(is_valid_url("https://shop.example.com/item"));
/// assert!(!is_valid_url("/redirect?u=x"));
/// assert!(!is_valid_url("javascript:void(0)"));
/// ```
pub fn is_valid_url(candidate: &str) -> bool {
    check_url(candidate)
}

/// Keep only valid URLs, first occurrence wins.
pub fn clean_urls(urls: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for url in urls {
        let url = url.trim();
        if check_url(url) && !out.iter().any(|u| u == url) {
            out.push(url.to_string());
        }
    }
    out
}

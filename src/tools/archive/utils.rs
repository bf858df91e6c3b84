use base64::Engine as _;
use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

use super::types::{Part, PartHeaders, TransferEncoding};

static BOUNDARY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bboundary\s*=\s*(?:"([^"]+)"|([^\s;"]+))"#).expect("valid regex")
});
static CHARSET_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bcharset\s*=\s*"?([^\s;"]+)"?"#).expect("valid regex")
});

/// Byte offset of `needle` in `haystack`.
fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Split at the first blank line. Without one, everything is head.
pub(super) fn split_head_body(raw: &[u8]) -> (&[u8], &[u8]) {
    let crlf = find_bytes(raw, b"\r\n\r\n").map(|i| (i, 4));
    let lf = find_bytes(raw, b"\n\n").map(|i| (i, 2));
    let split = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    };
    match split {
        Some((at, len)) => (&raw[..at], &raw[at + len..]),
        None => (raw, &[]),
    }
}

/// Header lines with continuations folded in, names lowercased.
pub(super) fn parse_header_lines(head: &[u8]) -> Vec<(String, String)> {
    let text = String::from_utf8_lossy(head);
    let mut headers: Vec<(String, String)> = Vec::new();
    for line in text.lines() {
        if line.starts_with([' ', '\t']) {
            if let Some((_, value)) = headers.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }
    headers
}

pub(super) fn header<'h>(headers: &'h [(String, String)], name: &str) -> Option<&'h str> {
    headers
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.is_empty())
}

pub(super) fn find_boundary(head_text: &str) -> Option<String> {
    let caps = BOUNDARY_REGEX.captures(head_text)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
        .filter(|b| !b.is_empty())
}

pub(super) fn part_headers(headers: &[(String, String)]) -> PartHeaders {
    let content_type_raw = header(headers, "content-type");
    let content_type = content_type_raw
        .and_then(|v| v.split(';').next())
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty());
    let charset = content_type_raw
        .and_then(|v| CHARSET_REGEX.captures(v))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    PartHeaders {
        content_type,
        charset,
        transfer_encoding: header(headers, "content-transfer-encoding")
            .map(TransferEncoding::from_header)
            .unwrap_or_default(),
        content_location: header(headers, "content-location").map(|s| s.to_string()),
    }
}

/// Parse one delimited segment into a part; `None` for whitespace-only segments.
pub(super) fn parse_part(segment: &[u8]) -> Option<Part> {
    let start = segment
        .iter()
        .position(|b| !b.is_ascii_whitespace())?;
    let segment = &segment[start..];
    let (head, body) = split_head_body(segment);
    let body = body
        .strip_suffix(b"\r\n")
        .or_else(|| body.strip_suffix(b"\n"))
        .unwrap_or(body);
    Some(Part {
        headers: part_headers(&parse_header_lines(head)),
        body: body.to_vec(),
    })
}

/// Undo the transfer encoding. Malformed payloads fall back to the raw bytes.
pub(super) fn decode_transfer(part: &Part) -> Cow<'_, [u8]> {
    match part.headers.transfer_encoding {
        TransferEncoding::Identity => Cow::Borrowed(&part.body),
        TransferEncoding::QuotedPrintable => {
            match quoted_printable::decode(&part.body, quoted_printable::ParseMode::Robust) {
                Ok(bytes) => Cow::Owned(bytes),
                Err(e) => {
                    tracing::warn!(error = %e, "quoted-printable body did not decode, using raw bytes");
                    Cow::Borrowed(&part.body)
                }
            }
        }
        TransferEncoding::Base64 => {
            let compact: Vec<u8> = part
                .body
                .iter()
                .copied()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            match base64::engine::general_purpose::STANDARD.decode(&compact) {
                Ok(bytes) => Cow::Owned(bytes),
                Err(e) => {
                    tracing::warn!(error = %e, "base64 body did not decode, using raw bytes");
                    Cow::Borrowed(&part.body)
                }
            }
        }
    }
}

/// Bytes → text: declared charset first, then detection. A BOM wins over both.
pub(super) fn to_text(bytes: &[u8], declared: Option<&str>) -> String {
    let encoding = declared
        .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
        .unwrap_or_else(|| {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        });
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(encoding = used.name(), "markup contained malformed sequences");
    }
    text.into_owned()
}

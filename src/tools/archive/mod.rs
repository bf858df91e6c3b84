//! Archive Tools
//!
//! Decodes MHTML-style `multipart/related` snapshots into the primary markup
//! plus the source URLs of embedded images.

mod tests;
pub mod types;
mod utils;

pub use types::*;
use utils::*;

use tracing::debug;

use crate::error::ArchiveError;
use crate::tools::clean::is_valid_url;
use crate::types::{DecodedDocument, EmbeddedResource};

/// Split a container into its parts.
///
/// Fails only when the container header declares no boundary or the body
/// holds nothing between boundary delimiters.
pub fn parse_archive(raw: &[u8]) -> Result<RawArchive, ArchiveError> {
    let (head, _) = split_head_body(raw);
    let head_text = String::from_utf8_lossy(head);
    let boundary = find_boundary(&head_text).ok_or(ArchiveError::MissingBoundary)?;
    let container_headers = parse_header_lines(head);
    let snapshot_location = header(&container_headers, "snapshot-content-location")
        .map(|s| s.to_string());

    // Delimiters own a whole line; `--token` inside a body is content.
    let pattern = format!(r"(?m)^--{}(?:--)?[ \t]*\r?$", regex::escape(&boundary));
    let delimiter = regex::bytes::Regex::new(&pattern).map_err(|_| ArchiveError::NoParts {
        boundary: boundary.clone(),
    })?;

    // Segment 0 is the container header and preamble.
    let parts: Vec<Part> = delimiter.split(raw).skip(1).filter_map(parse_part).collect();
    if parts.is_empty() {
        return Err(ArchiveError::NoParts { boundary });
    }
    debug!(boundary = %boundary, parts = parts.len(), "archive split");

    Ok(RawArchive {
        boundary,
        snapshot_location,
        parts,
    })
}

/// Pick the markup part and collect embedded image locators.
///
/// No markup part is a normal outcome: the result is
/// [`DecodedDocument::empty`], not an error.
pub fn decode_archive(archive: &RawArchive) -> DecodedDocument {
    let Some(markup) = archive.parts.iter().find(|p| p.headers.is_markup()) else {
        debug!(parts = archive.parts.len(), "no markup part in archive");
        return DecodedDocument::empty();
    };

    let bytes = decode_transfer(markup);
    let html = to_text(&bytes, markup.headers.charset.as_deref())
        .trim()
        .to_string();

    let mut resources: Vec<EmbeddedResource> = Vec::new();
    for part in archive.parts.iter().filter(|p| p.headers.is_image()) {
        let Some(location) = part.headers.content_location.as_deref() else {
            continue;
        };
        let location = location.trim();
        if !is_valid_url(location) {
            debug!(location, "embedded resource locator rejected");
            continue;
        }
        if !resources.iter().any(|r| r.url == location) {
            resources.push(EmbeddedResource {
                url: location.to_string(),
            });
        }
    }

    DecodedDocument {
        html,
        resources,
        snapshot_location: archive.snapshot_location.clone(),
    }
}

/// `parse_archive` then `decode_archive`.
pub fn decode(raw: &[u8]) -> Result<DecodedDocument, ArchiveError> {
    let archive = parse_archive(raw)?;
    Ok(decode_archive(&archive))
}

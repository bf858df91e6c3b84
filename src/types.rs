use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::diagnostics::Diagnostics;

/// CTA value recorded when the matched text is too ambiguous to keep verbatim.
pub const UNKNOWN_CTA: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmbeddedResource {
    pub url: String,
}

/// Primary markup of an archive plus the image locators found in its other parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedDocument {
    pub html: String,
    #[serde(default)]
    pub resources: Vec<EmbeddedResource>,
    pub snapshot_location: Option<String>,
}

impl DecodedDocument {
    pub fn empty() -> Self {
        Self::default()
    }

    /// An archive with no markup part decodes to this; callers short-circuit on it.
    pub fn is_empty(&self) -> bool {
        self.html.trim().is_empty()
    }
}

/// Placement surfaces, identified by the sprite offset of their icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    Facebook,
    Instagram,
    Messenger,
    AudienceNetwork,
    Threads,
    /// Icon present but its offset is not in the lookup table.
    Unknown,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Facebook => "Facebook",
            Platform::Instagram => "Instagram",
            Platform::Messenger => "Messenger",
            Platform::AudienceNetwork => "AudienceNetwork",
            Platform::Threads => "Threads",
            Platform::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// One ad card, normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdRecord {
    pub identifier: String,
    pub start_date: Option<NaiveDate>,
    pub platforms: Vec<Platform>,
    pub creative_text: Option<String>,
    pub call_to_action: Option<String>,
    pub destination_url: Option<String>,
    #[serde(default)]
    pub media_urls: Vec<String>,
}

impl AdRecord {
    /// A record carrying only its identifier and the default platform set.
    pub fn bare(identifier: impl Into<String>, platforms: Vec<Platform>) -> Self {
        Self {
            identifier: identifier.into(),
            start_date: None,
            platforms,
            creative_text: None,
            call_to_action: None,
            destination_url: None,
            media_urls: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Completed,
    FormatError,
    EmptyDocument,
    NoCardsFound,
}

impl RunStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, RunStatus::FormatError | RunStatus::EmptyDocument)
    }
}

/// Result of running one archive through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionReport {
    pub status: RunStatus,
    pub records: Vec<AdRecord>,
    pub cards_found: usize,
    pub cards_skipped: usize,
    pub resources: usize,
    pub diagnostics: Diagnostics,
}

impl ExtractionReport {
    pub fn aborted(status: RunStatus, diagnostics: Diagnostics) -> Self {
        Self {
            status,
            records: Vec::new(),
            cards_found: 0,
            cards_skipped: 0,
            resources: 0,
            diagnostics,
        }
    }

    pub fn records_extracted(&self) -> usize {
        self.records.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}
impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

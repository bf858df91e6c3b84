use serde::{Deserialize, Serialize};

/// Content-Transfer-Encoding of one part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransferEncoding {
    QuotedPrintable,
    Base64,
    /// 7bit, 8bit, binary, or undeclared.
    #[default]
    Identity,
}

impl TransferEncoding {
    pub fn from_header(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "quoted-printable" => TransferEncoding::QuotedPrintable,
            "base64" => TransferEncoding::Base64,
            _ => TransferEncoding::Identity,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartHeaders {
    /// Lowercased media type without parameters, e.g. `text/html`.
    pub content_type: Option<String>,
    pub charset: Option<String>,
    pub transfer_encoding: TransferEncoding,
    pub content_location: Option<String>,
}

impl PartHeaders {
    pub fn is_markup(&self) -> bool {
        matches!(
            self.content_type.as_deref(),
            Some("text/html") | Some("application/xhtml+xml")
        )
    }

    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|t| t.starts_with("image/"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub headers: PartHeaders,
    /// Still transfer-encoded.
    pub body: Vec<u8>,
}

/// One multipart container, split but not yet decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArchive {
    pub boundary: String,
    pub snapshot_location: Option<String>,
    pub parts: Vec<Part>,
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdsnapError>;

/// Failures that make one archive unusable. A batch logs these and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArchiveError {
    #[error("no multipart boundary declared in archive header")]
    MissingBoundary,
    #[error("archive has no parts delimited by boundary {boundary:?}")]
    NoParts { boundary: String },
}

#[derive(Debug, Error)]
pub enum AdsnapError {
    #[error("archive format error: {0}")]
    Format(#[from] ArchiveError),

    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("invalid text rule {rule}: {reason}")]
    InvalidRule { rule: &'static str, reason: String },

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("sink rejected records: {0}")]
    Sink(String),
}

impl AdsnapError {
    pub fn invalid_selector(selector: &str, reason: impl Into<String>) -> Self {
        AdsnapError::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_rule(rule: &'static str, reason: impl ToString) -> Self {
        AdsnapError::InvalidRule {
            rule,
            reason: reason.to_string(),
        }
    }
}

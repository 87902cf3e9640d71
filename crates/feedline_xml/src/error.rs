//! Parse errors.

use feedline_core::FeedError;

/// Input that is not well-formed XML
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed XML at byte {offset}: {reason}")]
pub struct MalformedDocument {
    /// Byte offset of the offending construct
    pub offset: usize,
    /// What is wrong
    pub reason: String,
}

impl MalformedDocument {
    /// Create an error at `offset`
    pub fn new(offset: usize, reason: impl Into<String>) -> Self {
        Self {
            offset,
            reason: reason.into(),
        }
    }
}

impl From<MalformedDocument> for FeedError {
    fn from(err: MalformedDocument) -> Self {
        FeedError::MalformedDocument {
            offset: err.offset,
            reason: err.reason,
        }
    }
}

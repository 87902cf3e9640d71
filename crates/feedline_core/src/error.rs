//! Core error types for FEEDLINE.

/// Core result type
pub type FeedResult<T> = Result<T, FeedError>;

/// Error raised anywhere along the feed pipeline
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// Cursor parameters supplied by the client are unusable
    #[error("Invalid cursor {field}: {reason}")]
    InvalidCursor {
        /// Query parameter at fault
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// The event source broke its ordering or count contract
    #[error("Invariant violation: {reason}")]
    InvariantViolation {
        /// Which invariant was broken
        reason: String,
    },

    /// XML handed to the canonicalizer could not be parsed
    #[error("Malformed document at byte {offset}: {reason}")]
    MalformedDocument {
        /// Byte offset of the offending construct
        offset: usize,
        /// Parse failure
        reason: String,
    },

    /// The renderer failed to produce a document
    #[error("Render failed: {reason}")]
    Render {
        /// Renderer message
        reason: String,
    },

    /// The event source failed to deliver events
    #[error("Event source failed: {reason}")]
    Source {
        /// Source message
        reason: String,
    },
}

impl FeedError {
    /// Build an [`FeedError::InvalidCursor`]
    pub fn invalid_cursor(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCursor {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Build an [`FeedError::InvariantViolation`]
    pub fn invariant(reason: impl Into<String>) -> Self {
        Self::InvariantViolation {
            reason: reason.into(),
        }
    }

    /// Whether the error was caused by the caller's input
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidCursor { .. })
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        Self::Source {
            reason: err.to_string(),
        }
    }
}

//! Feed identifiers.
//!
//! Feed ids are name-based UUIDs so every page of a feed, on every restart,
//! carries the same Atom `<id>`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Feed identifier - derived from the feed's canonical URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeedId(Uuid);

impl FeedId {
    /// Derive the id of the feed served at `url`
    #[must_use]
    pub fn for_url(url: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_URL, url.as_bytes()))
    }

    /// Create from UUID bytes
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Get as UUID
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Atom id of the entry at `position` within this feed
    #[must_use]
    pub fn entry_urn(&self, position: crate::Position) -> String {
        format!("{}:{}", self, position)
    }
}

impl std::fmt::Display for FeedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "urn:uuid:{}", self.0)
    }
}

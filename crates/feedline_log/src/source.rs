//! The event source contract.
//!
//! A source hands out events in ascending position order. The window engine
//! checks every batch it receives against this contract.

use crate::event::EventListEntry;
use async_trait::async_trait;
use feedline_core::{FeedResult, Position};

/// A batch of events returned by [`EventSource::fetch`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fetched {
    /// Events in ascending position order
    pub entries: Vec<EventListEntry>,
    /// Whether the log holds events after the last one returned
    pub has_more: bool,
}

impl Fetched {
    /// Create a batch
    #[must_use]
    pub fn new(entries: Vec<EventListEntry>, has_more: bool) -> Self {
        Self { entries, has_more }
    }

    /// A batch that reaches the end of the log
    #[must_use]
    pub fn exhausted(entries: Vec<EventListEntry>) -> Self {
        Self::new(entries, false)
    }
}

/// Supplier of `(position, payload)` events
///
/// Implementations return at most `count` entries, all at positions `>= from`,
/// strictly ascending. Returning fewer is fine when the log runs out.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch up to `count` events starting at `from`
    ///
    /// # Errors
    ///
    /// Returns [`feedline_core::FeedError::Source`] if the underlying store fails
    async fn fetch(&self, from: Position, count: u64) -> FeedResult<Fetched>;
}

//! Feed documents.
//!
//! A [`FeedDocument`] is the immutable model a renderer consumes: feed
//! metadata, the cursor that produced the page, its entries and its links.

use crate::link::NavigationLinks;
use chrono::{DateTime, Utc};
use feedline_core::{FeedError, FeedId, FeedResult};
use feedline_log::{check_ascending, Cursor, CursorWindow, EventListEntry};
use serde::Serialize;

/// Feed-level Atom metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedMetadata {
    /// Feed title
    pub title: String,
    /// Stable feed id
    pub id: FeedId,
    /// Timestamp written to the feed and every entry
    pub updated: DateTime<Utc>,
}

impl FeedMetadata {
    /// Metadata for one rendering
    #[must_use]
    pub fn new(title: impl Into<String>, id: FeedId, updated: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            id,
            updated,
        }
    }
}

/// One page of the feed, ready to render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedDocument {
    metadata: FeedMetadata,
    cursor: Cursor,
    entries: Vec<EventListEntry>,
    links: NavigationLinks,
}

impl FeedDocument {
    /// Feed-level metadata
    #[must_use]
    pub fn metadata(&self) -> &FeedMetadata {
        &self.metadata
    }

    /// Cursor the page was assembled for
    #[must_use]
    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Entries in ascending position order
    #[must_use]
    pub fn entries(&self) -> &[EventListEntry] {
        &self.entries
    }

    /// Self, previous and next links
    #[must_use]
    pub fn links(&self) -> &NavigationLinks {
        &self.links
    }
}

/// Combines a filled window, its links and metadata into a [`FeedDocument`]
pub struct FeedAssembler;

impl FeedAssembler {
    /// Assemble the document for `window`
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvariantViolation`] if the entries exceed the
    /// page size, are not strictly ascending, or fall outside the window
    pub fn assemble(
        window: CursorWindow,
        links: NavigationLinks,
        metadata: FeedMetadata,
    ) -> FeedResult<FeedDocument> {
        let cursor = window.cursor();
        let span = window.plan().span;
        let entries = window.into_entries();

        if entries.len() as u64 > cursor.page_size.get() {
            return Err(FeedError::invariant(format!(
                "{} entries on a page of {}",
                entries.len(),
                cursor.page_size
            )));
        }
        check_ascending(&entries)?;

        match span {
            None if !entries.is_empty() => {
                return Err(FeedError::invariant(format!(
                    "entries on an exhausted page at {} (stop {})",
                    cursor.position, cursor.stop_at
                )));
            }
            None => {}
            Some(span) => {
                if let Some(stray) = entries.iter().find(|e| !span.contains(e.position)) {
                    return Err(FeedError::invariant(format!(
                        "position {} outside window [{}, {})",
                        stray.position, span.start, span.end
                    )));
                }
            }
        }

        Ok(FeedDocument {
            metadata,
            cursor,
            entries,
            links,
        })
    }
}

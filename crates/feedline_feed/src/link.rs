//! Navigation links.
//!
//! Links are built from structured parts rather than formatted strings: a
//! normalised base, a path, and ordered integer query parameters. Parameter
//! values are never taken from request text, so nothing needs escaping.

use feedline_core::{FeedResult, Position, StopAt};
use feedline_log::{Cursor, CursorLimits, CursorWindow};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Query parameter holding the page start
pub const POSITION_PARAM: &str = "position";
/// Query parameter holding the page size
pub const PAGE_SIZE_PARAM: &str = "pageSize";
/// Query parameter holding the stop boundary; omitted when unbounded
pub const STOP_AT_PARAM: &str = "stopAt";

/// A feed URL with ordered integer query parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedUrl {
    base: String,
    path: String,
    query: IndexMap<&'static str, u64>,
}

impl FeedUrl {
    /// URL for `path` under `base`, without query
    #[must_use]
    pub fn new(base: &str, path: &str) -> Self {
        Self {
            base: normalize_base(base),
            path: normalize_path(path),
            query: IndexMap::new(),
        }
    }

    /// Set a query parameter, keeping first-insertion order
    #[must_use]
    pub fn with_param(mut self, key: &'static str, value: u64) -> Self {
        self.query.insert(key, value);
        self
    }

    /// Value of query parameter `key`, if set
    #[must_use]
    pub fn param(&self, key: &str) -> Option<u64> {
        self.query.get(key).copied()
    }

    /// Base and path with no query string
    #[must_use]
    pub fn location(&self) -> String {
        format!("{}{}", self.base, self.path)
    }
}

impl fmt::Display for FeedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.path)?;
        for (i, (key, value)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", sep, key, value)?;
        }
        Ok(())
    }
}

fn normalize_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.is_empty() || path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// The three links every page carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationLinks {
    /// This page
    #[serde(rename = "self")]
    pub self_link: String,
    /// The following page, absent at the end of the feed or the stop boundary
    pub next: Option<String>,
    /// The preceding page, absent at position zero
    pub previous: Option<String>,
}

/// Builds page URLs for one feed location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBuilder {
    base_url: String,
    path: String,
}

impl LinkBuilder {
    /// Builder for `path` under `base_url`; trailing slashes on the base and a
    /// missing leading slash on the path are normalised
    #[must_use]
    pub fn new(base_url: &str, path: &str) -> Self {
        Self {
            base_url: normalize_base(base_url),
            path: normalize_path(path),
        }
    }

    /// Normalised origin
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Normalised feed path
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The feed's canonical location, used to derive its id
    #[must_use]
    pub fn feed_location(&self) -> String {
        format!("{}{}", self.base_url, self.path)
    }

    /// Structured URL for `cursor`
    #[must_use]
    pub fn url(&self, cursor: &Cursor) -> FeedUrl {
        let url = FeedUrl::new(&self.base_url, &self.path)
            .with_param(POSITION_PARAM, cursor.position.as_u64())
            .with_param(PAGE_SIZE_PARAM, cursor.page_size.get());
        match cursor.stop_at {
            StopAt::Unbounded => url,
            StopAt::At(stop) => url.with_param(STOP_AT_PARAM, stop.as_u64()),
        }
    }

    /// Link text for `cursor`
    #[must_use]
    pub fn build(&self, cursor: &Cursor) -> String {
        self.url(cursor).to_string()
    }

    /// Self, previous and next links for `window`
    ///
    /// Page size and stop boundary carry through unchanged on every link.
    #[must_use]
    pub fn navigation(&self, window: &CursorWindow, has_more: bool) -> NavigationLinks {
        let cursor = window.cursor();
        let at = |position: Position| Cursor::new(position, cursor.page_size, cursor.stop_at);

        NavigationLinks {
            self_link: self.build(&cursor),
            next: has_more.then(|| self.build(&at(window.next_position()))),
            previous: window
                .has_previous()
                .then(|| self.build(&at(window.previous_position()))),
        }
    }
}

/// Split the query part of `url` into key/value pairs
///
/// Pairs without `=` get an empty value. A fragment is ignored.
#[must_use]
pub fn parse_link_query(url: &str) -> Vec<(&str, &str)> {
    let Some((_, query)) = url.split_once('?') else {
        return Vec::new();
    };
    let query = query.split_once('#').map_or(query, |(q, _)| q);
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .collect()
}

/// Cursor encoded in a link previously emitted by [`LinkBuilder`]
///
/// # Errors
///
/// Returns [`feedline_core::FeedError::InvalidCursor`] if a parameter is
/// malformed or out of range
pub fn cursor_from_link(url: &str, limits: &CursorLimits) -> FeedResult<Cursor> {
    let pairs = parse_link_query(url);
    let lookup = |key: &str| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);
    Cursor::from_query(
        lookup(POSITION_PARAM),
        lookup(PAGE_SIZE_PARAM),
        lookup(STOP_AT_PARAM),
        limits,
    )
}

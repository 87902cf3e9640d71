//! FEEDLINE Feed Pipeline
//!
//! Turns a cursor into a served Atom page:
//! window from the event log, navigation links, an immutable
//! [`FeedDocument`], rendered XML, and finally the compact canonical form.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod link;
pub mod render;
pub mod service;

pub use document::{FeedAssembler, FeedDocument, FeedMetadata};
pub use link::{cursor_from_link, parse_link_query, FeedUrl, LinkBuilder, NavigationLinks};
pub use render::{AtomRenderer, RenderError, Renderer, ATOM_FEED_TEMPLATE};
pub use service::{FeedPage, FeedService};

//! FEEDLINE Server
//!
//! HTTP surface for the paginated Atom feed.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod handler;

pub use api::{router, ApiServer, AppState, ServerConfig};
pub use handler::{ApiError, FeedQuery, ATOM_CONTENT_TYPE};

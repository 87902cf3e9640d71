//! FEEDLINE Core Types
//!
//! This crate contains pure types and logic with no I/O.
//! Every other feedline crate builds on these values and on [`FeedError`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod id;
pub mod position;

// Re-exports
pub use error::{FeedError, FeedResult};
pub use id::FeedId;
pub use position::{PageSize, Position, StopAt};

//! FEEDLINE Event Log
//!
//! The event source contract, an in-memory append-only log, and the cursor
//! engine that turns a `(position, pageSize, stopAt)` triple into a window of
//! entries plus the adjacent cursors.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cursor;
pub mod event;
pub mod memory;
pub mod source;
pub mod window;

pub use cursor::{Cursor, CursorLimits};
pub use event::EventListEntry;
pub use memory::InMemoryEventLog;
pub use source::{EventSource, Fetched};
pub use window::{check_ascending, CursorWindow, Span, WindowPlan};

//! FEEDLINE XML Canonicalization
//!
//! Turns rendered XML text into two stable forms:
//! - compact: insignificant whitespace between elements removed, one line
//! - pretty: one node per line with a fixed indent, for diagnostics
//!
//! Markup and character data are carried through byte-for-byte; only
//! whitespace-only text nodes are dropped or re-inserted. Entities are never
//! decoded, so what the renderer escaped stays escaped.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod attributes;
pub mod canonical;
pub mod error;
pub mod scan;
pub mod token;
pub mod tree;

pub use canonical::{compact, pretty, CanonicalizeConfig, Canonicalizer};
pub use error::MalformedDocument;
pub use token::{Token, TokenKind, Tokenizer};
pub use tree::{Document, Element, Node};

//! Feed entries.

use feedline_core::Position;
use serde::{Deserialize, Serialize};

/// One item of the feed: an event and its place in the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventListEntry {
    /// Position in the log
    pub position: Position,
    /// Event body as stored
    pub payload: String,
}

impl EventListEntry {
    /// Create an entry
    pub fn new(position: impl Into<Position>, payload: impl Into<String>) -> Self {
        Self {
            position: position.into(),
            payload: payload.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = EventListEntry::new(1000u64, "1000");
        assert_eq!(entry.position, Position::new(1000));
        assert_eq!(entry.payload, "1000");
    }

    #[test]
    fn test_entry_json_shape() {
        let entry: EventListEntry =
            serde_json::from_str(r#"{"position": 3, "payload": "created"}"#).unwrap();
        assert_eq!(entry, EventListEntry::new(3u64, "created"));
    }
}

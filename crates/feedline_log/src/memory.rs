//! In-memory append-only event log.

use crate::event::EventListEntry;
use crate::source::{EventSource, Fetched};
use async_trait::async_trait;
use feedline_core::{FeedError, FeedResult, Position};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Event log held in memory, keyed by position
///
/// Positions may be sparse. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventLog {
    events: Arc<RwLock<BTreeMap<Position, String>>>,
}

impl InMemoryEventLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log from existing entries; a later duplicate position wins
    pub fn from_entries(entries: impl IntoIterator<Item = EventListEntry>) -> Self {
        let events = entries
            .into_iter()
            .map(|e| (e.position, e.payload))
            .collect::<BTreeMap<_, _>>();
        Self {
            events: Arc::new(RwLock::new(events)),
        }
    }

    /// Create a dense log of `count` events whose payload is their position
    #[must_use]
    pub fn seeded(count: u64) -> Self {
        Self::from_entries((0..count).map(|p| EventListEntry::new(p, p.to_string())))
    }

    /// Load a JSON array of `{"position": .., "payload": ..}` objects
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Source`] if the JSON does not match
    pub fn from_json(json: &str) -> FeedResult<Self> {
        let entries: Vec<EventListEntry> = serde_json::from_str(json)?;
        Ok(Self::from_entries(entries))
    }

    /// Append an event after the current tail and return its position
    pub async fn append(&self, payload: impl Into<String>) -> Position {
        let mut events = self.events.write().await;
        let position = events
            .keys()
            .next_back()
            .map_or(Position::ZERO, |last| last.saturating_add(1));
        events.insert(position, payload.into());
        position
    }

    /// Append an event at an explicit position past the current tail
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvariantViolation`] if `position` is not past the tail
    pub async fn append_at(&self, position: Position, payload: impl Into<String>) -> FeedResult<()> {
        let mut events = self.events.write().await;
        if let Some(last) = events.keys().next_back() {
            if position <= *last {
                return Err(FeedError::invariant(format!(
                    "append at {} would not extend log ending at {}",
                    position, last
                )));
            }
        }
        events.insert(position, payload.into());
        Ok(())
    }

    /// Number of events in the log
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    /// Whether the log is empty
    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl EventSource for InMemoryEventLog {
    async fn fetch(&self, from: Position, count: u64) -> FeedResult<Fetched> {
        let events = self.events.read().await;
        let limit = usize::try_from(count).unwrap_or(usize::MAX);
        let mut entries: Vec<EventListEntry> = events
            .range(from..)
            .take(limit.saturating_add(1))
            .map(|(position, payload)| EventListEntry::new(*position, payload.clone()))
            .collect();
        let has_more = entries.len() > limit;
        entries.truncate(limit);
        Ok(Fetched::new(entries, has_more))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(fetched: &Fetched) -> Vec<u64> {
        fetched.entries.iter().map(|e| e.position.as_u64()).collect()
    }

    #[tokio::test]
    async fn test_fetch_dense() {
        let log = InMemoryEventLog::seeded(20);
        let fetched = log.fetch(Position::new(5), 3).await.unwrap();
        assert_eq!(positions(&fetched), vec![5, 6, 7]);
        assert_eq!(fetched.entries[0].payload, "5");
        assert!(fetched.has_more);
    }

    #[tokio::test]
    async fn test_fetch_at_tail() {
        let log = InMemoryEventLog::seeded(10);
        let fetched = log.fetch(Position::new(8), 5).await.unwrap();
        assert_eq!(positions(&fetched), vec![8, 9]);
        assert!(!fetched.has_more);

        let fetched = log.fetch(Position::new(7), 3).await.unwrap();
        assert_eq!(positions(&fetched), vec![7, 8, 9]);
        assert!(!fetched.has_more);
    }

    #[tokio::test]
    async fn test_fetch_past_end() {
        let log = InMemoryEventLog::seeded(3);
        let fetched = log.fetch(Position::new(10), 5).await.unwrap();
        assert!(fetched.entries.is_empty());
        assert!(!fetched.has_more);
    }

    #[tokio::test]
    async fn test_fetch_zero_count() {
        let log = InMemoryEventLog::seeded(3);
        let fetched = log.fetch(Position::ZERO, 0).await.unwrap();
        assert!(fetched.entries.is_empty());
        assert!(fetched.has_more);
    }

    #[tokio::test]
    async fn test_fetch_sparse() {
        let log = InMemoryEventLog::from_entries(vec![
            EventListEntry::new(2u64, "a"),
            EventListEntry::new(9u64, "b"),
            EventListEntry::new(40u64, "c"),
        ]);
        let fetched = log.fetch(Position::new(3), 10).await.unwrap();
        assert_eq!(positions(&fetched), vec![9, 40]);
        assert!(!fetched.has_more);
    }

    #[tokio::test]
    async fn test_append() {
        let log = InMemoryEventLog::new();
        assert!(log.is_empty().await);
        assert_eq!(log.append("first").await, Position::ZERO);
        assert_eq!(log.append("second").await, Position::new(1));
        log.append_at(Position::new(10), "third").await.unwrap();
        assert_eq!(log.append("fourth").await, Position::new(11));
        assert_eq!(log.len().await, 4);
    }

    #[tokio::test]
    async fn test_append_at_rejects_rewrite() {
        let log = InMemoryEventLog::seeded(5);
        let err = log.append_at(Position::new(3), "late").await.unwrap_err();
        assert!(matches!(err, FeedError::InvariantViolation { .. }));
    }

    #[tokio::test]
    async fn test_clones_share_log() {
        let log = InMemoryEventLog::new();
        let other = log.clone();
        log.append("shared").await;
        assert_eq!(other.len().await, 1);
    }

    #[tokio::test]
    async fn test_from_json() {
        let log = InMemoryEventLog::from_json(
            r#"[{"position": 1, "payload": "x"}, {"position": 0, "payload": "y"}]"#,
        )
        .unwrap();
        let fetched = log.fetch(Position::ZERO, 10).await.unwrap();
        assert_eq!(positions(&fetched), vec![0, 1]);

        assert!(InMemoryEventLog::from_json("{}").is_err());
    }
}

//! Cursor windows.
//!
//! A [`WindowPlan`] is the pure part: which span of positions a cursor asks
//! for and where the previous and next pages start. Filling the plan with a
//! batch from an [`EventSource`] yields a [`CursorWindow`], checking the batch
//! against the source contract on the way.
//!
//! The next cursor always advances by the full page size, even when the page
//! comes back short. Entries a sparse source returns past the end of the span
//! are cut off here, so the next page picks them up instead of this one.

use crate::cursor::Cursor;
use crate::event::EventListEntry;
use crate::source::{EventSource, Fetched};
use feedline_core::{FeedError, FeedResult, PageSize, Position, StopAt};

/// Half-open span of positions `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// First position in the span
    pub start: Position,
    /// First position past the span
    pub end: Position,
}

impl Span {
    /// Number of positions in the span
    #[must_use]
    pub const fn width(&self) -> u64 {
        self.start.distance_to(self.end)
    }

    /// Whether `position` lies in the span
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        position >= self.start && position < self.end
    }
}

/// The requested window and the adjacent cursor positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlan {
    /// Cursor the plan was computed for
    pub cursor: Cursor,
    /// `None` when the cursor sits at or past its stop boundary
    pub span: Option<Span>,
    /// Start of the following page
    pub next_position: Position,
    /// Whether a page precedes this one
    pub has_previous: bool,
    /// Start of the preceding page, clamped at zero
    pub previous_position: Position,
}

impl WindowPlan {
    /// Compute the window for `cursor`
    #[must_use]
    pub fn compute(cursor: Cursor) -> Self {
        let start = cursor.position;
        let size = cursor.page_size.get();

        let span = if cursor.is_exhausted() {
            None
        } else {
            let mut end = start.saturating_add(size);
            if let Some(stop) = cursor.stop_at.position() {
                end = end.min(stop);
            }
            Some(Span { start, end })
        };

        Self {
            cursor,
            span,
            next_position: start.saturating_add(size),
            has_previous: start > Position::ZERO,
            previous_position: start.saturating_sub(size),
        }
    }

    /// How many events to ask the source for
    #[must_use]
    pub fn fetch_count(&self) -> u64 {
        self.span.map_or(0, |span| span.width())
    }

    /// Whether the window can hold no entries at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fetch_count() == 0
    }

    /// Combine the plan with a batch from the source
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvariantViolation`] if the batch is larger than
    /// requested, not strictly ascending, or starts before the window
    pub fn fill(self, fetched: Fetched) -> FeedResult<CursorWindow> {
        let requested = self.fetch_count();
        let Fetched { mut entries, has_more } = fetched;

        if entries.len() as u64 > requested {
            return Err(FeedError::invariant(format!(
                "source returned {} entries for a window of {}",
                entries.len(),
                requested
            )));
        }
        check_ascending(&entries)?;

        let mut truncated = false;
        if let Some(span) = self.span {
            if let Some(first) = entries.first() {
                if first.position < span.start {
                    return Err(FeedError::invariant(format!(
                        "position {} precedes window start {}",
                        first.position, span.start
                    )));
                }
            }
            let keep = entries.partition_point(|e| e.position < span.end);
            truncated = keep < entries.len();
            entries.truncate(keep);
        }

        let has_more = self.span.is_some()
            && (has_more || truncated)
            && self.cursor.stop_at.admits(self.next_position);

        tracing::debug!(
            position = %self.cursor.position,
            page_size = %self.cursor.page_size,
            stop_at = %self.cursor.stop_at,
            entries = entries.len(),
            has_more,
            "window filled"
        );

        Ok(CursorWindow {
            plan: self,
            entries,
            has_more,
        })
    }
}

/// Reject entry lists that are out of order or repeat a position
///
/// # Errors
///
/// Returns [`FeedError::InvariantViolation`] naming the first offending position
pub fn check_ascending(entries: &[EventListEntry]) -> FeedResult<()> {
    for pair in entries.windows(2) {
        let (a, b) = (pair[0].position, pair[1].position);
        if a == b {
            return Err(FeedError::invariant(format!("duplicate position {}", a)));
        }
        if a > b {
            return Err(FeedError::invariant(format!(
                "position {} follows {} out of order",
                b, a
            )));
        }
    }
    Ok(())
}

/// A computed window together with the entries it holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorWindow {
    plan: WindowPlan,
    entries: Vec<EventListEntry>,
    has_more: bool,
}

impl CursorWindow {
    /// Plan the window for `cursor`, fetch it from `source`, and fill it
    ///
    /// An exhausted cursor never reaches the source.
    ///
    /// # Errors
    ///
    /// Propagates source failures and contract breaches
    pub async fn fetch(cursor: Cursor, source: &dyn EventSource) -> FeedResult<Self> {
        let plan = WindowPlan::compute(cursor);
        let fetched = if plan.is_empty() {
            Fetched::default()
        } else {
            source.fetch(cursor.position, plan.fetch_count()).await?
        };
        plan.fill(fetched)
    }

    /// The plan this window was filled from
    #[must_use]
    pub const fn plan(&self) -> &WindowPlan {
        &self.plan
    }

    /// Cursor the window was computed for
    #[must_use]
    pub const fn cursor(&self) -> Cursor {
        self.plan.cursor
    }

    /// First position the window covers
    #[must_use]
    pub const fn from_position(&self) -> Position {
        self.plan.cursor.position
    }

    /// Page size carried to adjacent pages
    #[must_use]
    pub const fn page_size(&self) -> PageSize {
        self.plan.cursor.page_size
    }

    /// Stop boundary carried to adjacent pages
    #[must_use]
    pub const fn stop_at(&self) -> StopAt {
        self.plan.cursor.stop_at
    }

    /// Entries in ascending position order
    #[must_use]
    pub fn entries(&self) -> &[EventListEntry] {
        &self.entries
    }

    /// Take the entries
    #[must_use]
    pub fn into_entries(self) -> Vec<EventListEntry> {
        self.entries
    }

    /// Start of the following page
    #[must_use]
    pub const fn next_position(&self) -> Position {
        self.plan.next_position
    }

    /// Whether a page precedes this one
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.plan.has_previous
    }

    /// Start of the preceding page
    #[must_use]
    pub const fn previous_position(&self) -> Position {
        self.plan.previous_position
    }

    /// Whether the source reported data beyond this window that the stop
    /// boundary still admits
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    /// Cursor for the following page, if there is one
    #[must_use]
    pub fn next_cursor(&self) -> Option<Cursor> {
        self.has_more.then(|| self.plan.cursor.forward())
    }

    /// Cursor for the preceding page, if there is one
    #[must_use]
    pub fn previous_cursor(&self) -> Option<Cursor> {
        self.plan.cursor.backward()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryEventLog;
    use async_trait::async_trait;
    use proptest::prelude::*;

    fn cursor(position: i64, page_size: i64, stop_at: i64) -> Cursor {
        Cursor::from_raw(position, page_size, stop_at).unwrap()
    }

    fn dense(from: u64, to: u64) -> Vec<EventListEntry> {
        (from..to).map(|p| EventListEntry::new(p, p.to_string())).collect()
    }

    fn positions(window: &CursorWindow) -> Vec<u64> {
        window.entries().iter().map(|e| e.position.as_u64()).collect()
    }

    struct FixedSource(Fetched);

    #[async_trait]
    impl EventSource for FixedSource {
        async fn fetch(&self, _from: Position, _count: u64) -> FeedResult<Fetched> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl EventSource for FailingSource {
        async fn fetch(&self, _from: Position, _count: u64) -> FeedResult<Fetched> {
            Err(FeedError::Source {
                reason: "store offline".to_string(),
            })
        }
    }

    #[test]
    fn test_plan_unbounded() {
        let plan = WindowPlan::compute(cursor(1000, 10, -1));
        assert_eq!(
            plan.span,
            Some(Span {
                start: Position::new(1000),
                end: Position::new(1010)
            })
        );
        assert_eq!(plan.next_position, Position::new(1010));
        assert!(plan.has_previous);
        assert_eq!(plan.previous_position, Position::new(990));
        assert_eq!(plan.fetch_count(), 10);
    }

    #[test]
    fn test_plan_truncated_at_stop() {
        let plan = WindowPlan::compute(cursor(20, 10, 25));
        assert_eq!(plan.fetch_count(), 5);
        assert_eq!(plan.span.unwrap().end, Position::new(25));
        assert_eq!(plan.next_position, Position::new(30));
    }

    #[test]
    fn test_plan_at_stop_is_empty() {
        let plan = WindowPlan::compute(cursor(25, 10, 25));
        assert!(plan.span.is_none());
        assert!(plan.is_empty());
        assert_eq!(plan.next_position, Position::new(35));
    }

    #[test]
    fn test_plan_head_has_no_previous() {
        let plan = WindowPlan::compute(cursor(0, 10, -1));
        assert!(!plan.has_previous);
        assert_eq!(plan.previous_position, Position::ZERO);
    }

    #[test]
    fn test_fill_dense_page() {
        let plan = WindowPlan::compute(cursor(1000, 10, -1));
        let window = plan.fill(Fetched::new(dense(1000, 1010), true)).unwrap();
        assert_eq!(positions(&window), (1000..1010).collect::<Vec<_>>());
        assert!(window.has_more());
        assert_eq!(window.next_cursor().unwrap().pos(), Position::new(1010));
        assert_eq!(window.previous_cursor().unwrap().pos(), Position::new(990));
    }

    #[test]
    fn test_fill_short_page_still_advances_full_page() {
        let plan = WindowPlan::compute(cursor(40, 10, -1));
        let window = plan.fill(Fetched::exhausted(dense(40, 43))).unwrap();
        assert_eq!(window.entries().len(), 3);
        assert_eq!(window.next_position(), Position::new(50));
        assert!(!window.has_more());
        assert!(window.next_cursor().is_none());
    }

    #[test]
    fn test_fill_stop_boundary_blocks_next() {
        let plan = WindowPlan::compute(cursor(20, 10, 25));
        let window = plan.fill(Fetched::new(dense(20, 25), true)).unwrap();
        assert_eq!(positions(&window), vec![20, 21, 22, 23, 24]);
        assert!(!window.has_more());
    }

    #[test]
    fn test_fill_bounded_with_room_keeps_next() {
        let plan = WindowPlan::compute(cursor(20, 10, 100));
        let window = plan.fill(Fetched::new(dense(20, 30), true)).unwrap();
        assert!(window.has_more());
    }

    #[test]
    fn test_fill_truncates_sparse_overshoot() {
        let plan = WindowPlan::compute(cursor(0, 10, -1));
        let entries = vec![
            EventListEntry::new(2u64, "a"),
            EventListEntry::new(8u64, "b"),
            EventListEntry::new(15u64, "c"),
        ];
        let window = plan.fill(Fetched::exhausted(entries)).unwrap();
        assert_eq!(positions(&window), vec![2, 8]);
        assert!(window.has_more());
    }

    #[test]
    fn test_fill_rejects_over_count() {
        let plan = WindowPlan::compute(cursor(0, 3, -1));
        let err = plan.fill(Fetched::new(dense(0, 4), true)).unwrap_err();
        assert!(matches!(err, FeedError::InvariantViolation { .. }));
    }

    #[test]
    fn test_fill_rejects_out_of_order() {
        let plan = WindowPlan::compute(cursor(0, 10, -1));
        let entries = vec![EventListEntry::new(3u64, "a"), EventListEntry::new(1u64, "b")];
        let err = plan.fill(Fetched::new(entries, false)).unwrap_err();
        assert!(err.to_string().contains("out of order"));
    }

    #[test]
    fn test_fill_rejects_duplicates() {
        let plan = WindowPlan::compute(cursor(0, 10, -1));
        let entries = vec![EventListEntry::new(3u64, "a"), EventListEntry::new(3u64, "b")];
        let err = plan.fill(Fetched::new(entries, false)).unwrap_err();
        assert!(err.to_string().contains("duplicate position 3"));
    }

    #[test]
    fn test_fill_rejects_entries_before_start() {
        let plan = WindowPlan::compute(cursor(10, 10, -1));
        let err = plan.fill(Fetched::new(dense(9, 12), false)).unwrap_err();
        assert!(matches!(err, FeedError::InvariantViolation { .. }));
    }

    #[test]
    fn test_fill_exhausted_plan_rejects_entries() {
        let plan = WindowPlan::compute(cursor(25, 10, 25));
        assert!(plan.fill(Fetched::new(dense(25, 26), false)).is_err());
        let window = plan.fill(Fetched::default()).unwrap();
        assert!(window.entries().is_empty());
        assert!(!window.has_more());
    }

    #[tokio::test]
    async fn test_fetch_scenario_unbounded() {
        let log = InMemoryEventLog::seeded(2000);
        let window = CursorWindow::fetch(cursor(1000, 10, -1), &log).await.unwrap();
        assert_eq!(positions(&window), (1000..1010).collect::<Vec<_>>());
        assert!(window.has_more());
        assert!(window.has_previous());
        assert_eq!(window.previous_position(), Position::new(990));
    }

    #[tokio::test]
    async fn test_fetch_scenario_bounded() {
        let log = InMemoryEventLog::seeded(100);
        let window = CursorWindow::fetch(cursor(20, 10, 25), &log).await.unwrap();
        assert_eq!(positions(&window), vec![20, 21, 22, 23, 24]);
        assert!(!window.has_more());
    }

    #[tokio::test]
    async fn test_fetch_exhausted_skips_source() {
        let window = CursorWindow::fetch(cursor(25, 10, 25), &FailingSource).await.unwrap();
        assert!(window.entries().is_empty());
        assert!(!window.has_more());
    }

    #[tokio::test]
    async fn test_fetch_propagates_source_error() {
        let err = CursorWindow::fetch(cursor(0, 10, -1), &FailingSource).await.unwrap_err();
        assert!(matches!(err, FeedError::Source { .. }));
    }

    #[tokio::test]
    async fn test_fetch_checks_source_contract() {
        let source = FixedSource(Fetched::new(dense(0, 20), true));
        let err = CursorWindow::fetch(cursor(0, 10, -1), &source).await.unwrap_err();
        assert!(matches!(err, FeedError::InvariantViolation { .. }));
    }

    proptest! {
        #[test]
        fn prop_next_advances_by_page_size(
            position in 0i64..1_000_000,
            page_size in 1i64..500,
            returned in 0u64..500,
        ) {
            let plan = WindowPlan::compute(cursor(position, page_size, -1));
            let count = returned.min(plan.fetch_count());
            let from = position as u64;
            let window = plan.fill(Fetched::new(dense(from, from + count), false)).unwrap();
            prop_assert_eq!(window.next_position().as_u64(), from + page_size as u64);
        }

        #[test]
        fn prop_previous_link_algebra(position in 0i64..1_000_000, page_size in 1i64..500) {
            let plan = WindowPlan::compute(cursor(position, page_size, -1));
            prop_assert_eq!(plan.has_previous, position > 0);
            prop_assert_eq!(
                plan.previous_position.as_u64(),
                (position - page_size).max(0) as u64
            );
        }

        #[test]
        fn prop_bounded_window_stays_below_stop(
            position in 0i64..1000,
            page_size in 1i64..100,
            stop in 0i64..1000,
        ) {
            let plan = WindowPlan::compute(cursor(position, page_size, stop));
            let from = position as u64;
            let window = plan
                .fill(Fetched::new(dense(from, from + plan.fetch_count()), true))
                .unwrap();
            prop_assert!(window.entries().iter().all(|e| e.position.as_u64() < stop as u64));
            prop_assert!(window.entries().len() as i64 <= page_size);
            if position >= stop {
                prop_assert!(window.entries().is_empty());
                prop_assert!(!window.has_more());
            }
        }
    }
}

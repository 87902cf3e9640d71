//! Cursor for paging through the event log.

use feedline_core::{FeedError, FeedResult, PageSize, Position, StopAt};
use serde::{Deserialize, Serialize};

/// Page location in the log: where to start, how many, and where to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// First position the page may hold
    pub position: Position,
    /// Most entries the page may hold
    pub page_size: PageSize,
    /// Boundary no entry of the page may reach
    pub stop_at: StopAt,
}

/// Page size rules applied when parsing client cursors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorLimits {
    /// Used when the client omits `pageSize`
    pub default_page_size: PageSize,
    /// Largest `pageSize` a client may ask for
    pub max_page_size: PageSize,
}

impl CursorLimits {
    /// Reject cursors whose page size exceeds `max_page_size`
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidCursor`] on field `pageSize`
    pub fn check(&self, cursor: &Cursor) -> FeedResult<()> {
        if cursor.page_size > self.max_page_size {
            return Err(FeedError::invalid_cursor(
                "pageSize",
                format!(
                    "must not exceed {}, got {}",
                    self.max_page_size, cursor.page_size
                ),
            ));
        }
        Ok(())
    }
}

impl Default for CursorLimits {
    fn default() -> Self {
        Self {
            default_page_size: PageSize::DEFAULT,
            max_page_size: PageSize::LIMIT,
        }
    }
}

impl Cursor {
    /// Assemble a cursor from validated parts
    #[must_use]
    pub const fn new(position: Position, page_size: PageSize, stop_at: StopAt) -> Self {
        Self {
            position,
            page_size,
            stop_at,
        }
    }

    /// Cursor at the head of an unbounded feed
    #[must_use]
    pub const fn first(page_size: PageSize) -> Self {
        Self::new(Position::ZERO, page_size, StopAt::Unbounded)
    }

    /// Build from wire integers, `stop_at == -1` meaning unbounded
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidCursor`] for negative positions, page sizes
    /// below 1, or stop values below -1
    pub fn from_raw(position: i64, page_size: i64, stop_at: i64) -> FeedResult<Self> {
        Ok(Self::new(
            Position::from_raw("position", position)?,
            PageSize::from_raw(page_size)?,
            StopAt::from_raw(stop_at)?,
        ))
    }

    /// Build from raw query parameter values; absent or empty values take defaults
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidCursor`] if any value is not an integer, is
    /// out of range, or the page size exceeds `limits.max_page_size`. Positions
    /// and stops span the whole `u64` range, so links emitted past `i64::MAX`
    /// parse back.
    pub fn from_query(
        position: Option<&str>,
        page_size: Option<&str>,
        stop_at: Option<&str>,
        limits: &CursorLimits,
    ) -> FeedResult<Self> {
        let position = match present(position) {
            Some(raw) => Position::new(parse_u64("position", raw)?),
            None => Position::ZERO,
        };
        let page_size = match present(page_size) {
            Some(raw) => PageSize::new(parse_u64("pageSize", raw)?)?,
            None => limits.default_page_size,
        };
        let stop_at = match present(stop_at) {
            Some("-1") => StopAt::Unbounded,
            Some(raw) => StopAt::At(Position::new(parse_u64("stopAt", raw)?)),
            None => StopAt::Unbounded,
        };
        let cursor = Self::new(position, page_size, stop_at);
        limits.check(&cursor)?;
        Ok(cursor)
    }

    /// The following page: same size and stop, position advanced by a full page
    #[must_use]
    pub const fn forward(&self) -> Self {
        Self::new(
            self.position.saturating_add(self.page_size.get()),
            self.page_size,
            self.stop_at,
        )
    }

    /// The preceding page, clamped at position zero; `None` at the head
    #[must_use]
    pub const fn backward(&self) -> Option<Self> {
        if self.position.as_u64() == 0 {
            return None;
        }
        Some(Self::new(
            self.position.saturating_sub(self.page_size.get()),
            self.page_size,
            self.stop_at,
        ))
    }

    /// Whether the cursor already sits at or beyond its stop boundary
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        !self.stop_at.admits(self.position)
    }

    /// Page start
    #[must_use]
    pub const fn pos(&self) -> Position {
        self.position
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|raw| !raw.is_empty())
}

fn parse_u64(field: &str, raw: &str) -> FeedResult<u64> {
    raw.parse::<u64>().map_err(|_| {
        let negative = raw
            .strip_prefix('-')
            .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()));
        if negative {
            FeedError::invalid_cursor(field, format!("must not be negative, got {}", raw))
        } else {
            FeedError::invalid_cursor(field, format!("expected an integer, got {:?}", raw))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(n: u64) -> PageSize {
        PageSize::new(n).unwrap()
    }

    #[test]
    fn test_cursor_first() {
        let cursor = Cursor::first(size(10));
        assert_eq!(cursor.pos(), Position::ZERO);
        assert_eq!(cursor.stop_at, StopAt::Unbounded);
        assert!(cursor.backward().is_none());
    }

    #[test]
    fn test_cursor_forward() {
        let cursor = Cursor::from_raw(1000, 10, -1).unwrap();
        let next = cursor.forward();
        assert_eq!(next.pos(), Position::new(1010));
        assert_eq!(next.page_size, cursor.page_size);
        assert_eq!(next.stop_at, StopAt::Unbounded);
    }

    #[test]
    fn test_cursor_backward() {
        let cursor = Cursor::from_raw(1000, 10, 25).unwrap();
        let previous = cursor.backward().unwrap();
        assert_eq!(previous.pos(), Position::new(990));
        assert_eq!(previous.stop_at, StopAt::At(Position::new(25)));

        let cursor = Cursor::from_raw(3, 10, -1).unwrap();
        assert_eq!(cursor.backward().unwrap().pos(), Position::ZERO);
    }

    #[test]
    fn test_cursor_exhausted() {
        assert!(Cursor::from_raw(25, 10, 25).unwrap().is_exhausted());
        assert!(Cursor::from_raw(30, 10, 25).unwrap().is_exhausted());
        assert!(!Cursor::from_raw(20, 10, 25).unwrap().is_exhausted());
        assert!(!Cursor::from_raw(1_000_000, 10, -1).unwrap().is_exhausted());
    }

    #[test]
    fn test_cursor_from_raw_rejects() {
        assert!(Cursor::from_raw(-1, 10, -1).is_err());
        assert!(Cursor::from_raw(0, 0, -1).is_err());
        assert!(Cursor::from_raw(0, 10, -7).is_err());
    }

    #[test]
    fn test_from_query_defaults() {
        let cursor = Cursor::from_query(None, None, None, &CursorLimits::default()).unwrap();
        assert_eq!(cursor.pos(), Position::ZERO);
        assert_eq!(cursor.page_size, PageSize::DEFAULT);
        assert_eq!(cursor.stop_at, StopAt::Unbounded);

        let cursor = Cursor::from_query(Some(""), Some(" "), Some(""), &CursorLimits::default()).unwrap();
        assert_eq!(cursor.page_size, PageSize::DEFAULT);
    }

    #[test]
    fn test_from_query_values() {
        let cursor = Cursor::from_query(
            Some("20"),
            Some("10"),
            Some("25"),
            &CursorLimits::default(),
        )
        .unwrap();
        assert_eq!(cursor, Cursor::from_raw(20, 10, 25).unwrap());

        let cursor =
            Cursor::from_query(Some("5"), Some("2"), Some("-1"), &CursorLimits::default()).unwrap();
        assert_eq!(cursor.stop_at, StopAt::Unbounded);
    }

    #[test]
    fn test_from_query_malformed() {
        let limits = CursorLimits::default();
        let err = Cursor::from_query(Some("abc"), None, None, &limits).unwrap_err();
        assert!(matches!(err, FeedError::InvalidCursor { ref field, .. } if field == "position"));

        let err = Cursor::from_query(None, None, Some("soon"), &limits).unwrap_err();
        assert!(matches!(err, FeedError::InvalidCursor { ref field, .. } if field == "stopAt"));

        let err = Cursor::from_query(None, Some("1.5"), None, &limits).unwrap_err();
        assert!(matches!(err, FeedError::InvalidCursor { ref field, .. } if field == "pageSize"));

        let err = Cursor::from_query(Some("-3"), None, None, &limits).unwrap_err();
        assert!(matches!(err, FeedError::InvalidCursor { ref field, ref reason }
            if field == "position" && reason.contains("negative")));

        let err = Cursor::from_query(None, Some("0"), None, &limits).unwrap_err();
        assert!(matches!(err, FeedError::InvalidCursor { ref field, .. } if field == "pageSize"));

        let err = Cursor::from_query(None, None, Some("-2"), &limits).unwrap_err();
        assert!(matches!(err, FeedError::InvalidCursor { ref field, .. } if field == "stopAt"));

        let err = Cursor::from_query(Some("18446744073709551616"), None, None, &limits).unwrap_err();
        assert!(matches!(err, FeedError::InvalidCursor { ref field, .. } if field == "position"));
    }

    #[test]
    fn test_from_query_beyond_i64() {
        let limits = CursorLimits::default();
        let cursor = Cursor::from_query(
            Some("9223372036854775812"),
            Some("10"),
            Some("18446744073709551615"),
            &limits,
        )
        .unwrap();
        assert_eq!(cursor.pos(), Position::new(9_223_372_036_854_775_812));
        assert_eq!(cursor.stop_at, StopAt::At(Position::new(u64::MAX)));

        let cursor = Cursor::from_query(Some(" 18446744073709551615 "), None, Some(" -1 "), &limits)
            .unwrap();
        assert_eq!(cursor.pos(), Position::new(u64::MAX));
        assert_eq!(cursor.stop_at, StopAt::Unbounded);
    }

    #[test]
    fn test_from_query_page_size_limit() {
        let limits = CursorLimits {
            default_page_size: size(10),
            max_page_size: size(50),
        };
        assert!(Cursor::from_query(None, Some("50"), None, &limits).is_ok());
        let err = Cursor::from_query(None, Some("51"), None, &limits).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_limits_check() {
        let limits = CursorLimits {
            default_page_size: size(10),
            max_page_size: size(50),
        };
        assert!(limits.check(&Cursor::from_raw(0, 50, -1).unwrap()).is_ok());
        let err = limits.check(&Cursor::from_raw(0, 51, -1).unwrap()).unwrap_err();
        assert!(matches!(err, FeedError::InvalidCursor { ref field, .. } if field == "pageSize"));
    }
}

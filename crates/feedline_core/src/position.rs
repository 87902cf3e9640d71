//! Positions, page sizes and stop boundaries.
//!
//! These are the three values a feed cursor is made of. Wire input arrives as
//! signed integers; everything past the parsing boundary is unsigned and the
//! `-1` "unbounded" sentinel only exists inside [`StopAt::from_raw`].

use crate::error::{FeedError, FeedResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;

/// Place of an event in the total order of the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(u64);

impl Position {
    /// The first position of every log
    pub const ZERO: Self = Self(0);

    /// Create from raw value
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get raw value
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Parse a client-supplied position
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidCursor`] if the value is not an integer or is negative
    pub fn from_raw(field: &str, value: i64) -> FeedResult<Self> {
        u64::try_from(value)
            .map(Self)
            .map_err(|_| FeedError::invalid_cursor(field, format!("must not be negative, got {}", value)))
    }

    /// Advance by `n`, saturating at the top of the range
    #[must_use]
    pub const fn saturating_add(self, n: u64) -> Self {
        Self(self.0.saturating_add(n))
    }

    /// Step back by `n`, saturating at zero
    #[must_use]
    pub const fn saturating_sub(self, n: u64) -> Self {
        Self(self.0.saturating_sub(n))
    }

    /// Number of positions between `self` and a later position
    #[must_use]
    pub const fn distance_to(self, later: Self) -> u64 {
        later.0.saturating_sub(self.0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Position {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

const fn non_zero(value: u64) -> NonZeroU64 {
    match NonZeroU64::new(value) {
        Some(n) => n,
        None => panic!("page size constants must be non-zero"),
    }
}

/// Maximum number of entries on a page; never zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageSize(NonZeroU64);

impl PageSize {
    /// Page size used when the client does not ask for one
    pub const DEFAULT: Self = Self(non_zero(100));

    /// Largest page size served unless configured otherwise
    pub const LIMIT: Self = Self(non_zero(1000));

    /// Create a page size
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidCursor`] if `value` is zero
    pub fn new(value: u64) -> FeedResult<Self> {
        NonZeroU64::new(value)
            .map(Self)
            .ok_or_else(|| FeedError::invalid_cursor("pageSize", "must be at least 1"))
    }

    /// Parse a client-supplied page size
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidCursor`] if the value is below 1
    pub fn from_raw(value: i64) -> FeedResult<Self> {
        if value < 1 {
            return Err(FeedError::invalid_cursor(
                "pageSize",
                format!("must be at least 1, got {}", value),
            ));
        }
        Self::new(value.unsigned_abs())
    }

    /// Get raw value
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Upper bound that freezes a feed at a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopAt {
    /// Feed ends when the log is exhausted
    #[default]
    Unbounded,
    /// No position at or beyond this one is ever emitted
    At(Position),
}

impl StopAt {
    /// Wire value meaning "no stop boundary"
    pub const UNBOUNDED_SENTINEL: i64 = -1;

    /// Parse a client-supplied stop boundary, mapping `-1` to [`StopAt::Unbounded`]
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidCursor`] for negative values other than `-1`
    pub fn from_raw(value: i64) -> FeedResult<Self> {
        if value == Self::UNBOUNDED_SENTINEL {
            return Ok(Self::Unbounded);
        }
        u64::try_from(value)
            .map(|v| Self::At(Position::new(v)))
            .map_err(|_| {
                FeedError::invalid_cursor(
                    "stopAt",
                    format!("must be -1 or a position, got {}", value),
                )
            })
    }

    /// Bounded stop position, if any
    #[must_use]
    pub const fn position(&self) -> Option<Position> {
        match self {
            Self::Unbounded => None,
            Self::At(p) => Some(*p),
        }
    }

    /// Whether a stop boundary is set
    #[must_use]
    pub const fn is_bounded(&self) -> bool {
        matches!(self, Self::At(_))
    }

    /// Whether `position` lies strictly below the boundary
    #[must_use]
    pub const fn admits(&self, position: Position) -> bool {
        match self {
            Self::Unbounded => true,
            Self::At(stop) => position.0 < stop.0,
        }
    }
}

impl fmt::Display for StopAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => write!(f, "unbounded"),
            Self::At(p) => write!(f, "{}", p),
        }
    }
}
